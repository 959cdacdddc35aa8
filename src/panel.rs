//! Panel clients: the popup and the side panel.
//!
//! A panel never computes or writes previews. It reads the session store
//! once when it mounts, asks the orchestrator to start or clear, and
//! follows PREVIEW_READY / SELECTION_FAILED broadcasts while it is open.

use crate::bus::{OrchestratorHandle, PanelHub, PanelLifecycleLink};
use crate::protocol::{Envelope, Message, PreviewKind};
use crate::store::{ArtifactStore, SessionStorage};
use tokio::sync::broadcast::{self, error::TryRecvError};

const START_FAILED: &str = "Cannot start selection";
const SELECTION_FAILED: &str = "Selection failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    /// Transient: closes itself once a selection starts.
    Popup,
    /// Persistent: stays open and holds a lifecycle link.
    SidePanel,
}

/// Render state of a panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelView {
    /// Data URL of the preview on display.
    pub preview: Option<String>,
    pub error: Option<String>,
    /// Start button disabled while a request is pending.
    pub busy: bool,
    /// The popup asked to be closed.
    pub closed: bool,
}

impl PanelView {
    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }
}

pub struct PanelClient<S> {
    kind: PanelKind,
    orchestrator: OrchestratorHandle,
    store: ArtifactStore<S>,
    events: broadcast::Receiver<Message>,
    view: PanelView,
    link: Option<PanelLifecycleLink>,
}

impl<S: SessionStorage> PanelClient<S> {
    /// Open a panel: subscribe to broadcasts, connect the lifecycle link
    /// (side panel only) and pick up a preview left in the session store.
    pub fn mount(
        kind: PanelKind,
        orchestrator: OrchestratorHandle,
        store: ArtifactStore<S>,
        hub: &PanelHub,
    ) -> Self {
        let link = match kind {
            PanelKind::SidePanel => Some(orchestrator.connect_panel()),
            PanelKind::Popup => None,
        };

        let mut panel = Self {
            kind,
            events: hub.subscribe(),
            orchestrator,
            store,
            view: PanelView::default(),
            link,
        };
        panel.restore_preview();
        panel
    }

    fn restore_preview(&mut self) {
        match self.store.load() {
            Ok(Some(stored)) if stored.kind == PreviewKind::Image => {
                log::debug!("[PANEL] Restored preview from session");
                self.view.preview = Some(stored.data_url);
            }
            Ok(_) => {}
            Err(e) => log::warn!("[PANEL] Could not read session preview: {}", e),
        }
    }

    pub fn kind(&self) -> PanelKind {
        self.kind
    }

    pub fn view(&self) -> &PanelView {
        &self.view
    }

    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }

    /// "Select area" button: drop the previous preview, then ask the
    /// orchestrator to start. Returns true when the overlay is up.
    pub async fn request_selection(&mut self) -> bool {
        self.view.error = None;
        self.view.busy = true;

        let cleared = self
            .orchestrator
            .request(Envelope::from_panel(Message::ClearSessionPreview))
            .await;
        if !cleared.ok {
            log::debug!("[PANEL] Clear before start failed: {:?}", cleared.error);
        }
        self.view.preview = None;

        let result = self
            .orchestrator
            .request(Envelope::from_panel(Message::StartSelection))
            .await;
        self.view.busy = false;

        if !result.ok {
            self.view.error = Some(result.error.unwrap_or_else(|| START_FAILED.to_string()));
            return false;
        }

        if self.kind == PanelKind::Popup {
            self.view.closed = true;
        }
        true
    }

    /// Explicitly discard the current preview.
    pub async fn clear(&mut self) -> bool {
        self.view.preview = None;
        let result = self
            .orchestrator
            .request(Envelope::from_panel(Message::ClearSessionPreview))
            .await;
        result.ok
    }

    /// Apply one broadcast to the view.
    pub fn apply(&mut self, message: &Message) {
        match message {
            Message::PreviewReady {
                preview_type: PreviewKind::Image,
                preview_data_url,
            } if !preview_data_url.is_empty() => {
                self.view.preview = Some(preview_data_url.clone());
                self.view.error = None;
            }
            Message::SelectionFailed { error } => {
                self.view.error = Some(if error.is_empty() {
                    SELECTION_FAILED.to_string()
                } else {
                    error.clone()
                });
            }
            _ => {}
        }
    }

    /// Apply every broadcast already queued. Returns how many were applied.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.events.try_recv() {
                Ok(message) => {
                    self.apply(&message);
                    applied += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    log::warn!("[PANEL] Missed {} broadcast(s)", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        applied
    }

    /// Wait for the next broadcast, apply it and return it.
    pub async fn next_event(&mut self) -> Option<Message> {
        loop {
            match self.events.recv().await {
                Ok(message) => {
                    self.apply(&message);
                    return Some(message);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("[PANEL] Missed {} broadcast(s)", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Close the panel. For the side panel this drops the lifecycle link.
    pub fn close(mut self) {
        if self.link.take().is_some() {
            log::debug!("[PANEL] Side panel closed");
        }
    }
}
