//! Orchestrator: the privileged context that owns the selection lifecycle.
//!
//! It validates the target tab, injects the page scripts, captures and crops
//! when the overlay finishes, writes the session store and tells every panel
//! about the result. Every outcome is returned as a [`CommandResult`]; nothing
//! escapes as a panic.

mod host;

pub use host::{BrowserHost, FrameTarget, HostError, InjectionAsset, Tab};

use crate::bus::{Inbound, PanelHub};
use crate::capture::{self, CaptureFrame, PreviewArtifact};
use crate::config::SnipConfig;
use crate::error::SnipError;
use crate::protocol::{CommandResult, Envelope, Message, Origin, SelectionRect, TabId, TOP_FRAME_ID};
use crate::safety::url_policy;
use crate::store::{ArtifactStore, SessionStorage};
use futures::stream::{FuturesUnordered, StreamExt};
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Overlay stylesheet first, then the sub-frame relay, then the agent.
const INJECTION_ORDER: [(InjectionAsset, FrameTarget); 3] = [
    (InjectionAsset::OverlayStyle, FrameTarget::TopFrame),
    (InjectionAsset::EscapeRelay, FrameTarget::AllFrames),
    (InjectionAsset::OverlayScript, FrameTarget::TopFrame),
];

pub struct Orchestrator<H, S> {
    host: H,
    store: ArtifactStore<S>,
    hub: PanelHub,
    config: SnipConfig,
    /// Tabs where an overlay was injected and has not reported back yet.
    overlays_in_flight: RefCell<HashSet<TabId>>,
}

impl<H: BrowserHost, S: SessionStorage> Orchestrator<H, S> {
    pub fn new(host: H, storage: Arc<S>, hub: PanelHub, config: SnipConfig) -> Self {
        Self {
            host,
            store: ArtifactStore::new(storage),
            hub,
            config,
            overlays_in_flight: RefCell::new(HashSet::new()),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn store(&self) -> &ArtifactStore<S> {
        &self.store
    }

    pub fn has_overlay_in_flight(&self, tab: TabId) -> bool {
        self.overlays_in_flight.borrow().contains(&tab)
    }

    /// Serve the inbox until every sender is gone and every accepted
    /// message has been handled.
    ///
    /// Messages are interleaved on this task: while one is suspended on the
    /// host (tab query, injection, capture) the inbox keeps being read, so a
    /// hung platform call stalls only its own flow. Each reply goes out as
    /// soon as its own handler finishes.
    pub async fn run(&self, mut inbox: mpsc::UnboundedReceiver<Inbound>) {
        log::info!("[ORCHESTRATOR] Running");
        let mut in_flight = FuturesUnordered::new();
        let mut inbox_open = true;

        loop {
            tokio::select! {
                inbound = inbox.recv(), if inbox_open => match inbound {
                    Some(inbound) => in_flight.push(self.dispatch(inbound)),
                    None => {
                        log::info!("[ORCHESTRATOR] Inbox closed, finishing {} pending", in_flight.len());
                        inbox_open = false;
                    }
                },
                Some(()) = in_flight.next(), if !in_flight.is_empty() => {}
                else => break,
            }
        }
        log::info!("[ORCHESTRATOR] Stopped");
    }

    async fn dispatch(&self, inbound: Inbound) {
        match inbound {
            Inbound::Request { envelope, reply } => {
                let result = self.handle(envelope).await;
                // requester gave up waiting; the work is done regardless
                let _ = reply.send(result);
            }
            Inbound::PanelDisconnected(panel) => {
                log::info!("[ORCHESTRATOR] Panel {} disconnected", panel.0);
                self.on_panel_disconnected().await;
            }
        }
    }

    /// Route one inbound message. Orchestrator-outbound messages arriving
    /// here are rejected.
    pub async fn handle(&self, envelope: Envelope) -> CommandResult {
        let Envelope { message, origin } = envelope;
        log::debug!("[ORCHESTRATOR] <- {} from {:?}", message.tag(), origin);

        match message {
            Message::StartSelection => self.start_selection().await,
            Message::SelectionFinished { rect } => self.on_selection_finished(origin, rect).await,
            Message::SelectionCancelled => self.on_selection_cancelled(origin).await,
            Message::ClearSessionPreview => self.clear_session_preview(),
            Message::ForceOverlayCleanup
            | Message::PreviewReady { .. }
            | Message::SelectionFailed { .. } => {
                log::warn!("[ORCHESTRATOR] Rejected inbound {}", message.tag());
                CommandResult::failure(format!("Unexpected message: {}", message.tag()))
            }
        }
    }

    /// Extension installed or updated.
    pub async fn on_installed(&self) {
        if let Err(e) = self.host.set_panel_behavior(true).await {
            log::warn!("[ORCHESTRATOR] Could not set side panel behavior: {}", e);
        }
    }

    /// START_SELECTION: check the active tab and inject the overlay.
    pub async fn start_selection(&self) -> CommandResult {
        match self.inject_overlay().await {
            Ok(tab) => {
                log::info!("[ORCHESTRATOR] Selection started on tab {}", tab);
                CommandResult::success()
            }
            Err(e) => {
                log::warn!("[ORCHESTRATOR] Cannot start selection: {:?}", e);
                e.into()
            }
        }
    }

    async fn inject_overlay(&self) -> Result<TabId, SnipError> {
        let tab = match self.host.active_tab().await {
            Ok(Some(tab)) => tab,
            Ok(None) => return Err(SnipError::NoActiveTab),
            Err(e) => {
                log::debug!("[ORCHESTRATOR] Tab query failed: {}", e);
                return Err(SnipError::NoActiveTab);
            }
        };

        let check = url_policy::check_url(&tab.url);
        if !check.allowed {
            return Err(SnipError::PolicyRejection {
                url: tab.url,
                reason: check.reason.unwrap_or("Restricted page"),
            });
        }

        for (asset, target) in INJECTION_ORDER {
            self.inject(tab.id, asset, target).await?;
        }

        self.overlays_in_flight.borrow_mut().insert(tab.id);
        Ok(tab.id)
    }

    async fn inject(
        &self,
        tab: TabId,
        asset: InjectionAsset,
        target: FrameTarget,
    ) -> Result<(), SnipError> {
        log::debug!("[ORCHESTRATOR] Injecting {} into tab {} ({:?})", asset.path(), tab, target);
        let injected = match asset {
            InjectionAsset::OverlayStyle => self.host.insert_css(tab, asset, target).await,
            InjectionAsset::EscapeRelay | InjectionAsset::OverlayScript => {
                self.host.execute_script(tab, asset, target).await
            }
        };
        injected.map_err(|e: HostError| SnipError::InjectionFailure(e.to_string()))
    }

    /// SELECTION_FINISHED: capture, crop, store, broadcast.
    pub async fn on_selection_finished(&self, origin: Origin, rect: SelectionRect) -> CommandResult {
        if let Some(tab) = origin.tab {
            self.overlays_in_flight.borrow_mut().remove(&tab);
        }

        match self.capture_and_crop(origin, &rect).await {
            Ok(artifact) => {
                if let Err(e) = self.store.commit(&artifact) {
                    log::warn!("[ORCHESTRATOR] Preview not stored, broadcasting anyway: {}", e);
                }
                self.hub.broadcast(Message::PreviewReady {
                    preview_type: artifact.kind,
                    preview_data_url: artifact.encoded_data,
                });
                CommandResult::success()
            }
            Err(e) => {
                let error = e.to_string();
                log::error!("[ORCHESTRATOR] {}", error);
                if e.is_broadcast() {
                    self.hub.broadcast(Message::SelectionFailed {
                        error: error.clone(),
                    });
                }
                CommandResult::failure(error)
            }
        }
    }

    async fn capture_and_crop(
        &self,
        origin: Origin,
        rect: &SelectionRect,
    ) -> Result<PreviewArtifact, SnipError> {
        let start = std::time::Instant::now();

        let data_url = self
            .host
            .capture_visible_tab(origin.window)
            .await
            .map_err(|e| SnipError::CaptureFailure(e.to_string()))?;
        let frame = CaptureFrame::from_data_url(&data_url)?;

        let capture_ms = start.elapsed().as_millis();
        log::info!(
            "[ORCHESTRATOR] Captured {}x{} in {}ms",
            frame.width(),
            frame.height(),
            capture_ms
        );

        let artifact = capture::crop_to_preview(&frame, rect, self.config.envelope)?;

        log::info!(
            "[ORCHESTRATOR] Preview ready in {}ms total",
            start.elapsed().as_millis()
        );
        Ok(artifact)
    }

    /// SELECTION_CANCELLED: make sure the overlay in the owning tab is gone.
    pub async fn on_selection_cancelled(&self, origin: Origin) -> CommandResult {
        let tab = match origin.tab {
            Some(tab) => Some(tab),
            None => self.active_tab_id().await,
        };

        match tab {
            Some(tab) => {
                self.overlays_in_flight.borrow_mut().remove(&tab);
                self.force_cleanup(tab).await;
            }
            None => log::debug!("[ORCHESTRATOR] Cancellation with no tab to clean up"),
        }

        CommandResult::success()
    }

    /// Lifecycle link lost: a persistent panel closed. Removes an overlay
    /// still waiting on the active tab.
    pub async fn on_panel_disconnected(&self) {
        let Some(tab) = self.active_tab_id().await else {
            return;
        };

        if !self.overlays_in_flight.borrow_mut().remove(&tab) {
            log::debug!("[ORCHESTRATOR] No overlay in flight on tab {}", tab);
            return;
        }

        self.force_cleanup(tab).await;
    }

    /// CLEAR_SESSION_PREVIEW
    pub fn clear_session_preview(&self) -> CommandResult {
        match self.store.clear() {
            Ok(()) => CommandResult::success(),
            Err(e) => {
                log::warn!("[ORCHESTRATOR] {}", e);
                CommandResult::failure(e.to_string())
            }
        }
    }

    async fn force_cleanup(&self, tab: TabId) {
        self.deliver_at_most_once(tab, Message::ForceOverlayCleanup)
            .await;
    }

    /// One delivery attempt to the top frame. A frame that already tore down
    /// has no receiver; that is the normal end of a selection, not an error.
    async fn deliver_at_most_once(&self, tab: TabId, message: Message) {
        let tag = message.tag();
        match self.host.send_to_frame(tab, TOP_FRAME_ID, message).await {
            Ok(()) => log::debug!("[ORCHESTRATOR] {} -> tab {}", tag, tab),
            Err(e) => log::debug!("[ORCHESTRATOR] {} to tab {} not delivered: {}", tag, tab, e),
        }
    }

    async fn active_tab_id(&self) -> Option<TabId> {
        match self.host.active_tab().await {
            Ok(tab) => tab.map(|t| t.id),
            Err(e) => {
                log::debug!("[ORCHESTRATOR] Tab query failed: {}", e);
                None
            }
        }
    }
}
