//! In-process message bus between panels, page scripts and the orchestrator.
//!
//! - Requests go through one unbounded inbox and are answered on a oneshot.
//! - Broadcasts fan out to every subscribed panel.
//! - A [`PanelLifecycleLink`] reports its own drop as a panel disconnect.

use crate::protocol::{CommandResult, Envelope, Message};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

const BROADCAST_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelId(pub u64);

/// Everything the orchestrator's inbox can receive.
#[derive(Debug)]
pub enum Inbound {
    Request {
        envelope: Envelope,
        reply: oneshot::Sender<CommandResult>,
    },
    PanelDisconnected(PanelId),
}

/// Sender side used by panels and page scripts.
#[derive(Clone)]
pub struct OrchestratorHandle {
    tx: mpsc::UnboundedSender<Inbound>,
    next_panel: Arc<AtomicU64>,
}

/// Create the orchestrator inbox and a handle that feeds it.
pub fn channel() -> (OrchestratorHandle, mpsc::UnboundedReceiver<Inbound>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = OrchestratorHandle {
        tx,
        next_panel: Arc::new(AtomicU64::new(1)),
    };
    (handle, rx)
}

impl OrchestratorHandle {
    /// Send a request and wait for its `{ok, error?}` reply.
    pub async fn request(&self, envelope: Envelope) -> CommandResult {
        let tag = envelope.message.tag();
        let (reply, response) = oneshot::channel();

        if self.tx.send(Inbound::Request { envelope, reply }).is_err() {
            log::warn!("[BUS] {} dropped, orchestrator is not running", tag);
            return CommandResult::failure("Orchestrator is not running");
        }

        response
            .await
            .unwrap_or_else(|_| CommandResult::failure("Orchestrator dropped the request"))
    }

    /// Open a lifecycle link for a persistent panel.
    pub fn connect_panel(&self) -> PanelLifecycleLink {
        let panel = PanelId(self.next_panel.fetch_add(1, Ordering::Relaxed));
        log::debug!("[BUS] Panel {} connected", panel.0);
        PanelLifecycleLink {
            panel,
            tx: self.tx.clone(),
        }
    }
}

/// Live connection held by a persistent panel. Dropping it is how the
/// orchestrator learns the panel went away.
pub struct PanelLifecycleLink {
    panel: PanelId,
    tx: mpsc::UnboundedSender<Inbound>,
}

impl PanelLifecycleLink {
    pub fn panel(&self) -> PanelId {
        self.panel
    }
}

impl Drop for PanelLifecycleLink {
    fn drop(&mut self) {
        // orchestrator already gone: nobody left to clean up for
        let _ = self.tx.send(Inbound::PanelDisconnected(self.panel));
    }
}

/// Fan-out of orchestrator broadcasts to every open panel.
#[derive(Clone)]
pub struct PanelHub {
    tx: broadcast::Sender<Message>,
}

impl Default for PanelHub {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.tx.subscribe()
    }

    /// Returns how many panels received the message. Zero open panels is
    /// not an error; the store still holds the preview.
    pub fn broadcast(&self, message: Message) -> usize {
        let tag = message.tag();
        if !message.is_broadcast() {
            log::warn!("[BUS] {} is not a panel broadcast, dropped", tag);
            return 0;
        }
        let delivered = self.tx.send(message).unwrap_or(0);
        log::debug!("[BUS] {} broadcast to {} panel(s)", tag, delivered);
        delivered
    }
}
