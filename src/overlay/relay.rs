//! Escape relay for sub-frames.
//!
//! Focus can sit inside an iframe while the overlay lives in the top frame,
//! so every sub-frame gets this listener. It never acts locally: Escape is
//! reported to the orchestrator, which routes a forced cleanup to frame 0.

use super::page::{KeyEvent, Reaction};
use crate::protocol::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Top,
    Sub,
}

#[derive(Debug)]
pub struct EscapeRelay {
    _mounted: (),
}

impl EscapeRelay {
    /// The top frame's overlay handles its own keys, so nothing mounts there.
    pub fn mount(frame: FrameKind) -> Option<Self> {
        match frame {
            FrameKind::Top => None,
            FrameKind::Sub => Some(Self { _mounted: () }),
        }
    }

    /// Capture-phase keydown handler.
    pub fn on_key(&self, event: &KeyEvent) -> Reaction {
        if !event.is_escape() {
            return Reaction::ignored();
        }
        log::debug!("[RELAY] Escape in sub-frame, reporting cancellation");
        Reaction::consumed().with_message(Message::SelectionCancelled)
    }
}
