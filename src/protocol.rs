//! Cross-context message protocol.
//!
//! Every message exchanged between panels, injected page scripts and the
//! orchestrator is one variant of [`Message`]. On the wire it is a JSON
//! object tagged by `"type"`, e.g. `{"type":"SELECTION_FINISHED","rect":{..}}`.
//! Unknown tags fail to deserialize, so a handler never sees them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rectangle drawn by the user, in CSS pixels, plus the scroll offset and
/// device pixel ratio of the page at the time it was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default)]
    pub scroll_x: f64,
    #[serde(default)]
    pub scroll_y: f64,
    #[serde(default = "default_dpr")]
    pub dpr: f64,
}

fn default_dpr() -> f64 {
    1.0
}

impl SelectionRect {
    /// Device pixel ratio to use for coordinate conversion.
    ///
    /// Pages occasionally report `0` or nothing at all; both mean 1.
    pub fn effective_dpr(&self) -> f64 {
        if self.dpr.is_finite() && self.dpr > 0.0 {
            self.dpr
        } else {
            1.0
        }
    }

    /// True when both sides reach `min_px` CSS pixels.
    pub fn meets_minimum(&self, min_px: f64) -> bool {
        self.w >= min_px && self.h >= min_px
    }
}

/// Kind of a preview artifact. Only captured images exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    Image,
}

impl PreviewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewKind::Image => "image",
        }
    }
}

/// The closed set of messages understood by every context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Panel → orchestrator: begin an interactive selection on the active tab.
    StartSelection,
    /// Overlay → orchestrator: the user released a valid rectangle.
    SelectionFinished { rect: SelectionRect },
    /// Overlay or escape relay → orchestrator: the selection was abandoned.
    SelectionCancelled,
    /// Orchestrator → overlay (top frame only): tear down immediately.
    ForceOverlayCleanup,
    /// Orchestrator → all panels: a new preview is in the session store.
    PreviewReady {
        preview_type: PreviewKind,
        preview_data_url: String,
    },
    /// Orchestrator → all panels: capture or crop failed.
    SelectionFailed { error: String },
    /// Panel → orchestrator: drop the stored preview.
    ClearSessionPreview,
}

impl Message {
    /// Wire tag of this message, for logs.
    pub fn tag(&self) -> &'static str {
        match self {
            Message::StartSelection => "START_SELECTION",
            Message::SelectionFinished { .. } => "SELECTION_FINISHED",
            Message::SelectionCancelled => "SELECTION_CANCELLED",
            Message::ForceOverlayCleanup => "FORCE_OVERLAY_CLEANUP",
            Message::PreviewReady { .. } => "PREVIEW_READY",
            Message::SelectionFailed { .. } => "SELECTION_FAILED",
            Message::ClearSessionPreview => "CLEAR_SESSION_PREVIEW",
        }
    }

    /// Broadcasts flow from the orchestrator to every open panel.
    pub fn is_broadcast(&self) -> bool {
        matches!(
            self,
            Message::PreviewReady { .. } | Message::SelectionFailed { .. }
        )
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// `{ok, error?}` reply to every request-style message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}

/// Browser tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Browser window identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub i64);

/// Frame id of the top-level document in a tab.
pub const TOP_FRAME_ID: u32 = 0;

/// Where an inbound message came from. Panels have no tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Origin {
    pub tab: Option<TabId>,
    pub window: Option<WindowId>,
    pub frame_id: Option<u32>,
}

impl Origin {
    pub fn panel() -> Self {
        Self::default()
    }

    pub fn frame(tab: TabId, window: WindowId, frame_id: u32) -> Self {
        Self {
            tab: Some(tab),
            window: Some(window),
            frame_id: Some(frame_id),
        }
    }
}

/// A message together with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub message: Message,
    pub origin: Origin,
}

impl Envelope {
    pub fn new(message: Message, origin: Origin) -> Self {
        Self { message, origin }
    }

    pub fn from_panel(message: Message) -> Self {
        Self::new(message, Origin::panel())
    }
}
