//! The page as seen from an injected script.
//!
//! [`PageSurface`] is the slice of the DOM the overlay needs. Implementations
//! are cheap handles onto one document (cloning shares the document), the
//! same way DOM bindings hand out element handles.

use super::geometry::{CssRect, MaskLayout, Point, Viewport};
use crate::protocol::Message;

/// DOM `MouseEvent.button` value of the primary button.
pub const PRIMARY_BUTTON: i16 = 0;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("Document is gone")]
    Detached,

    #[error("DOM operation failed: {0}")]
    Dom(String),
}

/// Inline styling the scroll lock overrides and later restores.
///
/// `None` means the property had no inline value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollStyle {
    pub root_overflow: Option<String>,
    pub body_overflow: Option<String>,
    pub body_position: Option<String>,
    pub body_top: Option<String>,
    pub body_left: Option<String>,
    pub body_width: Option<String>,
}

pub trait PageSurface: Clone {
    fn viewport(&self) -> Viewport;
    fn scroll_offset(&self) -> Point;
    fn scroll_to(&self, offset: Point);
    fn device_pixel_ratio(&self) -> f64;

    fn inline_style(&self) -> ScrollStyle;
    fn set_inline_style(&self, style: &ScrollStyle) -> Result<(), PageError>;

    /// Attach the overlay root, the four masks and the help hint.
    fn mount_overlay(&self, hint: &str) -> Result<(), PageError>;
    /// Position the selection hole and the masks around it.
    fn render_selection(&self, hole: CssRect, masks: &MaskLayout) -> Result<(), PageError>;
    /// Bounding box of the hole as laid out by the page.
    fn rendered_hole(&self) -> Option<CssRect>;
    fn remove_overlay(&self) -> Result<(), PageError>;

    /// Pointer listeners on the overlay, key listener on the document
    /// (capture phase).
    fn add_listeners(&self) -> Result<(), PageError>;
    fn remove_listeners(&self) -> Result<(), PageError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub button: i16,
    pub client_x: f64,
    pub client_y: f64,
}

impl PointerEvent {
    pub fn primary(client_x: f64, client_y: f64) -> Self {
        Self {
            button: PRIMARY_BUTTON,
            client_x,
            client_y,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.client_x, self.client_y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn is_escape(&self) -> bool {
        self.key == "Escape"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    KeyDown(KeyEvent),
}

/// What a listener did with an event, and what it wants sent to the
/// orchestrator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reaction {
    pub prevent_default: bool,
    pub stop_propagation: bool,
    pub outbound: Option<Message>,
}

impl Reaction {
    pub fn ignored() -> Self {
        Self::default()
    }

    pub fn consumed() -> Self {
        Self {
            prevent_default: true,
            stop_propagation: true,
            outbound: None,
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.outbound = Some(message);
        self
    }
}
