//! Page-side half of the selection: the overlay agent injected into the top
//! frame and the escape relay injected into every sub-frame.
//!
//! Nothing here captures pixels. The agent only produces a rectangle (or a
//! cancellation) for the orchestrator.

mod agent;
pub mod geometry;
pub mod page;
mod registry;
pub mod relay;
mod scroll_lock;

pub use agent::{OverlayAgent, OverlayOutcome, OverlayPhase, HINT_TEXT};
pub use geometry::{CssRect, MaskLayout, Point, Viewport};
pub use page::{KeyEvent, PageError, PageEvent, PageSurface, PointerEvent, Reaction, ScrollStyle};
pub use registry::{MountGuard, MountRegistry};
pub use relay::{EscapeRelay, FrameKind};
pub use scroll_lock::ScrollLock;
