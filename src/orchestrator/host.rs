//! Browser capabilities only the orchestrator holds.
//!
//! This is the infrastructure seam: a real binding talks to the browser's
//! tabs/scripting APIs, tests use an in-memory double. All calls are async
//! and driven on the orchestrator's own task.

use crate::protocol::{Message, TabId, WindowId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: TabId,
    pub window: WindowId,
    /// Empty when the browser does not expose the URL.
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTarget {
    TopFrame,
    AllFrames,
}

/// Static assets shipped with the extension and injected on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionAsset {
    OverlayStyle,
    OverlayScript,
    EscapeRelay,
}

impl InjectionAsset {
    pub fn path(&self) -> &'static str {
        match self {
            InjectionAsset::OverlayStyle => "content/overlay.css",
            InjectionAsset::OverlayScript => "content/overlay.js",
            InjectionAsset::EscapeRelay => "content/esc_listener.js",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("No tab with id {0}")]
    TabNotFound(TabId),

    #[error("Could not establish connection. Receiving end does not exist.")]
    NoReceiver,

    #[error("{0}")]
    Platform(String),
}

#[allow(async_fn_in_trait)]
pub trait BrowserHost {
    /// Active tab of the current window.
    async fn active_tab(&self) -> Result<Option<Tab>, HostError>;

    async fn insert_css(
        &self,
        tab: TabId,
        asset: InjectionAsset,
        target: FrameTarget,
    ) -> Result<(), HostError>;

    async fn execute_script(
        &self,
        tab: TabId,
        asset: InjectionAsset,
        target: FrameTarget,
    ) -> Result<(), HostError>;

    /// PNG data URL of the visible area of `window` (current window if None).
    async fn capture_visible_tab(&self, window: Option<WindowId>) -> Result<String, HostError>;

    /// Deliver `message` to one frame of one tab.
    async fn send_to_frame(
        &self,
        tab: TabId,
        frame_id: u32,
        message: Message,
    ) -> Result<(), HostError>;

    /// Make the action button open the side panel.
    async fn set_panel_behavior(&self, open_on_action_click: bool) -> Result<(), HostError>;
}
