//! In-memory browser and page doubles shared by the integration tests.

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use region_snip_lib::capture::encode_png_data_url;
use region_snip_lib::orchestrator::{BrowserHost, FrameTarget, HostError, InjectionAsset, Tab};
use region_snip_lib::overlay::{
    CssRect, MaskLayout, PageError, PageSurface, Point, ScrollStyle, Viewport,
};
use region_snip_lib::protocol::{Message, TabId, WindowId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;
use std::rc::Rc;

// ── Page ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct PageState {
    pub viewport: Viewport,
    pub scroll: Point,
    pub dpr: f64,
    pub style: ScrollStyle,
    pub overlay_mounted: bool,
    pub hint: Option<String>,
    pub hole: Option<CssRect>,
    pub masks: Option<MaskLayout>,
    pub listeners: bool,
    /// Extra inset applied to the rendered hole, like CSS borders.
    pub rendered_inset: f64,
    pub fail_remove_listeners: bool,
    pub fail_mount: bool,
    pub mounts: usize,
    pub style_writes: usize,
}

#[derive(Clone, Default)]
pub struct FakePage {
    pub state: Rc<RefCell<PageState>>,
}

impl FakePage {
    pub fn new(width: f64, height: f64) -> Self {
        let page = Self::default();
        {
            let mut s = page.state.borrow_mut();
            s.viewport = Viewport::new(width, height);
            s.dpr = 1.0;
        }
        page
    }

    pub fn with_scroll(self, x: f64, y: f64) -> Self {
        self.state.borrow_mut().scroll = Point::new(x, y);
        self
    }

    pub fn with_dpr(self, dpr: f64) -> Self {
        self.state.borrow_mut().dpr = dpr;
        self
    }

    pub fn with_style(self, style: ScrollStyle) -> Self {
        self.state.borrow_mut().style = style;
        self
    }

    pub fn snapshot(&self) -> (Point, ScrollStyle, bool, bool) {
        let s = self.state.borrow();
        (s.scroll, s.style.clone(), s.overlay_mounted, s.listeners)
    }
}

impl PageSurface for FakePage {
    fn viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    fn scroll_offset(&self) -> Point {
        self.state.borrow().scroll
    }

    fn scroll_to(&self, offset: Point) {
        self.state.borrow_mut().scroll = offset;
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.state.borrow().dpr
    }

    fn inline_style(&self) -> ScrollStyle {
        self.state.borrow().style.clone()
    }

    fn set_inline_style(&self, style: &ScrollStyle) -> Result<(), PageError> {
        let mut s = self.state.borrow_mut();
        s.style = style.clone();
        s.style_writes += 1;
        Ok(())
    }

    fn mount_overlay(&self, hint: &str) -> Result<(), PageError> {
        let mut s = self.state.borrow_mut();
        if s.fail_mount {
            return Err(PageError::Dom("appendChild refused".into()));
        }
        s.overlay_mounted = true;
        s.hint = Some(hint.to_string());
        s.mounts += 1;
        Ok(())
    }

    fn render_selection(&self, hole: CssRect, masks: &MaskLayout) -> Result<(), PageError> {
        let mut s = self.state.borrow_mut();
        if !s.overlay_mounted {
            return Err(PageError::Detached);
        }
        s.hole = Some(hole);
        s.masks = Some(*masks);
        Ok(())
    }

    fn rendered_hole(&self) -> Option<CssRect> {
        let s = self.state.borrow();
        s.hole.map(|h| {
            let inset = s.rendered_inset;
            CssRect::new(
                h.left + inset,
                h.top + inset,
                (h.width - 2.0 * inset).max(0.0),
                (h.height - 2.0 * inset).max(0.0),
            )
        })
    }

    fn remove_overlay(&self) -> Result<(), PageError> {
        let mut s = self.state.borrow_mut();
        s.overlay_mounted = false;
        s.hole = None;
        s.masks = None;
        s.hint = None;
        Ok(())
    }

    fn add_listeners(&self) -> Result<(), PageError> {
        self.state.borrow_mut().listeners = true;
        Ok(())
    }

    fn remove_listeners(&self) -> Result<(), PageError> {
        let mut s = self.state.borrow_mut();
        if s.fail_remove_listeners {
            return Err(PageError::Dom("removeEventListener threw".into()));
        }
        s.listeners = false;
        Ok(())
    }
}

// ── Browser ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    InsertCss(TabId, InjectionAsset, FrameTarget),
    ExecuteScript(TabId, InjectionAsset, FrameTarget),
    Capture(Option<WindowId>),
    Send(TabId, u32, Message),
    PanelBehavior(bool),
}

#[derive(Default)]
pub struct BrowserState {
    pub active: Option<Tab>,
    pub capture: Option<Result<String, HostError>>,
    /// Capture never resolves, like a browser stuck on a permission prompt.
    pub hang_capture: bool,
    pub fail_script: Option<InjectionAsset>,
    /// Tabs whose top frame has no listener any more.
    pub torn_down: Vec<TabId>,
    pub calls: Vec<HostCall>,
}

#[derive(Clone, Default)]
pub struct FakeBrowser {
    pub state: Rc<RefCell<BrowserState>>,
}

impl FakeBrowser {
    pub fn with_active_tab(id: i64, url: &str) -> Self {
        let browser = Self::default();
        browser.state.borrow_mut().active = Some(Tab {
            id: TabId(id),
            window: WindowId(1),
            url: url.to_string(),
        });
        browser
    }

    pub fn set_capture(&self, capture: Result<String, HostError>) {
        self.state.borrow_mut().capture = Some(capture);
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state.borrow().calls.clone()
    }

    pub fn sent(&self) -> Vec<(TabId, u32, Message)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HostCall::Send(tab, frame, msg) => Some((tab, frame, msg)),
                _ => None,
            })
            .collect()
    }

    pub fn injected(&self) -> Vec<HostCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, HostCall::InsertCss(..) | HostCall::ExecuteScript(..)))
            .collect()
    }

    fn record(&self, call: HostCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl BrowserHost for FakeBrowser {
    async fn active_tab(&self) -> Result<Option<Tab>, HostError> {
        Ok(self.state.borrow().active.clone())
    }

    async fn insert_css(
        &self,
        tab: TabId,
        asset: InjectionAsset,
        target: FrameTarget,
    ) -> Result<(), HostError> {
        self.record(HostCall::InsertCss(tab, asset, target));
        Ok(())
    }

    async fn execute_script(
        &self,
        tab: TabId,
        asset: InjectionAsset,
        target: FrameTarget,
    ) -> Result<(), HostError> {
        self.record(HostCall::ExecuteScript(tab, asset, target));
        if self.state.borrow().fail_script == Some(asset) {
            return Err(HostError::Platform("Frame with ID 0 was removed.".into()));
        }
        Ok(())
    }

    async fn capture_visible_tab(&self, window: Option<WindowId>) -> Result<String, HostError> {
        self.record(HostCall::Capture(window));
        let hang = self.state.borrow().hang_capture;
        if hang {
            std::future::pending::<()>().await;
        }
        self.state
            .borrow()
            .capture
            .clone()
            .unwrap_or_else(|| Err(HostError::Platform("No capture configured".into())))
    }

    async fn send_to_frame(
        &self,
        tab: TabId,
        frame_id: u32,
        message: Message,
    ) -> Result<(), HostError> {
        self.record(HostCall::Send(tab, frame_id, message));
        if self.state.borrow().torn_down.contains(&tab) {
            return Err(HostError::NoReceiver);
        }
        Ok(())
    }

    async fn set_panel_behavior(&self, open_on_action_click: bool) -> Result<(), HostError> {
        self.record(HostCall::PanelBehavior(open_on_action_click));
        Ok(())
    }
}

// ── Captures ────────────────────────────────────────────────────────

/// PNG data URL of a solid capture, as the browser would return it.
pub fn solid_capture(width: u32, height: u32, color: [u8; 4]) -> String {
    let img = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    encode_png_data_url(&bytes)
}

/// Decode a preview data URL back into pixels.
pub fn decode_preview(data_url: &str) -> RgbaImage {
    let bytes = region_snip_lib::capture::decode_data_url(data_url).unwrap();
    image::load_from_memory(&bytes).unwrap().to_rgba8()
}

pub fn count_by_tag(messages: &[Message]) -> HashMap<&'static str, usize> {
    let mut counts = HashMap::new();
    for m in messages {
        *counts.entry(m.tag()).or_insert(0) += 1;
    }
    counts
}
