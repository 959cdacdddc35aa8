//! Scroll freeze for the lifetime of an overlay.
//!
//! Acquiring the lock records the scroll offset and the inline styling it is
//! about to override, then pins the body with fixed positioning shifted by
//! the scroll offset so the content does not move on screen. The prior state
//! is restored on release or drop, whichever comes first.

use super::geometry::Point;
use super::page::{PageError, PageSurface, ScrollStyle};

pub struct ScrollLock<P: PageSurface> {
    page: P,
    saved_scroll: Point,
    saved_style: ScrollStyle,
    released: bool,
}

impl<P: PageSurface> ScrollLock<P> {
    pub fn acquire(page: &P) -> Result<Self, PageError> {
        let saved_scroll = page.scroll_offset();
        let saved_style = page.inline_style();

        let pinned = ScrollStyle {
            root_overflow: Some("hidden".into()),
            body_overflow: Some("hidden".into()),
            body_position: Some("fixed".into()),
            body_top: Some(format!("{}px", -saved_scroll.y)),
            body_left: Some(format!("{}px", -saved_scroll.x)),
            body_width: Some("100%".into()),
        };

        let lock = Self {
            page: page.clone(),
            saved_scroll,
            saved_style,
            released: false,
        };

        // on failure, dropping `lock` puts back whatever was partially applied
        page.set_inline_style(&pinned)?;
        Ok(lock)
    }

    /// Scroll offset at the moment the page was frozen.
    pub fn saved_scroll(&self) -> Point {
        self.saved_scroll
    }

    pub fn saved_style(&self) -> &ScrollStyle {
        &self.saved_style
    }

    pub fn release(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(e) = self.page.set_inline_style(&self.saved_style) {
            log::warn!("[OVERLAY] Failed to restore page styling: {}", e);
        }
        self.page.scroll_to(self.saved_scroll);
    }
}

impl<P: PageSurface> Drop for ScrollLock<P> {
    fn drop(&mut self) {
        self.restore();
    }
}
