//! Selection overlay state machine.
//!
//! `Idle → Armed → Dragging → {Committed | Cancelled} → TornDown`
//!
//! One [`OverlayAgent`] owns everything the overlay changed in the page
//! (listeners, overlay DOM, scroll freeze, mount slot) and gives all of it
//! back in [`OverlayAgent::teardown`], which is safe to call any number of
//! times from any state.

use super::geometry::{CssRect, MaskLayout, Point};
use super::page::{PageEvent, PageSurface, PointerEvent, Reaction, PRIMARY_BUTTON};
use super::registry::{MountGuard, MountRegistry};
use super::scroll_lock::ScrollLock;
use crate::config::SnipConfig;
use crate::protocol::{Message, SelectionRect};

pub const HINT_TEXT: &str = "Select area with mouse. Press Esc to cancel.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    Idle,
    Armed,
    Dragging,
    Committed,
    Cancelled,
    TornDown,
}

/// How an interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayOutcome {
    Committed(SelectionRect),
    Cancelled,
}

struct OverlaySession<P: PageSurface> {
    phase: OverlayPhase,
    origin: Point,
    current: CssRect,
    scroll_lock: Option<ScrollLock<P>>,
    mount: Option<MountGuard>,
}

pub struct OverlayAgent<P: PageSurface> {
    page: P,
    session: OverlaySession<P>,
    min_selection_px: f64,
    cleaning_up: bool,
    outcome: Option<OverlayOutcome>,
}

impl<P: PageSurface> OverlayAgent<P> {
    /// Mount the overlay on `page`.
    ///
    /// Returns `None` when the page already has an overlay, or when the page
    /// refused the scroll freeze or the overlay DOM. Nothing is left behind
    /// in either case.
    pub fn mount(page: P, registry: &MountRegistry, config: &SnipConfig) -> Option<Self> {
        let Some(mount) = registry.try_acquire() else {
            log::debug!("[OVERLAY] Overlay already mounted, ignoring second injection");
            return None;
        };

        let mut agent = Self {
            page,
            session: OverlaySession {
                phase: OverlayPhase::Idle,
                origin: Point::default(),
                current: CssRect::default(),
                scroll_lock: None,
                mount: Some(mount),
            },
            min_selection_px: config.min_selection_px,
            cleaning_up: false,
            outcome: None,
        };

        if let Err(e) = agent.arm() {
            log::warn!("[OVERLAY] Mount failed: {}", e);
            agent.teardown();
            return None;
        }

        log::info!("[OVERLAY] Armed");
        Some(agent)
    }

    fn arm(&mut self) -> Result<(), super::page::PageError> {
        self.session.scroll_lock = Some(ScrollLock::acquire(&self.page)?);
        self.page.mount_overlay(HINT_TEXT)?;
        self.render(CssRect::default())?;
        self.page.add_listeners()?;
        self.session.phase = OverlayPhase::Armed;
        Ok(())
    }

    pub fn phase(&self) -> OverlayPhase {
        self.session.phase
    }

    pub fn outcome(&self) -> Option<&OverlayOutcome> {
        self.outcome.as_ref()
    }

    /// Current hole as last computed from pointer input.
    pub fn current_rect(&self) -> CssRect {
        self.session.current
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    /// Dispatch one DOM event. Events after teardown are ignored.
    pub fn handle_event(&mut self, event: &PageEvent) -> Reaction {
        if self.cleaning_up {
            return Reaction::ignored();
        }

        match event {
            PageEvent::PointerDown(pointer) => self.on_down(pointer),
            PageEvent::PointerMove(pointer) => self.on_move(pointer),
            PageEvent::PointerUp(_) => self.on_up(),
            PageEvent::KeyDown(key) if key.is_escape() => self.cancel(true),
            PageEvent::KeyDown(_) => Reaction::ignored(),
        }
    }

    /// Handle a runtime message addressed to this frame.
    ///
    /// Returns false when the message is not for the overlay or the overlay
    /// is already gone, i.e. nothing received it.
    pub fn handle_message(&mut self, message: &Message) -> bool {
        match message {
            Message::ForceOverlayCleanup if !self.cleaning_up => {
                log::info!("[OVERLAY] Forced cleanup");
                self.cancel(false);
                true
            }
            _ => false,
        }
    }

    fn on_down(&mut self, pointer: &PointerEvent) -> Reaction {
        if pointer.button != PRIMARY_BUTTON {
            return Reaction::ignored();
        }

        self.session.phase = OverlayPhase::Dragging;
        self.session.origin = pointer.point();
        self.update_hole(pointer.point());

        Reaction {
            prevent_default: true,
            ..Reaction::default()
        }
    }

    fn on_move(&mut self, pointer: &PointerEvent) -> Reaction {
        if self.session.phase != OverlayPhase::Dragging {
            return Reaction::ignored();
        }
        self.update_hole(pointer.point());
        Reaction::ignored()
    }

    fn on_up(&mut self) -> Reaction {
        if self.session.phase != OverlayPhase::Dragging {
            return Reaction::ignored();
        }

        let hole = self.page.rendered_hole().unwrap_or(self.session.current);
        if hole.width < self.min_selection_px || hole.height < self.min_selection_px {
            log::debug!(
                "[OVERLAY] {}x{} is below the minimum, treating as a click",
                hole.width,
                hole.height
            );
            return self.cancel(true);
        }

        let scroll = self
            .session
            .scroll_lock
            .as_ref()
            .map(ScrollLock::saved_scroll)
            .unwrap_or_else(|| self.page.scroll_offset());

        let rect = SelectionRect {
            x: hole.left,
            y: hole.top,
            w: hole.width,
            h: hole.height,
            scroll_x: scroll.x,
            scroll_y: scroll.y,
            dpr: self.page.device_pixel_ratio(),
        };

        log::info!(
            "[OVERLAY] Selection {}x{} at {},{} (dpr {})",
            rect.w,
            rect.h,
            rect.x,
            rect.y,
            rect.dpr
        );

        self.session.phase = OverlayPhase::Committed;
        self.outcome = Some(OverlayOutcome::Committed(rect));
        self.teardown();

        Reaction::default().with_message(Message::SelectionFinished { rect })
    }

    /// End the session without a rectangle. `report` is false for forced
    /// cleanup, where the orchestrator initiated the cancel itself.
    fn cancel(&mut self, report: bool) -> Reaction {
        self.session.phase = OverlayPhase::Cancelled;
        self.outcome = Some(OverlayOutcome::Cancelled);
        self.teardown();

        if report {
            Reaction::consumed().with_message(Message::SelectionCancelled)
        } else {
            Reaction::ignored()
        }
    }

    fn update_hole(&mut self, pointer: Point) {
        let viewport = self.page.viewport();
        let hole = CssRect::from_corners(self.session.origin, pointer).clamp_to(viewport);
        if let Err(e) = self.render(hole) {
            log::warn!("[OVERLAY] Failed to update selection: {}", e);
        }
    }

    fn render(&mut self, hole: CssRect) -> Result<(), super::page::PageError> {
        self.session.current = hole;
        let masks = MaskLayout::around(hole, self.page.viewport());
        self.page.render_selection(hole, &masks)
    }

    /// Give back everything the overlay took. Idempotent; failures of
    /// individual steps are logged and do not stop the rest.
    pub fn teardown(&mut self) {
        if self.cleaning_up {
            return;
        }
        self.cleaning_up = true;

        if let Err(e) = self.page.remove_listeners() {
            log::warn!("[OVERLAY] Failed to remove listeners: {}", e);
        }
        if let Err(e) = self.page.remove_overlay() {
            log::warn!("[OVERLAY] Failed to remove overlay: {}", e);
        }
        if let Some(lock) = self.session.scroll_lock.take() {
            lock.release();
        }
        self.session.mount = None;
        self.session.phase = OverlayPhase::TornDown;

        log::debug!("[OVERLAY] Torn down");
    }
}

impl<P: PageSurface> Drop for OverlayAgent<P> {
    fn drop(&mut self) {
        self.teardown();
    }
}
