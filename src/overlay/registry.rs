//! One overlay per page.
//!
//! A page owns one [`MountRegistry`]; mounting an overlay requires taking the
//! registry's [`MountGuard`], and a second take fails while the first guard
//! is alive. Dropping the guard frees the slot.

use std::cell::Cell;
use std::rc::Rc;

#[derive(Clone, Default)]
pub struct MountRegistry {
    mounted: Rc<Cell<bool>>,
}

impl MountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<MountGuard> {
        if self.mounted.replace(true) {
            return None;
        }
        Some(MountGuard {
            mounted: Rc::clone(&self.mounted),
        })
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }
}

pub struct MountGuard {
    mounted: Rc<Cell<bool>>,
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        self.mounted.set(false);
    }
}
