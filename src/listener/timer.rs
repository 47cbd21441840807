use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::registry::{RegistryInner, TimerCallback};

/// Handle to a one-shot or self-rearming deadline.
///
/// Holds its own clone of the timer's callback so it can re-arm a timer
/// whose table entry the registry already reclaimed (a fired one-shot, or a
/// disarmed timer past `check_timers`'s rmlist sweep) without losing it.
#[derive(Clone)]
pub struct TimerListener {
    pub(crate) registry: Weak<RegistryInner>,
    pub(crate) id: u64,
    pub(crate) callback: RefCell<TimerCallback>,
}

impl TimerListener {
    /// Arms the timer for `delay` from now, deferring the actual heap
    /// insertion to the registry's `addlist` (spec 4.3/9).
    pub fn add(&self, delay: Duration) {
        if let Some(registry) = self.registry.upgrade() {
            let callback = Rc::clone(&self.callback.borrow());
            registry.arm_timer(self.id, delay, callback);
        }
    }

    /// Disarms the timer, deferring the removal to the `rmlist`.
    pub fn delete(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.disarm_timer(self.id);
        }
    }

    pub fn pending(&self) -> bool {
        self.registry
            .upgrade()
            .map(|r| r.timer_pending(self.id))
            .unwrap_or(false)
    }

    /// Replaces the callback, both in the handle's own retained copy and,
    /// if the timer's table entry still exists, in the registry.
    pub(crate) fn set_callback<F>(&self, callback: F)
    where
        F: FnMut() -> bool + 'static,
    {
        let callback: TimerCallback = Rc::new(RefCell::new(Box::new(callback)));
        *self.callback.borrow_mut() = Rc::clone(&callback);
        if let Some(registry) = self.registry.upgrade() {
            registry.set_timer_callback(self.id, callback);
        }
    }
}
