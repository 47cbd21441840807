use std::cell::{Cell, RefCell};
use std::os::unix::io::RawFd;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::listener::evtype;
use crate::listener::{IoListener, SignalListener, TimerListener};
use crate::registry::RegistryInner;

/// What a [`CompoundListener`]'s read/write children watch.
#[derive(Copy, Clone)]
pub enum Handle {
    Fd(RawFd),
    Signal(i32),
}

type CompoundCallback = Rc<RefCell<Box<dyn FnMut(u32) -> bool>>>;

/// A single user handle that fans out to up to three child listeners
/// (read, write, signal) plus an always-present timer slot, all sharing
/// one callback (spec 4.5).
pub struct CompoundListener {
    pub(crate) registry: Weak<RegistryInner>,
    mask: u32,
    handle: Handle,
    callback: CompoundCallback,
    read_child: RefCell<Option<IoListener>>,
    write_child: RefCell<Option<IoListener>>,
    signal_child: RefCell<Option<SignalListener>>,
    timer: TimerListener,
    armed: Cell<bool>,
}

impl CompoundListener {
    pub(crate) fn new(
        registry: Weak<RegistryInner>,
        mask: u32,
        handle: Handle,
        callback: Box<dyn FnMut(u32) -> bool>,
        timer: TimerListener,
    ) -> CompoundListener {
        CompoundListener {
            registry,
            mask,
            handle,
            callback: Rc::new(RefCell::new(callback)),
            read_child: RefCell::new(None),
            write_child: RefCell::new(None),
            signal_child: RefCell::new(None),
            timer,
            armed: Cell::new(false),
        }
    }

    fn persistent(&self) -> bool {
        self.mask & evtype::PERSIST != 0
    }

    /// Arms every child this event's mask covers. Passing `delay` also
    /// arms the timer child; passing `None` leaves it disarmed (spec 4.5:
    /// "a timer child is always allocated but only armed when `add` is
    /// called with a non-None delay").
    pub fn add(&self, delay: Option<Duration>) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        if self.armed.get() {
            return;
        }
        self.armed.set(true);

        if self.mask & evtype::READ != 0 {
            if let Handle::Fd(fd) = self.handle {
                let cb = Rc::clone(&self.callback);
                let listener = registry.add_io_with(fd, crate::direction::Direction::Read, self.persistent(), move || {
                    (cb.borrow_mut())(evtype::READ)
                });
                if let Ok(listener) = listener {
                    *self.read_child.borrow_mut() = Some(listener);
                }
            }
        }
        if self.mask & evtype::WRITE != 0 {
            if let Handle::Fd(fd) = self.handle {
                let cb = Rc::clone(&self.callback);
                let listener = registry.add_io_with(fd, crate::direction::Direction::Write, self.persistent(), move || {
                    (cb.borrow_mut())(evtype::WRITE)
                });
                if let Ok(listener) = listener {
                    *self.write_child.borrow_mut() = Some(listener);
                }
            }
        }
        if self.mask & evtype::SIGNAL != 0 {
            if let Handle::Signal(signum) = self.handle {
                let cb = Rc::clone(&self.callback);
                let listener = registry.add_signal_with(signum, move || {
                    let _ = (cb.borrow_mut())(evtype::SIGNAL);
                });
                if let Ok(listener) = listener {
                    *self.signal_child.borrow_mut() = Some(listener);
                }
            }
        }
        if let Some(delay) = delay {
            let cb = Rc::clone(&self.callback);
            let persist = self.persistent();
            self.timer.set_callback(move || {
                let again = (cb.borrow_mut())(evtype::TIMEOUT);
                again && persist
            });
            self.timer.add(delay);
        }
    }

    /// Tears down every armed child. The registry untables them; this
    /// handle owns the child structs so they never outlive the parent
    /// (spec 3, invariant 5).
    pub fn delete(&self) {
        if let Some(l) = self.read_child.borrow_mut().take() {
            l.delete();
        }
        if let Some(l) = self.write_child.borrow_mut().take() {
            l.delete();
        }
        if let Some(l) = self.signal_child.borrow_mut().take() {
            l.delete();
        }
        self.timer.delete();
        self.armed.set(false);
    }

    pub fn pending(&self) -> bool {
        self.read_child.borrow().as_ref().map(|l| l.pending()).unwrap_or(false)
            || self.write_child.borrow().as_ref().map(|l| l.pending()).unwrap_or(false)
            || self.signal_child.borrow().as_ref().map(|l| l.pending()).unwrap_or(false)
            || self.timer.pending()
    }
}
