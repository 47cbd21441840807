//! The reactor core: owns the backend, the fd readiness tables, the timer
//! heap and the signal table, and runs the dispatch loop (spec 4.2).

use std::cell::{Cell, RefCell};
use std::collections::{BinaryHeap, HashMap};
use std::os::unix::io::RawFd;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::backend::{self, Backend, BackendKind, EventSink};
use crate::direction::Direction;
use crate::error::{ReactorError, Result};
use crate::listener::compound::{CompoundListener, Handle as CompoundHandle};
use crate::listener::{IoListener, SignalListener, TimerListener};
use crate::sys::selfpipe::SelfPipe;

/// Default idle sleep floor between ticks when nothing is writable.
pub const DEFAULT_SLEEP: Duration = Duration::from_millis(20);
/// Sleep floor while any write-direction interest is armed ("turbo" mode).
pub const DEFAULT_TURBO: Duration = Duration::from_millis(0);
/// Interval of the periodic registry dump armed by the `report` option (spec 4.7).
const REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Internal cancellation sentinel for [`abort_branch`]. A panic payload of
/// this type unwinds the callback that raised it without stopping the
/// dispatch loop; any other payload propagates out of `dispatch()`.
pub struct AbortBranch;

/// Unwinds the currently executing callback only; the loop keeps running.
/// Must only be called from within a listener callback.
pub fn abort_branch() -> ! {
    std::panic::panic_any(AbortBranch)
}

fn is_abort_branch(payload: &(dyn std::any::Any + Send)) -> bool {
    payload.downcast_ref::<AbortBranch>().is_some()
}

struct IoEntry {
    callback: Rc<RefCell<Box<dyn FnMut() -> bool>>>,
    persistent: bool,
}

struct SignalEntry {
    callback: Rc<RefCell<Box<dyn FnMut()>>>,
    saved: libc::sigaction,
}

/// Shared ownership of a timer's callback. Kept alive by the armed
/// `TimerState` entry in the registry's table *and*, independently, by
/// every `TimerListener` handle, so a handle can still re-arm a timer
/// whose table entry was reclaimed after a one-shot firing (spec 9).
pub(crate) type TimerCallback = Rc<RefCell<Box<dyn FnMut() -> bool>>>;

struct TimerState {
    delay: Cell<Option<Duration>>,
    expiration: Cell<Option<Instant>>,
    queued: Cell<bool>,
    callback: RefCell<TimerCallback>,
}

impl TimerState {
    fn new(callback: TimerCallback) -> TimerState {
        TimerState {
            delay: Cell::new(None),
            expiration: Cell::new(None),
            queued: Cell::new(false),
            callback: RefCell::new(callback),
        }
    }
}

struct HeapEntry {
    expiration: Instant,
    id: u64,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.expiration == other.expiration
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // reversed so `BinaryHeap` (a max-heap) pops the earliest expiration first
        other.expiration.cmp(&self.expiration)
    }
}

/// Process-wide pending-signal bitmask, set only from async-signal-safe
/// context (spec 4.4, 9 "Signal-safe re-entry"). One bit per signal
/// number; bit 0 is unused since signal 0 is not deliverable.
static PENDING_SIGNALS: AtomicU64 = AtomicU64::new(0);
/// Write end of whichever registry's signal self-pipe last installed a
/// handler; the trampoline only ever writes a single byte to it.
static SIGNAL_WAKE_FD: AtomicI32 = AtomicI32::new(-1);

extern "C" fn signal_trampoline(signum: libc::c_int) {
    if (1..64).contains(&signum) {
        PENDING_SIGNALS.fetch_or(1u64 << signum, Ordering::SeqCst);
    }
    let fd = SIGNAL_WAKE_FD.load(Ordering::SeqCst);
    if fd >= 0 {
        crate::sys::selfpipe::wake(fd);
    }
}

/// A report snapshot, as returned by [`Registry::report`] (spec 4.2).
#[derive(Debug, Clone, Copy, Default)]
pub struct Report {
    pub timers: usize,
    pub signals: usize,
    pub reads: usize,
    pub writes: usize,
}

/// The reactor core. Cheaply `Clone`-able (an `Rc` around the real state);
/// listener handles hold a `Weak` back-reference to it rather than owning
/// it outright (spec 9, "Cyclic ownership").
#[derive(Clone)]
pub struct Registry(pub(crate) Rc<RegistryInner>);

pub struct RegistryInner {
    backend: RefCell<Box<dyn Backend>>,
    io: RefCell<HashMap<(RawFd, Direction), IoEntry>>,
    signals: RefCell<HashMap<i32, SignalEntry>>,
    signal_pipe: SelfPipe,
    timers: RefCell<HashMap<u64, Rc<TimerState>>>,
    heap: RefCell<BinaryHeap<HeapEntry>>,
    addlist: RefCell<Vec<u64>>,
    rmlist: RefCell<Vec<u64>>,
    next_timer_id: Cell<u64>,
    running: Cell<bool>,
    sleep: Cell<Duration>,
    turbo: Cell<Duration>,
    tick: Cell<u64>,
    verbose: Cell<bool>,
    safe_read: Cell<bool>,
    report_timer: RefCell<Option<TimerListener>>,
}

impl Registry {
    /// Builds a registry trying `crate::backend::platform_default_order()`.
    pub fn new() -> Result<Registry> {
        Registry::with_backends(&backend::platform_default_order())
    }

    /// Builds a registry trying only the backends in `order`, in order.
    pub fn with_backends(order: &[BackendKind]) -> Result<Registry> {
        let backend = backend::build(order)?;
        let signal_pipe = SelfPipe::new().map_err(ReactorError::Io)?;
        SIGNAL_WAKE_FD.store(signal_pipe.write_fd(), Ordering::SeqCst);

        let inner = RegistryInner {
            backend: RefCell::new(backend),
            io: RefCell::new(HashMap::new()),
            signals: RefCell::new(HashMap::new()),
            signal_pipe,
            timers: RefCell::new(HashMap::new()),
            heap: RefCell::new(BinaryHeap::new()),
            addlist: RefCell::new(Vec::new()),
            rmlist: RefCell::new(Vec::new()),
            next_timer_id: Cell::new(1),
            running: Cell::new(false),
            sleep: Cell::new(DEFAULT_SLEEP),
            turbo: Cell::new(DEFAULT_TURBO),
            tick: Cell::new(0),
            verbose: Cell::new(false),
            safe_read: Cell::new(false),
            report_timer: RefCell::new(None),
        };

        inner
            .backend
            .borrow_mut()
            .add(inner.signal_pipe.read_fd(), Direction::Read)
            .map_err(ReactorError::Io)?;

        Ok(Registry(Rc::new(inner)))
    }

    fn weak(&self) -> Weak<RegistryInner> {
        Rc::downgrade(&self.0)
    }

    // ---- configuration -------------------------------------------------

    pub fn set_verbose(&self, verbose: bool) {
        self.0.verbose.set(verbose);
        log::debug!("reactor: verbose={verbose}");
    }

    pub fn set_sleep(&self, secs: f64) {
        self.0.sleep.set(Duration::from_secs_f64(secs.max(0.0)));
    }

    pub fn set_turbo(&self, secs: f64) {
        self.0.turbo.set(Duration::from_secs_f64(secs.max(0.0)));
    }

    /// Arms (or disarms) a self-rearming `REPORT_INTERVAL` timer that logs
    /// a [`Registry::report`] snapshot at `info` level, matching the
    /// façade's `report` option (spec 4.7).
    pub fn set_report(&self, enabled: bool) {
        let mut slot = self.0.report_timer.borrow_mut();
        if enabled {
            if slot.is_none() {
                let registry = self.clone();
                let timer = self.timeout(REPORT_INTERVAL, move || {
                    let r = registry.report();
                    log::info!(
                        "reactor report: timers={} signals={} reads={} writes={}",
                        r.timers,
                        r.signals,
                        r.reads,
                        r.writes
                    );
                    true
                });
                *slot = Some(timer);
            }
        } else if let Some(timer) = slot.take() {
            timer.delete();
        }
    }

    /// Interface-fidelity no-op: our factory operations already take
    /// closures rather than a variadic argument bundle, so there is
    /// nothing for "safe read" to strip. See REDESIGN FLAGS.
    pub fn set_safe_read(&self, safe: bool) {
        self.0.safe_read.set(safe);
    }

    pub fn safe_read(&self) -> bool {
        self.0.safe_read.get()
    }

    pub fn is_running(&self) -> bool {
        self.0.running.get()
    }

    pub fn tick(&self) -> u64 {
        self.0.tick.get()
    }

    // ---- io --------------------------------------------------------

    pub fn read<F>(&self, fd: RawFd, persistent: bool, callback: F) -> std::io::Result<IoListener>
    where
        F: FnMut() -> bool + 'static,
    {
        self.0.add_io_with(fd, Direction::Read, persistent, callback)
    }

    pub fn write<F>(&self, fd: RawFd, persistent: bool, callback: F) -> std::io::Result<IoListener>
    where
        F: FnMut() -> bool + 'static,
    {
        self.0.add_io_with(fd, Direction::Write, persistent, callback)
    }

    pub fn error<F>(&self, fd: RawFd, callback: F) -> std::io::Result<IoListener>
    where
        F: FnMut() -> bool + 'static,
    {
        self.0.add_io_with(fd, Direction::Error, true, callback)
    }

    // ---- timers ------------------------------------------------------

    pub fn timeout<F>(&self, delay: Duration, callback: F) -> TimerListener
    where
        F: FnMut() -> bool + 'static,
    {
        let callback: TimerCallback = Rc::new(RefCell::new(Box::new(callback)));
        let id = self.0.new_timer(Rc::clone(&callback));
        self.0.arm_timer(id, delay, Rc::clone(&callback));
        TimerListener {
            registry: self.weak(),
            id,
            callback: RefCell::new(callback),
        }
    }

    // ---- signals -------------------------------------------------------

    pub fn signal<F>(&self, signum: i32, callback: F) -> std::io::Result<SignalListener>
    where
        F: FnMut() + 'static,
    {
        self.0.add_signal_with(signum, callback)
    }

    // ---- compound events -------------------------------------------------

    pub fn event<F>(&self, callback: F, mask: u32, handle: CompoundHandle) -> CompoundListener
    where
        F: FnMut(u32) -> bool + 'static,
    {
        let placeholder: TimerCallback = Rc::new(RefCell::new(Box::new(|| false)));
        let timer_id = self.0.new_timer(Rc::clone(&placeholder));
        let timer = TimerListener {
            registry: self.weak(),
            id: timer_id,
            callback: RefCell::new(placeholder),
        };
        CompoundListener::new(self.weak(), mask, handle, Box::new(callback), timer)
    }

    // ---- lifecycle -------------------------------------------------------

    pub fn report(&self) -> Report {
        let io = self.0.io.borrow();
        Report {
            timers: self.0.timers.borrow().values().filter(|t| t.expiration.get().is_some()).count(),
            signals: self.0.signals.borrow().len(),
            reads: io.keys().filter(|k| k.1 == Direction::Read).count(),
            writes: io.keys().filter(|k| k.1 == Direction::Write).count(),
        }
    }

    /// Restores every installed signal handler and clears all state,
    /// matching the original's `init()` (spec 4.2, invariant 7).
    pub fn init(&self) {
        let signums: Vec<i32> = self.0.signals.borrow().keys().copied().collect();
        for signum in signums {
            self.0.remove_signal(signum);
        }
        self.0.io.borrow_mut().clear();
        self.0.timers.borrow_mut().clear();
        self.0.heap.borrow_mut().clear();
        self.0.addlist.borrow_mut().clear();
        self.0.rmlist.borrow_mut().clear();
        self.0.report_timer.borrow_mut().take();
        self.0.running.set(false);
    }

    /// Stops the loop and deletes every I/O listener (spec 4.2, 5).
    pub fn abort(&self) {
        self.0.running.set(false);
        self.0.io.borrow_mut().clear();
        let _ = self.0.backend.borrow().abort();
    }

    /// Launches a detached worker thread running `f`, catching (and
    /// discarding) an `AbortBranch` the same way dispatch does. The
    /// reactor's own state must not be touched from `f` (spec 5).
    pub fn thread<F>(&self, f: F) -> std::thread::JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        std::thread::spawn(move || {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
            if let Err(payload) = result {
                if !is_abort_branch(&*payload) {
                    std::panic::resume_unwind(payload);
                }
            }
        })
    }

    /// Runs one tick of the dispatch loop; returns whether any work
    /// (armed io, timers, or signals) remains (spec 4.2).
    pub fn loop_once(&self) -> Result<bool> {
        let has_writes = self.0.io.borrow().keys().any(|k| k.1 == Direction::Write);
        let sleep = if has_writes && self.0.turbo.get() > Duration::ZERO {
            self.0.turbo.get()
        } else {
            self.0.sleep.get()
        };

        self.0.tick.set(self.0.tick.get() + 1);

        // Events are collected into a buffer rather than dispatched
        // straight from the backend call: a callback is free to add or
        // remove listeners, which needs the backend's `RefCell` free,
        // and `check_events` itself still holds it mutably borrowed.
        let buffer = EventBuffer::default();
        let outcome = self.0.backend.borrow_mut().check_events(Some(sleep), &buffer);
        match outcome {
            Ok(()) => {}
            Err(ReactorError::Io(ref e)) if e.kind() == std::io::ErrorKind::Interrupted => {
                if !self.0.signals.borrow().contains_key(&libc::SIGINT) {
                    return Err(ReactorError::Interrupted);
                }
            }
            Err(other) => return Err(other),
        }

        for event in buffer.events.into_inner() {
            match event {
                RawEvent::Ready(dir, fd) => self.0.dispatch_ready_event(dir, fd),
                RawEvent::Error(fd) => self.0.dispatch_error_event(fd),
            }
        }

        let any_timers = self.0.check_timers();
        let any_io = !self.0.io.borrow().is_empty();
        let any_signals = !self.0.signals.borrow().is_empty();

        Ok(any_io || any_timers || any_signals)
    }

    /// Enters the loop and blocks until `loop_once` reports no remaining
    /// work, or a listener calls [`Registry::abort`].
    pub fn dispatch(&self) -> Result<()> {
        self.0.running.set(true);
        while self.0.running.get() {
            if !self.loop_once()? {
                break;
            }
        }
        self.0.running.set(false);
        Ok(())
    }

    /// Installs `SIGINT` → `abort()` and enters `dispatch()`.
    pub fn start(&self) -> Result<()> {
        let registry = self.clone();
        self.signal(libc::SIGINT, move || registry.abort())
            .map_err(ReactorError::Io)?;
        self.dispatch()
    }

    /// Aborts if running; otherwise terminates the process, matching the
    /// original's unconditional exit semantics when called idle.
    pub fn stop(&self) {
        if self.is_running() {
            self.abort();
        } else {
            std::process::exit(0);
        }
    }
}

impl RegistryInner {
    pub(crate) fn has_io(&self, fd: RawFd, dir: Direction) -> bool {
        self.io.borrow().contains_key(&(fd, dir))
    }

    pub(crate) fn add_io_with<F>(
        self: &Rc<Self>,
        fd: RawFd,
        dir: Direction,
        persistent: bool,
        callback: F,
    ) -> std::io::Result<IoListener>
    where
        F: FnMut() -> bool + 'static,
    {
        if dir != Direction::Error {
            self.backend.borrow_mut().add(fd, dir)?;
        }
        self.io.borrow_mut().insert(
            (fd, dir),
            IoEntry {
                callback: Rc::new(RefCell::new(Box::new(callback))),
                persistent,
            },
        );
        Ok(IoListener {
            registry: Rc::downgrade(self),
            fd,
            dir,
        })
    }

    pub(crate) fn remove_io(&self, fd: RawFd, dir: Direction) {
        if self.io.borrow_mut().remove(&(fd, dir)).is_some() && dir != Direction::Error {
            let _ = self.backend.borrow_mut().remove(fd, dir);
        }
    }

    pub(crate) fn has_signal(&self, signum: i32) -> bool {
        self.signals.borrow().contains_key(&signum)
    }

    pub(crate) fn add_signal_with<F>(
        self: &Rc<Self>,
        signum: i32,
        callback: F,
    ) -> std::io::Result<SignalListener>
    where
        F: FnMut() + 'static,
    {
        let mut saved: libc::sigaction = unsafe { std::mem::zeroed() };
        let mut new_action: libc::sigaction = unsafe { std::mem::zeroed() };
        new_action.sa_sigaction = signal_trampoline as usize;
        new_action.sa_flags = 0;
        unsafe {
            libc::sigemptyset(&mut new_action.sa_mask);
            if libc::sigaction(signum, &new_action, &mut saved) == -1 {
                return Err(std::io::Error::last_os_error());
            }
        }
        self.signals.borrow_mut().insert(
            signum,
            SignalEntry {
                callback: Rc::new(RefCell::new(Box::new(callback))),
                saved,
            },
        );
        Ok(SignalListener {
            registry: Rc::downgrade(self),
            signum,
        })
    }

    pub(crate) fn remove_signal(&self, signum: i32) {
        if let Some(entry) = self.signals.borrow_mut().remove(&signum) {
            unsafe {
                libc::sigaction(signum, &entry.saved, std::ptr::null_mut());
            }
        }
    }

    pub(crate) fn new_timer(&self, callback: TimerCallback) -> u64 {
        let id = self.next_timer_id.get();
        self.next_timer_id.set(id + 1);
        self.timers.borrow_mut().insert(id, Rc::new(TimerState::new(callback)));
        id
    }

    /// Updates the callback of an armed timer, or recreates its table entry
    /// (with `queued = false`, not yet scheduled) if a prior firing already
    /// reclaimed it — see `check_timers`'s removal of spent one-shot
    /// entries.
    pub(crate) fn set_timer_callback(&self, id: u64, callback: TimerCallback) {
        let mut timers = self.timers.borrow_mut();
        match timers.get(&id) {
            Some(state) => *state.callback.borrow_mut() = callback,
            None => {
                timers.insert(id, Rc::new(TimerState::new(callback)));
            }
        }
    }

    /// Arms `id` for `delay`, recreating its table entry from `callback`
    /// if a prior one-shot firing already reclaimed it (spec 9: a
    /// `TimerListener` handle must still be able to re-arm a timer whose
    /// state the registry has since dropped).
    pub(crate) fn arm_timer(&self, id: u64, delay: Duration, callback: TimerCallback) {
        let state = {
            let mut timers = self.timers.borrow_mut();
            Rc::clone(timers.entry(id).or_insert_with(|| Rc::new(TimerState::new(callback))))
        };
        state.delay.set(Some(delay));
        state.expiration.set(Some(Instant::now() + delay));
        self.addlist.borrow_mut().push(id);
    }

    pub(crate) fn disarm_timer(&self, id: u64) {
        if let Some(state) = self.timers.borrow().get(&id) {
            state.expiration.set(None);
        }
        self.rmlist.borrow_mut().push(id);
    }

    pub(crate) fn timer_pending(&self, id: u64) -> bool {
        self.timers
            .borrow()
            .get(&id)
            .map(|s| s.expiration.get().is_some())
            .unwrap_or(false)
    }

    /// Reconciles `addlist`/`rmlist` into the heap, then fires every timer
    /// whose expiration has passed. Returns whether any timer is still
    /// armed afterwards (spec 4.2, 9 "Deferred timer mutation").
    fn check_timers(&self) -> bool {
        for id in self.addlist.borrow_mut().drain(..) {
            if let Some(state) = self.timers.borrow().get(&id) {
                if let Some(expiration) = state.expiration.get() {
                    state.queued.set(true);
                    self.heap.borrow_mut().push(HeapEntry { expiration, id });
                }
            }
        }
        // A disarmed id is only dropped from the table if it's still
        // disarmed by the time we get here — an intervening add() (e.g. a
        // CompoundListener's delete-then-readd within the same tick) leaves
        // expiration set again, and that re-arm must not be undone.
        for id in self.rmlist.borrow_mut().drain(..) {
            let reclaim = self
                .timers
                .borrow()
                .get(&id)
                .map(|s| s.expiration.get().is_none())
                .unwrap_or(false);
            if reclaim {
                self.timers.borrow_mut().remove(&id);
            }
        }

        let now = Instant::now();
        loop {
            let ready = matches!(self.heap.borrow().peek(), Some(top) if top.expiration <= now);
            if !ready {
                break;
            }
            let HeapEntry { expiration, id } = self.heap.borrow_mut().pop().unwrap();

            let Some(state) = self.timers.borrow().get(&id).cloned() else {
                continue;
            };
            if !state.queued.get() || state.expiration.get() != Some(expiration) {
                // stale: disarmed, or superseded by a later re-arm
                continue;
            }

            let cb = Rc::clone(&state.callback.borrow());
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (cb.borrow_mut())()));
            let rearm = match result {
                Ok(v) => v,
                Err(payload) => {
                    if is_abort_branch(&*payload) {
                        false
                    } else {
                        std::panic::resume_unwind(payload);
                    }
                }
            };

            if rearm {
                if let Some(delay) = state.delay.get() {
                    let next = Instant::now() + delay;
                    state.expiration.set(Some(next));
                    self.heap.borrow_mut().push(HeapEntry { expiration: next, id });
                    continue;
                }
            }
            state.expiration.set(None);
            state.queued.set(false);
            // One-shot, fired, not re-armed: nothing still references this
            // id but the TimerListener/CompoundListener handle, which
            // carries its own callback and can recreate the entry on re-arm.
            self.timers.borrow_mut().remove(&id);
        }

        self.timers.borrow().values().any(|s| s.expiration.get().is_some())
    }

    fn invoke_io(&self, fd: RawFd, dir: Direction) {
        let found = self.io.borrow().get(&(fd, dir)).map(|e| (Rc::clone(&e.callback), e.persistent));
        let Some((cb, persistent)) = found else {
            return;
        };

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (cb.borrow_mut())()));
        let keep = match result {
            Ok(v) => v,
            Err(payload) => {
                if is_abort_branch(&*payload) {
                    persistent
                } else {
                    std::panic::resume_unwind(payload);
                }
            }
        };

        if !keep && !persistent {
            self.remove_io(fd, dir);
        }
    }

    fn drain_signals(&self) {
        self.signal_pipe.drain();
        let pending = PENDING_SIGNALS.swap(0, Ordering::SeqCst);
        if pending == 0 {
            return;
        }
        for signum in 1..64i32 {
            if pending & (1u64 << signum) != 0 {
                self.invoke_signal(signum);
            }
        }
    }

    fn invoke_signal(&self, signum: i32) {
        let cb = self.signals.borrow().get(&signum).map(|e| Rc::clone(&e.callback));
        let Some(cb) = cb else {
            return;
        };
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            (cb.borrow_mut())();
        }));
        if let Err(payload) = result {
            if !is_abort_branch(&*payload) {
                std::panic::resume_unwind(payload);
            }
        }
    }
}

enum RawEvent {
    Ready(Direction, RawFd),
    Error(RawFd),
}

/// Records events as the backend reports them, without running any user
/// callback — `check_events` still holds the backend borrowed mutably at
/// that point, and callbacks are allowed to re-enter the registry.
#[derive(Default)]
struct EventBuffer {
    events: RefCell<Vec<RawEvent>>,
}

impl EventSink for EventBuffer {
    fn dispatch_ready(&self, dir: Direction, fd: RawFd) {
        self.events.borrow_mut().push(RawEvent::Ready(dir, fd));
    }

    fn dispatch_error(&self, fd: RawFd) {
        self.events.borrow_mut().push(RawEvent::Error(fd));
    }
}

impl RegistryInner {
    fn dispatch_ready_event(&self, dir: Direction, fd: RawFd) {
        if dir == Direction::Read && fd == self.signal_pipe.read_fd() {
            self.drain_signals();
            return;
        }
        self.invoke_io(fd, dir);
    }

    fn dispatch_error_event(&self, fd: RawFd) {
        self.invoke_io(fd, Direction::Error);
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;

    #[test]
    fn set_report_arms_and_disarms_a_single_timer() {
        let reactor = Registry::new().unwrap();

        reactor.set_report(true);
        assert!(reactor.0.report_timer.borrow().is_some());

        // enabling twice must not stack a second timer
        reactor.set_report(true);
        assert!(reactor.0.report_timer.borrow().is_some());

        reactor.set_report(false);
        assert!(reactor.0.report_timer.borrow().is_none());
    }
}
