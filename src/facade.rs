//! Process-wide façade mirroring [`Registry`]'s methods as free functions,
//! for callers that want the historical "one global reactor" ergonomics
//! (spec 6) instead of carrying a `Registry` value around. Tests that
//! need isolation should construct a private `Registry::new()` directly
//! instead of going through this module (spec 9).

use std::cell::RefCell;
use std::os::unix::io::RawFd;
use std::time::Duration;

use crate::backend::BackendKind;
use crate::error::Result;
use crate::listener::compound::Handle as EventHandle;
use crate::listener::{CompoundListener, IoListener, SignalListener, TimerListener};
use crate::registry::{Registry, Report};

thread_local! {
    static REACTOR: RefCell<Option<Registry>> = RefCell::new(None);
}

fn with_reactor<R>(f: impl FnOnce(&Registry) -> R) -> R {
    REACTOR.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(Registry::new().expect("no reactor backend available"));
        }
        f(slot.as_ref().unwrap())
    })
}

/// Builds (or rebuilds) the process-wide reactor from an explicit backend
/// priority list. `strict`: if true, only `methods` are tried; otherwise
/// the platform default order is appended as a fallback (spec 4.7).
pub fn initialize(methods: &[BackendKind], strict: bool) -> Result<()> {
    let mut order = methods.to_vec();
    if !strict {
        for kind in crate::backend::platform_default_order() {
            if !order.contains(&kind) {
                order.push(kind);
            }
        }
    }
    let registry = Registry::with_backends(&order)?;
    REACTOR.with(|cell| *cell.borrow_mut() = Some(registry));
    Ok(())
}

pub fn set_verbose(verbose: bool) {
    with_reactor(|r| r.set_verbose(verbose));
}

pub fn set_sleep(secs: f64) {
    with_reactor(|r| r.set_sleep(secs));
}

pub fn set_turbo(secs: f64) {
    with_reactor(|r| r.set_turbo(secs));
}

/// Arms or disarms the periodic registry-contents dump (spec 4.7's
/// `report` option). See [`Registry::set_report`].
pub fn set_report(enabled: bool) {
    with_reactor(|r| r.set_report(enabled));
}

/// Interface-fidelity no-op; see [`Registry::set_safe_read`].
pub fn safe_read(safe: bool) {
    with_reactor(|r| r.set_safe_read(safe));
}

/// Accepted-but-inert flag kept for interface parity with the original's
/// GIL-compatibility keep-alive; Rust has no GIL to work around (REDESIGN
/// FLAGS).
pub fn set_threaded(threaded: bool) {
    if threaded {
        log::info!("reactor: `threaded` option is a no-op on this platform");
    }
}

pub fn read<F>(fd: RawFd, persistent: bool, callback: F) -> std::io::Result<IoListener>
where
    F: FnMut() -> bool + 'static,
{
    with_reactor(|r| r.read(fd, persistent, callback))
}

pub fn write<F>(fd: RawFd, persistent: bool, callback: F) -> std::io::Result<IoListener>
where
    F: FnMut() -> bool + 'static,
{
    with_reactor(|r| r.write(fd, persistent, callback))
}

pub fn error<F>(fd: RawFd, callback: F) -> std::io::Result<IoListener>
where
    F: FnMut() -> bool + 'static,
{
    with_reactor(|r| r.error(fd, callback))
}

pub fn timeout<F>(delay: Duration, callback: F) -> TimerListener
where
    F: FnMut() -> bool + 'static,
{
    with_reactor(|r| r.timeout(delay, callback))
}

pub fn signal<F>(signum: i32, callback: F) -> std::io::Result<SignalListener>
where
    F: FnMut() + 'static,
{
    with_reactor(|r| r.signal(signum, callback))
}

pub fn event<F>(callback: F, mask: u32, handle: EventHandle) -> CompoundListener
where
    F: FnMut(u32) -> bool + 'static,
{
    with_reactor(|r| r.event(callback, mask, handle))
}

pub fn dispatch() -> Result<()> {
    with_reactor(|r| r.dispatch())
}

pub fn loop_once() -> Result<bool> {
    with_reactor(|r| r.loop_once())
}

pub fn report() -> Report {
    with_reactor(|r| r.report())
}

pub fn is_running() -> bool {
    with_reactor(|r| r.is_running())
}

pub fn abort() {
    with_reactor(|r| r.abort());
}

/// Unwinds the currently executing callback only; see
/// [`crate::registry::abort_branch`].
pub fn abort_branch() -> ! {
    crate::registry::abort_branch()
}

pub fn thread<F>(f: F) -> std::thread::JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    with_reactor(|r| r.thread(f))
}

pub fn tick() -> u64 {
    with_reactor(|r| r.tick())
}

pub fn init() {
    with_reactor(|r| r.init());
}

pub fn start() -> Result<()> {
    with_reactor(|r| r.start())
}

pub fn stop() {
    with_reactor(|r| r.stop());
}

pub fn buffwrite<E>(fd: RawFd, data: &[u8], on_error: E)
where
    E: FnMut() + 'static,
{
    with_reactor(|r| crate::buffwriter::buffwrite_fd(r, fd, data, on_error));
}

