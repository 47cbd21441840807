//! Backend abstraction over the kernel readiness primitive actually used
//! to block the dispatch loop.
//!
//! A [`Backend`] only ever needs four operations (spec 4.1): register a
//! direction of interest on an fd, unregister one, block for events and
//! report them through an [`EventSink`], and be aborted from outside the
//! blocking call. Everything about timers, compound listeners, and signal
//! bookkeeping lives above this layer in [`crate::registry`].

use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

use crate::direction::Direction;
use crate::error::Result;

#[cfg(target_os = "linux")]
pub mod epoll;

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
pub mod kqueue;

pub mod poll;
pub mod select;

/// Receives events as a backend observes them. The registry implements
/// this directly rather than handing events back as a buffer, since a
/// single `check_events` call may resolve several compound listeners at
/// once and there is no benefit in allocating an intermediate Vec.
pub trait EventSink {
    fn dispatch_ready(&self, dir: Direction, fd: RawFd);
    fn dispatch_error(&self, fd: RawFd);
}

/// A kernel readiness multiplexer.
pub trait Backend {
    fn name(&self) -> &'static str;

    /// Starts watching `fd` for `dir`. Calling this twice for the same
    /// `(fd, dir)` pair is a caller bug; registries only ever add a
    /// direction once per fd (see `Registry::register`).
    fn add(&mut self, fd: RawFd, dir: Direction) -> io::Result<()>;

    /// Stops watching `fd` for `dir`. A no-op if it was never registered.
    fn remove(&mut self, fd: RawFd, dir: Direction) -> io::Result<()>;

    /// Blocks for up to `timeout` (or indefinitely if `None`) and reports
    /// every ready fd through `sink`. Returns once at least one event has
    /// been reported, the timeout elapses, or `abort` unblocks the call.
    fn check_events(&mut self, timeout: Option<Duration>, sink: &dyn EventSink) -> Result<()>;

    /// Unblocks a concurrent or future `check_events` call without
    /// reporting any application-level event. Safe to call from a signal
    /// handler or another thread.
    fn abort(&self) -> io::Result<()>;
}

/// Which concrete backend a [`Backend`] was built from, used only for
/// logging and the `preferred` selection list.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BackendKind {
    Epoll,
    Kqueue,
    Poll,
    Select,
}

impl BackendKind {
    fn build(self) -> io::Result<Box<dyn Backend>> {
        match self {
            #[cfg(target_os = "linux")]
            BackendKind::Epoll => Ok(Box::new(epoll::Epoll::new()?)),
            #[cfg(not(target_os = "linux"))]
            BackendKind::Epoll => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "epoll is only available on linux",
            )),

            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd",
                target_os = "dragonfly"
            ))]
            BackendKind::Kqueue => Ok(Box::new(kqueue::Kqueue::new()?)),
            #[cfg(not(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd",
                target_os = "dragonfly"
            )))]
            BackendKind::Kqueue => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "kqueue is only available on bsd-family platforms",
            )),

            BackendKind::Poll => Ok(Box::new(poll::Poll::new()?)),
            BackendKind::Select => Ok(Box::new(select::Select::new()?)),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            BackendKind::Epoll => "epoll",
            BackendKind::Kqueue => "kqueue",
            BackendKind::Poll => "poll",
            BackendKind::Select => "select",
        }
    }
}

/// Default priority order: the fastest available mechanism for the
/// platform first, `select` last since it is the only one with a
/// descriptor-count ceiling.
pub fn platform_default_order() -> Vec<BackendKind> {
    vec![
        BackendKind::Epoll,
        BackendKind::Kqueue,
        BackendKind::Poll,
        BackendKind::Select,
    ]
}

/// Builds the first backend in `order` that can actually be constructed
/// on this platform and at this moment (e.g. `/dev/epoll` fd exhaustion).
/// Logs every rejected candidate at `debug` before settling on one.
pub fn build(order: &[BackendKind]) -> crate::error::Result<Box<dyn Backend>> {
    let mut tried = Vec::new();
    for &kind in order {
        match kind.build() {
            Ok(backend) => {
                log::debug!("reactor: using {} backend", backend.name());
                return Ok(backend);
            }
            Err(err) => {
                log::debug!("reactor: {} backend unavailable: {}", kind.as_str(), err);
                tried.push(kind.as_str());
            }
        }
    }
    Err(crate::error::ReactorError::NoBackendAvailable(tried))
}
