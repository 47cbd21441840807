//! A single-threaded, backend-abstracted reactor.
//!
//! Register interest in file-descriptor readiness, timers, or signals
//! against a [`Registry`], then run [`Registry::dispatch`] to enter the
//! loop. A [`facade`] module mirrors this same surface through a
//! process-wide singleton for callers that don't want to carry a
//! `Registry` value around themselves.
//!
//! ```no_run
//! use rel_reactor::Registry;
//! use std::time::Duration;
//!
//! let reactor = Registry::new().unwrap();
//! reactor.timeout(Duration::from_secs(5), || {
//!     println!("five seconds elapsed");
//!     false
//! });
//! reactor.dispatch().unwrap();
//! ```

pub mod backend;
pub mod buffwriter;
pub mod direction;
pub mod error;
pub mod facade;
pub mod listener;
pub(crate) mod macros;
pub mod registry;
pub(crate) mod sys;

pub use direction::Direction;
pub use error::{ReactorError, Result};
pub use listener::{compound::Handle as EventHandle, CompoundListener, IoListener, SignalListener, TimerListener};
pub use registry::{abort_branch, Registry, Report};

/// Fires once, at the deadline.
pub const EV_TIMEOUT: u32 = listener::evtype::TIMEOUT;
/// Fires whenever the handle is readable.
pub const EV_READ: u32 = listener::evtype::READ;
/// Fires whenever the handle is writable.
pub const EV_WRITE: u32 = listener::evtype::WRITE;
/// Fires whenever the signal is delivered.
pub const EV_SIGNAL: u32 = listener::evtype::SIGNAL;
/// Keeps child I/O listeners armed across firings instead of auto-deleting.
pub const EV_PERSIST: u32 = listener::evtype::PERSIST;
