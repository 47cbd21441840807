use std::os::unix::io::RawFd;
use std::rc::Weak;

use crate::direction::Direction;
use crate::registry::RegistryInner;

/// Handle to a registered (direction, fd) readiness callback.
///
/// Dropping a handle does not unregister anything — matching the
/// original's explicit `delete()` lifecycle (spec 3, Lifecycles). Call
/// [`IoListener::delete`] to untable it.
#[derive(Clone)]
pub struct IoListener {
    pub(crate) registry: Weak<RegistryInner>,
    pub(crate) fd: RawFd,
    pub(crate) dir: Direction,
}

impl IoListener {
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    pub fn direction(&self) -> Direction {
        self.dir
    }

    /// True while the registry still has this (direction, fd) armed.
    pub fn pending(&self) -> bool {
        self.registry
            .upgrade()
            .map(|r| r.has_io(self.fd, self.dir))
            .unwrap_or(false)
    }

    /// Unregisters the callback and, if no direction remains armed on
    /// this fd, drops the backend's interest in it entirely.
    pub fn delete(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove_io(self.fd, self.dir);
        }
    }
}
