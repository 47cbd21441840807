use std::rc::Weak;

use crate::registry::RegistryInner;

/// Handle to an installed signal handler.
#[derive(Clone)]
pub struct SignalListener {
    pub(crate) registry: Weak<RegistryInner>,
    pub(crate) signum: i32,
}

impl SignalListener {
    pub fn signum(&self) -> i32 {
        self.signum
    }

    pub fn pending(&self) -> bool {
        self.registry
            .upgrade()
            .map(|r| r.has_signal(self.signum))
            .unwrap_or(false)
    }

    /// Restores whatever handler was installed before this one (spec 4.4).
    pub fn delete(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove_signal(self.signum);
        }
    }
}
