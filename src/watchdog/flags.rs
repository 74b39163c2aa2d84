//! Read-only authentication flag sources.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A synchronous view of whether some part of the system considers the user
/// authenticated. The watchdog only reads these; owners mutate them.
pub trait AuthFlagSource: Send + Sync {
    fn is_authenticated(&self) -> bool;
}

/// Cheaply cloneable boolean shared between a flag owner and its readers.
#[derive(Clone, Debug, Default)]
pub struct SharedFlag(Arc<AtomicBool>);

impl SharedFlag {
    #[must_use]
    pub fn new(value: bool) -> Self {
        Self(Arc::new(AtomicBool::new(value)))
    }

    pub fn set(&self, value: bool) {
        self.0.store(value, Ordering::SeqCst);
    }

    #[must_use]
    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl AuthFlagSource for SharedFlag {
    fn is_authenticated(&self) -> bool {
        self.get()
    }
}

impl<T: AuthFlagSource + ?Sized> AuthFlagSource for Arc<T> {
    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }
}
