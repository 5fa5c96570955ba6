//! Observer hub through which the host announces registered mods.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::models::ModuleDescriptor;

pub type Listener = Arc<dyn Fn(&ModuleDescriptor) + Send + Sync>;

/// Handle returned by [`RegistrationEvents::subscribe`]
#[derive(Debug, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
}

#[derive(Default)]
pub struct RegistrationEvents {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(u64, Listener)>>,
}

impl RegistrationEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Listener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.write().push((id, listener));
        Subscription { id }
    }

    /// Returns `false` if the subscription was already removed
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != subscription.id);
        listeners.len() != before
    }

    /// Deliver `module` to every listener on the calling thread.
    ///
    /// Listeners run outside the lock so they may subscribe or unsubscribe.
    pub fn publish(&self, module: &ModuleDescriptor) {
        let snapshot: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in snapshot {
            listener(module);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}
