use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;

/// A snapshot cell with change notification.
///
/// Reads are synchronous and never wait on the network; every write bumps a
/// version counter that subscribers observe through a `watch` channel.
/// Guards must not be held across an `.await`.
#[derive(Debug)]
pub struct Shared<T> {
    value: Arc<RwLock<T>>,
    version: Arc<watch::Sender<u64>>,
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            version: Arc::clone(&self.version),
        }
    }
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            value: Arc::new(RwLock::new(value)),
            version: Arc::new(version),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        // A panic mid-write leaves plain data behind; keep serving it.
        self.value.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.value.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mutate in place and notify subscribers.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut guard = self.write();
            f(&mut guard)
        };
        self.version.send_modify(|version| *version += 1);
        result
    }

    pub fn replace(&self, value: T) -> T {
        self.update(|current| std::mem::replace(current, value))
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }
}

impl<T: Clone> Shared<T> {
    pub fn get(&self) -> T {
        self.read().clone()
    }
}
