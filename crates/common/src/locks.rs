//! Per-key async mutual exclusion.
//!
//! Used to serialize work that must not interleave for the same key within
//! one process, such as admissions into one group or posts into one chat room.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, OwnedMutexGuard};

/// A set of async mutexes addressed by string key.
///
/// Slots are created on demand and dropped once no guard or waiter holds them.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    slots: Arc<Mutex<HashMap<String, Weak<Mutex<()>>>>>,
}

impl KeyedLocks {
    /// Create an empty lock set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    ///
    /// The returned guard releases the key when dropped.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.retain(|_, slot| slot.strong_count() > 0);

            if let Some(slot) = slots.get(key).and_then(Weak::upgrade) {
                slot
            } else {
                let slot = Arc::new(Mutex::new(()));
                slots.insert(key.to_string(), Arc::downgrade(&slot));
                slot
            }
        };

        slot.lock_owned().await
    }

    /// Number of keys currently held or awaited.
    pub async fn active_keys(&self) -> usize {
        let slots = self.slots.lock().await;
        slots.values().filter(|slot| slot.strong_count() > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = KeyedLocks::new();
        let guard = locks.lock("group-1").await;

        let contender = locks.clone();
        let attempt = tokio::time::timeout(Duration::from_millis(50), async move {
            contender.lock("group-1").await
        })
        .await;
        assert!(attempt.is_err(), "second lock on the same key must wait");

        drop(guard);
        let reacquired =
            tokio::time::timeout(Duration::from_millis(50), locks.lock("group-1")).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock("group-1").await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.lock("group-2")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_released_keys_are_forgotten() {
        let locks = KeyedLocks::new();
        {
            let _guard = locks.lock("room").await;
            assert_eq!(locks.active_keys().await, 1);
        }
        assert_eq!(locks.active_keys().await, 0);
    }
}
