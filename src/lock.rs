//! Per-key mutual exclusion.
//!
//! [`KeyedLocker`] serializes critical sections that must not interleave for
//! the same logical entity, for example two tasks racing to ensure the same
//! named volume exists. Unrelated keys never block each other.
//!
//! Each key maps to a lock entry holding a mutex and a live-holder count.
//! The entry is created on first acquisition and removed once the last
//! holder, including holders still waiting in line, has released it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;

use crate::context::{Context, ContextError};

/// Separator placed between key parts.
pub const KEY_SEPARATOR: &str = ":";

struct LockEntry {
    mutex: Arc<tokio::sync::Mutex<()>>,
    holders: usize,
}

/// Registry of reference-counted, key-scoped mutexes.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use storage_api::{Context, KeyedLocker};
///
/// # tokio_test::block_on(async {
/// let locker = Arc::new(KeyedLocker::new());
/// let ctx = Context::background();
///
/// let guard = locker.acquire(&ctx, &["volume", "db01"]).await.unwrap();
/// assert_eq!(guard.key(), "volume:db01");
/// assert_eq!(locker.len(), 1);
///
/// drop(guard);
/// assert!(locker.is_empty());
/// # });
/// ```
#[derive(Default)]
pub struct KeyedLocker {
    entries: Mutex<HashMap<String, LockEntry>>,
}

impl KeyedLocker {
    /// Creates an empty locker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins key parts into the registry key.
    #[must_use]
    pub fn key_for<S: AsRef<str>>(parts: &[S]) -> String {
        parts
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR)
    }

    /// Waits for exclusive ownership of the key built from `parts`.
    ///
    /// The returned guard releases the key when dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`ContextError`] if `ctx` ends before the lock is obtained.
    /// The holder count is released in that case as well.
    pub async fn acquire<S: AsRef<str>>(
        self: &Arc<Self>,
        ctx: &Context,
        parts: &[S],
    ) -> Result<KeyLock, ContextError> {
        let key = Self::key_for(parts);
        let mutex = self.enter(&key);

        // Registered as a holder before waiting: the entry must survive
        // while this task is in line for it.
        let mut lock = KeyLock {
            locker: Arc::clone(self),
            key,
            guard: None,
        };
        let guard = ctx
            .run(async move { Ok::<_, ContextError>(mutex.lock_owned().await) })
            .await?;
        lock.guard = Some(guard);
        Ok(lock)
    }

    /// Returns the number of live lock entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if no key is held or awaited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn enter(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut entries = self.entries.lock();
        let entry = entries.entry(key.to_string()).or_insert_with(|| LockEntry {
            mutex: Arc::new(tokio::sync::Mutex::new(())),
            holders: 0,
        });
        entry.holders += 1;
        Arc::clone(&entry.mutex)
    }

    fn leave(&self, key: &str) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(key) {
            entry.holders -= 1;
            if entry.holders == 0 {
                entries.remove(key);
            }
        }
    }
}

impl fmt::Debug for KeyedLocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedLocker")
            .field("entries", &self.len())
            .finish()
    }
}

/// Exclusive ownership of one key.
///
/// Dropping the guard unlocks the mutex first, then decrements the holder
/// count, removing the entry at zero.
#[must_use = "the key is released as soon as the guard is dropped"]
pub struct KeyLock {
    locker: Arc<KeyedLocker>,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyLock {
    /// Returns the registry key this guard holds.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyLock {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locker.leave(&self.key);
    }
}

impl fmt::Debug for KeyLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyLock")
            .field("key", &self.key)
            .field("held", &self.guard.is_some())
            .finish()
    }
}
