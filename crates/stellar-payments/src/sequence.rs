// ============================================================================
// STELLAR-PAYMENTS - Source Account Locks
// ============================================================================
// A transaction's sequence number is read from the account snapshot, so two
// submissions from the same source that overlap between load and submit
// would both claim `seq + 1`. Holding this lock across load → submit keeps
// them ordered within one process.
// ============================================================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<AsyncMutex<()>>>;

#[derive(Default)]
pub struct SourceLocks {
    locks: Arc<Mutex<LockMap>>,
}

/// Held while a transaction for the source account is in flight. The
/// account's entry is dropped from the map once nobody holds or awaits it.
pub struct SourceGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<Mutex<LockMap>>,
    source: String,
}

impl SourceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other transaction from `source` is in flight
    pub async fn acquire(&self, source: &str) -> SourceGuard {
        let lock = lock_map(&self.locks)
            .entry(source.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();

        SourceGuard {
            guard: Some(lock.lock_owned().await),
            locks: self.locks.clone(),
            source: source.to_string(),
        }
    }

    /// Number of source accounts currently holding or awaiting a lock
    #[cfg(test)]
    fn tracked(&self) -> usize {
        lock_map(&self.locks).len()
    }
}

impl Drop for SourceGuard {
    fn drop(&mut self) {
        // Release first so the map's reference is the only one left
        drop(self.guard.take());

        let mut locks = lock_map(&self.locks);
        if locks
            .get(&self.source)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.source);
        }
    }
}

fn lock_map(locks: &Mutex<LockMap>) -> MutexGuard<'_, LockMap> {
    match locks.lock() {
        Ok(locks) => locks,
        // The map holds no invariant a panicking holder could break
        Err(poisoned) => poisoned.into_inner(),
    }
}
