use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::cart::CartId;

type LockTable = Arc<Mutex<HashMap<CartId, Arc<AsyncMutex<()>>>>>;

/// Per-cart async locks shared by the cart manager and the checkout engine.
///
/// An entry lives only while some task holds or waits on it.
#[derive(Clone, Default)]
pub struct CartLocks {
    inner: LockTable,
}

/// Held for the duration of a cart mutation.
pub struct CartLockGuard {
    cart_id: CartId,
    guard: Option<OwnedMutexGuard<()>>,
    table: LockTable,
}

impl CartLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, cart_id: CartId) -> CartLockGuard {
        let lock = {
            let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(cart_id).or_default())
        };
        let guard = lock.lock_owned().await;
        CartLockGuard { cart_id, guard: Some(guard), table: Arc::clone(&self.inner) }
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Drop for CartLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        // Waiters hold their own clone, so a count of one means only the table is left.
        let mut locks = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(&self.cart_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.cart_id);
        }
    }
}
