//! Memoized, single-flight initialization for shared resources.
//!
//! [`InitGuard`] replaces ambient lazily-initialized module state. The
//! owner holds the guard explicitly; the first caller of
//! [`InitGuard::get_or_try_init`] runs the initializer, concurrent
//! callers wait for that same run, and later callers get the cached
//! value. A failed initialization is not cached, so the next caller
//! retries.

use std::future::Future;

use tokio::sync::OnceCell;

/// Holds a cheaply-cloneable resource (typically an `Arc`).
pub struct InitGuard<T> {
    cell: OnceCell<T>,
}

impl<T: Clone> InitGuard<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// A guard that is already initialized with `value`.
    pub fn ready(value: T) -> Self {
        Self {
            cell: OnceCell::new_with(Some(value)),
        }
    }

    /// Return the initialized value, running `init` if nobody has yet.
    pub async fn get_or_try_init<E, F, Fut>(&self, init: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.cell.get_or_try_init(init).await.cloned()
    }

    /// The value, if initialization has already succeeded.
    pub fn get(&self) -> Option<T> {
        self.cell.get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}

impl<T: Clone> Default for InitGuard<T> {
    fn default() -> Self {
        Self::new()
    }
}
