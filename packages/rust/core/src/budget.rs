//! Concurrency budgets.
//!
//! A budget is a named semaphore handed to whichever component enforces it.
//! Cloning shares the same permits, which is how the document budget is
//! shared across every in-flight item.

use std::sync::Arc;

use discusskit_shared::{DiscusskitError, Result};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Clone)]
pub struct ConcurrencyBudget {
    name: &'static str,
    size: usize,
    semaphore: Arc<Semaphore>,
}

impl ConcurrencyBudget {
    /// A budget of `size` permits (at least one).
    pub fn new(name: &'static str, size: usize) -> Self {
        let size = size.max(1);
        Self {
            name,
            size,
            semaphore: Arc::new(Semaphore::new(size)),
        }
    }

    /// Wait for a free slot. The slot is released when the permit drops.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DiscusskitError::config(format!("{} budget closed", self.name)))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_permits() {
        let budget = ConcurrencyBudget::new("documents", 2);
        let shared = budget.clone();

        let first = budget.acquire().await.unwrap();
        let _second = shared.acquire().await.unwrap();
        assert_eq!(budget.available(), 0);

        drop(first);
        assert_eq!(shared.available(), 1);
    }

    #[test]
    fn zero_size_is_clamped() {
        let budget = ConcurrencyBudget::new("items", 0);
        assert_eq!(budget.size(), 1);
        assert_eq!(budget.available(), 1);
    }
}
