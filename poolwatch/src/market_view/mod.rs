pub mod types;

use std::sync::Arc;

use tokio::sync::RwLock;

pub use crate::market_view::types::PoolView;

/// In-memory holder of the latest [`PoolView`] of one pool.
///
/// Owned by a single service instance; clones share the same snapshot.
#[derive(Clone)]
pub struct PoolViewStore {
    inner: Arc<RwLock<PoolView>>,
}

impl PoolViewStore {
    pub fn new(initial: PoolView) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Copy of the current snapshot.
    pub async fn get(&self) -> PoolView {
        self.inner.read().await.clone()
    }

    /// Applies `f` under one write lock.
    /// Last write wins; concurrent publishers are serialized, not merged.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut PoolView),
    {
        let mut g = self.inner.write().await;
        f(&mut g);
    }
}
