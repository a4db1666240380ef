use std::sync::Arc;

use tokio::sync::watch;

/// Cached query families that mutations can invalidate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Members,
    Cards,
    CardStats,
}

impl QueryKey {
    const ALL: [QueryKey; 3] = [QueryKey::Members, QueryKey::Cards, QueryKey::CardStats];

    fn index(self) -> usize {
        match self {
            QueryKey::Members => 0,
            QueryKey::Cards => 1,
            QueryKey::CardStats => 2,
        }
    }
}

/// Invalidation epochs, one per [`QueryKey`]
///
/// A query remembers the epoch its data was loaded under and refetches from scratch once the
/// epoch moves on. Clones share the same epochs.
#[derive(Clone, Debug)]
pub struct QueryCache {
    epochs: Arc<[watch::Sender<u64>; 3]>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            epochs: Arc::new(QueryKey::ALL.map(|_| watch::channel(0).0)),
        }
    }

    pub fn invalidate(&self, key: QueryKey) {
        self.epochs[key.index()].send_modify(|epoch| *epoch += 1);
        tracing::debug!(?key, "query invalidated");
    }

    pub fn epoch(&self, key: QueryKey) -> u64 {
        *self.epochs[key.index()].borrow()
    }

    /// Receiver notified on every invalidation of `key`
    pub fn subscribe(&self, key: QueryKey) -> watch::Receiver<u64> {
        self.epochs[key.index()].subscribe()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}
