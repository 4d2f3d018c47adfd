pub mod drafts;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

pub use drafts::DraftCache;
pub use memory::MemoryStore;

/// Collection every survey and recommendation submission lands in.
pub const SUBMISSIONS_COLLECTION: &str = "submissions";

/// Complete current contents of one collection, keyed by store-assigned id.
/// Subscriptions always deliver the full set, never deltas.
pub type Snapshot = Arc<BTreeMap<String, Value>>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store write failed: {0}")]
    Write(String),
    #[error("store subscription lost: {0}")]
    Subscription(String),
}

/// Boundary to the managed realtime database. Writes assign an opaque id;
/// reads arrive as full-snapshot callbacks. Authentication, retry, and
/// durability are the provider's concern, not this crate's.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist one record and return the id the store assigned to it.
    async fn write(&self, collection: &str, record: Value) -> Result<String, StoreError>;

    /// Open a full-snapshot subscription on a collection. The handle owns
    /// the registration; dropping it unsubscribes.
    async fn subscribe(&self, collection: &str) -> Subscription;
}

/// Handle to one live subscription. The current snapshot is always
/// available; `changed` resolves whenever the store publishes a new one.
pub struct Subscription {
    rx: watch::Receiver<Snapshot>,
}

impl Subscription {
    pub(crate) fn new(rx: watch::Receiver<Snapshot>) -> Self {
        Subscription { rx }
    }

    pub fn current(&self) -> Snapshot {
        self.rx.borrow().clone()
    }

    /// Wait for the next snapshot. Errors when the store side is gone.
    pub async fn changed(&mut self) -> Result<(), StoreError> {
        self.rx
            .changed()
            .await
            .map_err(|_| StoreError::Subscription("publisher dropped".to_string()))
    }
}
