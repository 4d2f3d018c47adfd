use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

use super::{RecordStore, Snapshot, StoreError, Subscription};

/// In-process `RecordStore` with the same observable contract as the managed
/// provider: opaque ids on write, full-snapshot fanout on every change.
/// Serves the binary in self-contained deployments and every test.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

struct Collection {
    records: BTreeMap<String, Value>,
    tx: watch::Sender<Snapshot>,
}

impl Collection {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(BTreeMap::new()));
        Collection {
            records: BTreeMap::new(),
            tx,
        }
    }

    fn publish(&self) {
        // send_replace keeps publishing even when no subscriber is live yet.
        self.tx.send_replace(Arc::new(self.records.clone()));
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn write(&self, collection: &str, record: Value) -> Result<String, StoreError> {
        if !record.is_object() {
            return Err(StoreError::Write("record must be a JSON object".to_string()));
        }
        let mut collections = self.collections.write().await;
        let entry = collections
            .entry(collection.to_string())
            .or_insert_with(Collection::new);
        let id = Uuid::new_v4().simple().to_string();
        entry.records.insert(id.clone(), record);
        entry.publish();
        Ok(id)
    }

    async fn subscribe(&self, collection: &str) -> Subscription {
        let mut collections = self.collections.write().await;
        let entry = collections
            .entry(collection.to_string())
            .or_insert_with(Collection::new);
        Subscription::new(entry.tx.subscribe())
    }
}
