use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Scoped key/value cache for in-progress, unvalidated survey drafts, so a
/// reload does not lose a half-written form. Entirely optional to the
/// submission pipeline; a lost draft costs nothing but retyping.
#[derive(Default)]
pub struct DraftCache {
    drafts: RwLock<HashMap<String, Value>>,
}

impl DraftCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn save(&self, key: &str, value: Value) {
        self.drafts.write().await.insert(key.to_string(), value);
    }

    pub async fn load(&self, key: &str) -> Option<Value> {
        self.drafts.read().await.get(key).cloned()
    }

    pub async fn clear(&self, key: &str) {
        self.drafts.write().await.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn save_load_clear_cycle() {
        let cache = DraftCache::new();
        assert_eq!(cache.load("d1").await, None);

        cache.save("d1", json!({ "pulse": { "balance_energy": "3" } })).await;
        let draft = cache.load("d1").await.unwrap();
        assert_eq!(draft["pulse"]["balance_energy"], "3");

        cache.save("d1", json!({ "pulse": {} })).await;
        assert_eq!(cache.load("d1").await.unwrap()["pulse"], json!({}));

        cache.clear("d1").await;
        assert_eq!(cache.load("d1").await, None);
    }
}
