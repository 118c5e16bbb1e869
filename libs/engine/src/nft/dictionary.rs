use std::collections::HashSet;

use tokio::sync::Mutex;

/// In-flight resolution keys (`"{token_id}-{address}"`). Admission into
/// the set is what guarantees a token is resolved by at most one task
/// at a time.
pub struct MetadataDictionary {
    items: Mutex<HashSet<String>>,
}

impl MetadataDictionary {
    pub fn new() -> Self {
        Self { items: Mutex::new(HashSet::new()) }
    }

    /// Returns `true` only for the first caller to claim the key.
    pub async fn try_add(&self, key: &str) -> bool {
        self.items.lock().await.insert(key.to_owned())
    }

    pub async fn try_remove(&self, key: &str) -> bool {
        self.items.lock().await.remove(key)
    }

    pub async fn try_remove_range(&self, keys: &[String]) {
        let mut items = self.items.lock().await;
        for key in keys {
            items.remove(key);
        }
    }
}

impl Default for MetadataDictionary {
    fn default() -> Self {
        Self::new()
    }
}
