use axum::async_trait;
use dashmap::DashMap;

use super::{CacheError, CacheStore};

/// In-process store used when no Redis URL is configured. Not shared between
/// instances.
#[derive(Default)]
pub struct LocalStore {
    map: DashMap<String, String>,
}

impl LocalStore {
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }
}

#[async_trait]
impl CacheStore for LocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.map.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.map.insert(key.to_string(), value);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.map.remove(key);
        Ok(())
    }
}
