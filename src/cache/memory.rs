//! In-process cache

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{decode_value, encode_value, Cache, CacheError, CacheValue};

/// Map-backed cache, lost when the process exits
///
/// Values go through the same text encoding as the persistent backends so
/// behaviour matches them exactly.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> CacheError {
    CacheError::Backend("in-memory cache lock poisoned".to_string())
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        let entries = self.entries.lock().map_err(poisoned)?;
        Ok(entries.get(key).cloned().map(decode_value))
    }

    async fn set(&self, key: &str, value: &CacheValue) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.insert(key.to_string(), encode_value(value));
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.lock().map_err(poisoned)?.clear();
        Ok(())
    }
}
