//! Caching proxy around a [`Searchable`]
//!
//! Results are stored under the request's canonical search URL, so a given
//! request reaches the network at most once until the cache is cleared or
//! the proxy is told to overwrite.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{SearchError, SearchRequest, SearchResult, Searchable};
use crate::cache::Cache;

/// Serves searches from a [`Cache`], delegating misses to the wrapped service
pub struct CachedStackExchange<S> {
    service: S,
    cache: Arc<dyn Cache>,
    overwrite: bool,
}

impl<S: Searchable> CachedStackExchange<S> {
    pub fn new(service: S, cache: Arc<dyn Cache>) -> Self {
        Self {
            service,
            cache,
            overwrite: false,
        }
    }

    /// Skip cache reads and always refresh the stored value
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Looks up `key`, treating every failure as a miss
    async fn read_cached(&self, key: &str) -> Option<Vec<SearchResult>> {
        let value = match self.cache.get(key).await {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "cache read failed; searching live");
                return None;
            }
        };

        match decode_results(&value) {
            Ok(results) => Some(results),
            Err(e) => {
                warn!(error = %e, key, "cached value is not a result list; searching live");
                None
            }
        }
    }
}

fn decode_results(value: &Value) -> Result<Vec<SearchResult>, SearchError> {
    let items = value.as_array().ok_or_else(|| {
        SearchError::MalformedResponse("cached value is not a list".to_string())
    })?;
    items.iter().map(SearchResult::from_json).collect()
}

fn encode_results(results: &[SearchResult]) -> Value {
    Value::Array(results.iter().map(SearchResult::to_json).collect())
}

#[async_trait]
impl<S: Searchable> Searchable for CachedStackExchange<S> {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        let key = request.cache_key(self.service.base_url())?;

        if self.overwrite {
            debug!(key = %key, "overwrite set; bypassing cache read");
        } else if let Some(mut results) = self.read_cached(&key).await {
            info!(key = %key, "using cached results");
            results.truncate(request.num());
            return Ok(results);
        }

        let results = self.service.search(request).await?;

        if let Err(e) = self.cache.set(&key, &encode_results(&results)).await {
            warn!(error = %e, key = %key, "failed to cache search results");
        }

        Ok(results)
    }

    fn base_url(&self) -> &str {
        self.service.base_url()
    }
}
