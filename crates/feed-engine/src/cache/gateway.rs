use std::sync::Arc;

use log::{debug, warn};
use serde_json::Value;

use crate::errors::FeedError;
use crate::models::FetchOutcome;
use crate::request::RequestKey;

use super::policy::CachePolicy;
use super::store::{CacheStore, CachedEntry, StoredResponse};

/// Facade over the external [`CacheStore`].
///
/// Store failures never escape: lookups degrade to absent and writes are
/// dropped with a warning.
pub struct CacheGateway {
    store: Arc<dyn CacheStore>,
    policy: CachePolicy,
}

impl CacheGateway {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            policy: CachePolicy::default(),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Apply a new TTL policy to the store.
    pub async fn configure(&mut self, policy: CachePolicy) {
        if let Err(e) = self.store.configure(&policy).await {
            warn!("Failed to configure cache '{}': {}", policy.name, e);
        }
        self.policy = policy;
    }

    /// Resolve a key to a stored response, or `None` when absent or unreadable.
    pub async fn try_get(&self, key: &RequestKey) -> Option<CachedEntry> {
        match self.store.get(key.as_str()).await {
            Ok(Some(entry)) => {
                debug!("Cache {:?} entry for {}", entry.validity, key);
                Some(entry)
            }
            Ok(None) => {
                debug!("Cache miss for {}", key);
                None
            }
            Err(e) => {
                let error = FeedError::from(e);
                warn!("Cache lookup for {} failed, treating as absent: {}", key, error);
                None
            }
        }
    }

    /// Persist a live response.
    ///
    /// Only outcomes that came from the service are written; anything already
    /// derived from cache is skipped. Returns whether the entry was stored.
    pub async fn put(&self, key: &RequestKey, payload: Vec<Value>, outcome: &FetchOutcome) -> bool {
        if !outcome.is_cacheable() {
            debug!("Not caching non-live outcome for {}", key);
            return false;
        }

        match self
            .store
            .put(key.as_str(), StoredResponse::new(payload))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to cache response for {}: {}", key, e);
                false
            }
        }
    }
}
