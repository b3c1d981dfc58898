//! Cache store contract and an in-memory implementation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CacheStoreError;

use super::policy::CachePolicy;

/// Whether a stored entry is still within its TTL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    Valid,
    Expired,
}

/// A raw response as persisted, with its capture time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResponse {
    pub payload: Vec<Value>,
    pub captured_at: DateTime<Utc>,
}

impl StoredResponse {
    pub fn new(payload: Vec<Value>) -> Self {
        Self {
            payload,
            captured_at: Utc::now(),
        }
    }

    /// Age of the entry at `now`. Entries from the future count as fresh.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.captured_at).to_std().unwrap_or(Duration::ZERO)
    }
}

/// An entry returned by a store lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedEntry {
    pub payload: Vec<Value>,
    pub captured_at: DateTime<Utc>,
    pub validity: Validity,
}

impl CachedEntry {
    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }
}

/// Key/response store with TTL-based expiry.
///
/// The store owns the TTL decision: `get` reports whether an entry is still
/// valid under the policy last passed to `configure`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Apply a new policy. Called once per configuration change.
    async fn configure(&self, policy: &CachePolicy) -> Result<(), CacheStoreError>;

    /// Look up an entry. `Ok(None)` means absent.
    async fn get(&self, key: &str) -> Result<Option<CachedEntry>, CacheStoreError>;

    /// Store an entry under `key`, replacing any previous one.
    async fn put(&self, key: &str, response: StoredResponse) -> Result<(), CacheStoreError>;
}

/// Non-persistent store keeping entries in a map, one namespace per cache name.
#[derive(Default)]
pub struct MemoryCacheStore {
    policy: Mutex<CachePolicy>,
    namespaces: Mutex<HashMap<String, HashMap<String, StoredResponse>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_policy(&self) -> CachePolicy {
        Self::lock(&self.policy).clone()
    }

    /// Insert an entry directly into the current namespace.
    pub fn insert(&self, key: impl Into<String>, response: StoredResponse) {
        let name = self.current_policy().name;
        Self::lock(&self.namespaces)
            .entry(name)
            .or_default()
            .insert(key.into(), response);
    }

    /// Number of entries in the current namespace.
    pub fn len(&self) -> usize {
        let name = self.current_policy().name;
        Self::lock(&self.namespaces)
            .get(&name)
            .map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn configure(&self, policy: &CachePolicy) -> Result<(), CacheStoreError> {
        debug!(
            "Cache '{}' configured: ttl={:?}, expiry={:?}",
            policy.name, policy.ttl, policy.expiry
        );
        *Self::lock(&self.policy) = policy.clone();
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<CachedEntry>, CacheStoreError> {
        let policy = self.current_policy();
        let now = Utc::now();
        let mut namespaces = Self::lock(&self.namespaces);
        let Some(entries) = namespaces.get_mut(&policy.name) else {
            return Ok(None);
        };

        let Some(stored) = entries.get(key) else {
            return Ok(None);
        };

        let age = stored.age(now);
        if age >= policy.expiry {
            debug!("Evicting cache entry '{}' (age {:?})", key, age);
            entries.remove(key);
            return Ok(None);
        }

        Ok(Some(CachedEntry {
            payload: stored.payload.clone(),
            captured_at: stored.captured_at,
            validity: if age < policy.ttl {
                Validity::Valid
            } else {
                Validity::Expired
            },
        }))
    }

    async fn put(&self, key: &str, response: StoredResponse) -> Result<(), CacheStoreError> {
        self.insert(key, response);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backdated(secs: i64) -> StoredResponse {
        StoredResponse {
            payload: vec![json!({ "status": "ok" })],
            captured_at: Utc::now() - chrono::Duration::seconds(secs),
        }
    }

    #[tokio::test]
    async fn test_missing_entry_is_absent() {
        let store = MemoryCacheStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fresh_entry_is_valid() {
        let store = MemoryCacheStore::new();
        store
            .put("k", StoredResponse::new(vec![json!(1)]))
            .await
            .unwrap();

        let entry = store.get("k").await.unwrap().unwrap();
        assert!(entry.is_valid());
        assert_eq!(entry.payload, vec![json!(1)]);
    }

    #[tokio::test]
    async fn test_entry_past_ttl_is_expired() {
        let store = MemoryCacheStore::new();
        store
            .configure(&CachePolicy {
                name: "feed".to_string(),
                ttl: Duration::from_secs(55),
                expiry: Duration::from_secs(3600),
            })
            .await
            .unwrap();
        store.insert("k", backdated(60));

        let entry = store.get("k").await.unwrap().unwrap();
        assert_eq!(entry.validity, Validity::Expired);
    }

    #[tokio::test]
    async fn test_entry_past_expiry_is_evicted() {
        let store = MemoryCacheStore::new();
        store
            .configure(&CachePolicy {
                name: "feed".to_string(),
                ttl: Duration::from_secs(55),
                expiry: Duration::from_secs(120),
            })
            .await
            .unwrap();
        store.insert("k", backdated(600));

        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_namespaces_are_separate() {
        let store = MemoryCacheStore::new();
        store.insert("k", backdated(0));
        assert_eq!(store.len(), 1);

        store
            .configure(&CachePolicy {
                name: "other".to_string(),
                ..CachePolicy::default()
            })
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
