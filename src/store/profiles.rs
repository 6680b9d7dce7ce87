// src/store/profiles.rs — User and kid-profile access with staleness caching
//
// Documents live in the managed document database, reached over its REST
// surface. The only caching policy is a five-minute staleness check: a
// cached document younger than that is served as-is, anything older is
// refetched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::infra::clock::Clock;
use crate::infra::errors::{Result, StorymillError};
use crate::store::collections::Collections;

pub const STALE_AFTER_MS: i64 = 5 * 60 * 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KidProfile {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub age: Option<u8>,
    #[serde(default)]
    pub interests: Vec<String>,
}

#[derive(Debug, Clone)]
struct CachedDoc {
    fetched_ms: i64,
    value: Value,
}

/// Keyed document cache with a fixed staleness window. Kept separate from
/// the HTTP store so the policy is testable without a live database.
#[derive(Default)]
pub struct ProfileCache {
    docs: HashMap<(String, String), CachedDoc>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached document for (collection, id) if it was fetched
    /// less than [`STALE_AFTER_MS`] ago.
    pub fn get_fresh(&self, collection: &str, id: &str, now_ms: i64) -> Option<&Value> {
        let doc = self.docs.get(&(collection.to_string(), id.to_string()))?;
        if now_ms - doc.fetched_ms < STALE_AFTER_MS {
            Some(&doc.value)
        } else {
            None
        }
    }

    pub fn insert(&mut self, collection: &str, id: &str, value: Value, now_ms: i64) {
        self.docs.insert(
            (collection.to_string(), id.to_string()),
            CachedDoc {
                fetched_ms: now_ms,
                value,
            },
        );
    }

    pub fn invalidate(&mut self, collection: &str, id: &str) {
        self.docs
            .remove(&(collection.to_string(), id.to_string()));
    }
}

/// Typed facade over the document database for the two profile collections.
pub struct ProfileStore {
    client: reqwest::Client,
    base_url: String,
    collections: Collections,
    cache: Mutex<ProfileCache>,
    clock: Arc<dyn Clock>,
}

impl ProfileStore {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        collections: Collections,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            collections,
            cache: Mutex::new(ProfileCache::new()),
            clock,
        }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<UserProfile> {
        let collection = self.collections.users.clone();
        let value = self.fetch_document(&collection, user_id).await?;
        serde_json::from_value(value)
            .map_err(|e| StorymillError::Config(format!("malformed user document: {e}")))
    }

    pub async fn get_kid(&self, kid_id: &str) -> Result<KidProfile> {
        let collection = self.collections.kid_profiles.clone();
        let value = self.fetch_document(&collection, kid_id).await?;
        serde_json::from_value(value)
            .map_err(|e| StorymillError::Config(format!("malformed kid document: {e}")))
    }

    /// Drop a cached document so the next read refetches, e.g. after a
    /// profile edit.
    pub fn invalidate(&self, collection: &str, id: &str) {
        self.cache_guard().invalidate(collection, id);
    }

    async fn fetch_document(&self, collection: &str, id: &str) -> Result<Value> {
        let now = self.clock.now_ms();
        if let Some(value) = self.cache_guard().get_fresh(collection, id, now) {
            return Ok(value.clone());
        }

        let url = format!("{}/{}/{}", self.base_url, collection, id);
        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StorymillError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        let response = response.error_for_status()?;
        let value: Value = response.json().await?;

        let now = self.clock.now_ms();
        self.cache_guard().insert(collection, id, value.clone(), now);
        Ok(value)
    }

    fn cache_guard(&self) -> MutexGuard<'_, ProfileCache> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_document_is_served() {
        let mut cache = ProfileCache::new();
        cache.insert("users_development", "u1", json!({"id": "u1"}), 1_000);

        let hit = cache.get_fresh("users_development", "u1", 1_000 + STALE_AFTER_MS - 1);
        assert!(hit.is_some());
    }

    #[test]
    fn test_stale_document_is_refused() {
        let mut cache = ProfileCache::new();
        cache.insert("users_development", "u1", json!({"id": "u1"}), 1_000);

        assert!(cache
            .get_fresh("users_development", "u1", 1_000 + STALE_AFTER_MS)
            .is_none());
    }

    #[test]
    fn test_cache_keys_include_collection() {
        let mut cache = ProfileCache::new();
        cache.insert("users_development", "x", json!({"id": "x"}), 0);

        assert!(cache.get_fresh("kid_profiles_development", "x", 0).is_none());
        assert!(cache.get_fresh("users_development", "x", 0).is_some());
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let mut cache = ProfileCache::new();
        cache.insert("users_development", "u1", json!({"id": "u1"}), 0);
        cache.invalidate("users_development", "u1");
        assert!(cache.get_fresh("users_development", "u1", 0).is_none());
    }

    #[test]
    fn test_reinsert_refreshes_timestamp() {
        let mut cache = ProfileCache::new();
        cache.insert("users_development", "u1", json!({"v": 1}), 0);
        cache.insert("users_development", "u1", json!({"v": 2}), STALE_AFTER_MS);

        let hit = cache
            .get_fresh("users_development", "u1", STALE_AFTER_MS + 1)
            .unwrap();
        assert_eq!(hit["v"], 2);
    }
}
