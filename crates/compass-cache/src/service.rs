//! Fallback-aware cache service with category helpers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use compass_core::{CacheConfig, Error, IgnorePoison as _};

use crate::keys::{cache_key, content_digest, CacheCategory};
use crate::local::LocalStore;
use crate::remote::RemoteStore;
use crate::store::CacheStore as _;

/// A cached report payload with the entities it was derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    /// The report content.
    pub payload: JsonValue,
    /// Entities whose change invalidates this report.
    pub dependencies: Vec<String>,
}

/// Dual-tier cache with silent degradation.
///
/// Reads and writes go to the durable store while it is reachable. The
/// first transport failure flips the service into local mode; a spawned,
/// interval-gated probe restores the durable tier in the background. The
/// caller never sees a transport error from `get`/`set`/`delete`.
#[derive(Clone)]
pub struct CacheService {
    remote: Option<Arc<RemoteStore>>,
    local: Arc<LocalStore>,
    degraded: Arc<AtomicBool>,
    next_probe: Arc<RwLock<Instant>>,
    config: CacheConfig,
}

impl CacheService {
    /// Creates a service from configuration.
    ///
    /// A missing or unusable remote URL yields a local-only service rather
    /// than an error; routing must keep working without the durable tier.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let remote = config.remote_url.as_deref().and_then(|url| {
            match RemoteStore::new(url, &config) {
                Ok(store) => Some(Arc::new(store)),
                Err(error) => {
                    tracing::warn!("durable store client unavailable, running local-only: {error}");
                    None
                }
            }
        });

        Self {
            remote,
            local: Arc::new(LocalStore::new(config.max_local_entries)),
            degraded: Arc::new(AtomicBool::new(false)),
            next_probe: Arc::new(RwLock::new(Instant::now())),
            config,
        }
    }

    /// Creates a service backed only by the in-process map.
    #[must_use]
    pub fn local_only() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Whether the service is currently running on the local tier despite a
    /// configured durable store.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Releases held state. The durable tier is untouched; the local map is
    /// dropped.
    pub fn close(&self) {
        self.local.clear();
        tracing::debug!("cache service closed");
    }

    fn active_remote(&self) -> Option<&Arc<RemoteStore>> {
        if self.degraded.load(Ordering::Relaxed) {
            None
        } else {
            self.remote.as_ref()
        }
    }

    fn degrade(&self, error: &Error) {
        if !self.degraded.swap(true, Ordering::Relaxed) {
            tracing::warn!("durable store unreachable, falling back to in-process cache: {error}");
        }
    }

    /// Schedules a background liveness probe of the durable store if one is
    /// due. Never blocks the calling operation.
    fn maybe_reprobe(&self) {
        let Some(remote) = self.remote.clone() else {
            return;
        };
        if !self.degraded.load(Ordering::Relaxed) {
            return;
        }

        {
            let mut next_probe = self.next_probe.write_ignore_poison();
            if Instant::now() < *next_probe {
                return;
            }
            *next_probe = Instant::now() + Duration::from_secs(self.config.reprobe_interval_secs);
        }

        let degraded = Arc::clone(&self.degraded);
        let attempts = self.config.probe_attempts.max(1);
        let delay = Duration::from_millis(self.config.probe_delay_ms);
        tokio::spawn(async move {
            for attempt in 1..=attempts {
                match remote.ping().await {
                    Ok(()) => {
                        degraded.store(false, Ordering::Relaxed);
                        tracing::info!("durable store reachable again, leaving local mode");
                        return;
                    }
                    Err(error) => {
                        tracing::debug!("store probe {attempt}/{attempts} failed: {error}");
                    }
                }
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        });
    }

    /// Fetches the value under `key`, absorbing transport failures.
    pub async fn safe_get(&self, key: &str) -> Option<String> {
        if let Some(remote) = self.active_remote() {
            match remote.get(key).await {
                Ok(value) => return value,
                Err(error) => self.degrade(&error),
            }
        }

        self.maybe_reprobe();
        self.local.get(key).await.unwrap_or_default()
    }

    /// Stores `value` under `key`, absorbing transport failures.
    pub async fn safe_set(&self, key: &str, value: String, ttl: Duration) {
        if let Some(remote) = self.active_remote() {
            match remote.set(key, value.clone(), ttl).await {
                Ok(()) => return,
                Err(error) => self.degrade(&error),
            }
        }

        self.maybe_reprobe();
        if let Err(error) = self.local.set(key, value, ttl).await {
            tracing::warn!("local cache write failed for {key}: {error}");
        }
    }

    /// Deletes the entry under `key`, absorbing transport failures.
    pub async fn safe_delete(&self, key: &str) {
        if let Some(remote) = self.active_remote() {
            match remote.delete(key).await {
                Ok(()) => return,
                Err(error) => self.degrade(&error),
            }
        }

        self.maybe_reprobe();
        self.local.delete(key).await.ok();
    }

    /// Lists keys matching `pattern` on the active tier.
    pub async fn safe_keys(&self, pattern: &str) -> Vec<String> {
        if let Some(remote) = self.active_remote() {
            match remote.keys_matching(pattern).await {
                Ok(keys) => return keys,
                Err(error) => self.degrade(&error),
            }
        }

        self.maybe_reprobe();
        self.local.keys_matching(pattern).await.unwrap_or_default()
    }

    /// Fetches and deserializes a JSON value.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.safe_get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!("discarding malformed cache entry {key}: {error}");
                None
            }
        }
    }

    /// Serializes and stores a JSON value.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(raw) => self.safe_set(key, raw, ttl).await,
            Err(error) => tracing::warn!("refusing to cache unserializable value {key}: {error}"),
        }
    }

    // --- Category helpers ---------------------------------------------------

    /// Key under which a query result is cached.
    #[must_use]
    pub fn query_result_key(user_id: &str, query: &str, data_source: Option<&str>) -> String {
        let digest = content_digest(&[query, data_source.unwrap_or("")]);
        cache_key(CacheCategory::QueryResult, &[user_id, &digest])
    }

    /// Caches a query result for an hour.
    pub async fn cache_query_result<T: Serialize>(
        &self,
        user_id: &str,
        query: &str,
        data_source: Option<&str>,
        value: &T,
    ) {
        let key = Self::query_result_key(user_id, query, data_source);
        self.set_json(&key, value, CacheCategory::QueryResult.ttl())
            .await;
    }

    /// Fetches a previously cached query result.
    pub async fn get_query_result<T: DeserializeOwned>(
        &self,
        user_id: &str,
        query: &str,
        data_source: Option<&str>,
    ) -> Option<T> {
        let key = Self::query_result_key(user_id, query, data_source);
        self.get_json(&key).await
    }

    /// Caches the per-conversation context object.
    pub async fn cache_conversation_context(
        &self,
        user_id: &str,
        conversation_id: &str,
        context: &JsonValue,
    ) {
        let key = cache_key(
            CacheCategory::ConversationContext,
            &[user_id, conversation_id],
        );
        self.set_json(&key, context, CacheCategory::ConversationContext.ttl())
            .await;
    }

    /// Fetches the per-conversation context object.
    pub async fn get_conversation_context(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Option<JsonValue> {
        let key = cache_key(
            CacheCategory::ConversationContext,
            &[user_id, conversation_id],
        );
        self.get_json(&key).await
    }

    /// Merges `updates` into the stored conversation context, creating the
    /// object if absent. Returns the merged context.
    pub async fn update_conversation_context(
        &self,
        user_id: &str,
        conversation_id: &str,
        updates: JsonMap<String, JsonValue>,
    ) -> JsonValue {
        let mut context = self
            .get_conversation_context(user_id, conversation_id)
            .await
            .unwrap_or_else(|| JsonValue::Object(JsonMap::new()));

        if let JsonValue::Object(ref mut fields) = context {
            for (field, value) in updates {
                fields.insert(field, value);
            }
        }

        self.cache_conversation_context(user_id, conversation_id, &context)
            .await;
        context
    }

    /// Caches greeting text for a user and daypart.
    pub async fn cache_greeting(&self, user_id: &str, daypart: &str, text: &str) {
        let key = cache_key(CacheCategory::Greeting, &[user_id, daypart]);
        self.safe_set(&key, text.to_owned(), CacheCategory::Greeting.ttl())
            .await;
    }

    /// Fetches cached greeting text.
    pub async fn get_greeting(&self, user_id: &str, daypart: &str) -> Option<String> {
        let key = cache_key(CacheCategory::Greeting, &[user_id, daypart]);
        self.safe_get(&key).await
    }

    /// Caches a generated report with the entities it depends on.
    pub async fn cache_report(
        &self,
        report_id: &str,
        payload: JsonValue,
        dependencies: Vec<String>,
    ) {
        let key = cache_key(CacheCategory::Report, &[report_id]);
        let entry = ReportEntry {
            payload,
            dependencies,
        };
        self.set_json(&key, &entry, CacheCategory::Report.ttl())
            .await;
    }

    /// Fetches a cached report.
    pub async fn get_report(&self, report_id: &str) -> Option<ReportEntry> {
        let key = cache_key(CacheCategory::Report, &[report_id]);
        self.get_json(&key).await
    }

    /// Deletes every cached report that depends on `changed_entity`.
    /// Returns the number of invalidated reports.
    pub async fn invalidate_report_cache(&self, changed_entity: &str) -> usize {
        let pattern = format!("{}:*", CacheCategory::Report.prefix());
        let keys = self.safe_keys(&pattern).await;

        let mut invalidated = 0;
        for key in keys {
            let Some(entry) = self.get_json::<ReportEntry>(&key).await else {
                continue;
            };
            if entry
                .dependencies
                .iter()
                .any(|dependency| dependency == changed_entity)
            {
                self.safe_delete(&key).await;
                invalidated += 1;
            }
        }

        if invalidated > 0 {
            tracing::info!("invalidated {invalidated} report(s) depending on {changed_entity}");
        }
        invalidated
    }

    /// Caches an embedding vector keyed by its input text.
    pub async fn cache_embedding(&self, text: &str, vector: &[f32]) {
        let key = cache_key(CacheCategory::Embedding, &[&content_digest(&[text])]);
        self.set_json(&key, &vector, CacheCategory::Embedding.ttl())
            .await;
    }

    /// Fetches a cached embedding vector.
    pub async fn get_embedding(&self, text: &str) -> Option<Vec<f32>> {
        let key = cache_key(CacheCategory::Embedding, &[&content_digest(&[text])]);
        self.get_json(&key).await
    }

    /// Caches a chart configuration payload.
    pub async fn cache_chart_config(&self, user_id: &str, chart_id: &str, config: &JsonValue) {
        let key = cache_key(CacheCategory::ChartConfig, &[user_id, chart_id]);
        self.set_json(&key, config, CacheCategory::ChartConfig.ttl())
            .await;
    }

    /// Fetches a cached chart configuration.
    pub async fn get_chart_config(&self, user_id: &str, chart_id: &str) -> Option<JsonValue> {
        let key = cache_key(CacheCategory::ChartConfig, &[user_id, chart_id]);
        self.get_json(&key).await
    }

    /// Key under which a routing decision is cached.
    #[must_use]
    pub fn route_key(user_id: &str, role: &str, query: &str) -> String {
        let digest = content_digest(&[query, role]);
        cache_key(CacheCategory::Route, &[user_id, &digest])
    }

    /// Caches a routing decision.
    pub async fn cache_route<T: Serialize>(&self, user_id: &str, role: &str, query: &str, decision: &T) {
        let key = Self::route_key(user_id, role, query);
        self.set_json(&key, decision, CacheCategory::Route.ttl())
            .await;
    }

    /// Fetches a cached routing decision.
    pub async fn get_route<T: DeserializeOwned>(
        &self,
        user_id: &str,
        role: &str,
        query: &str,
    ) -> Option<T> {
        let key = Self::route_key(user_id, role, query);
        self.get_json(&key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn degraded_config() -> CacheConfig {
        CacheConfig {
            remote_url: Some("http://127.0.0.1:9".to_owned()),
            connect_timeout_ms: 50,
            command_timeout_ms: 100,
            // keep the probe quiet during tests
            reprobe_interval_secs: 3_600,
            ..CacheConfig::default()
        }
    }

    #[tokio::test]
    async fn test_set_then_get_round_trip() {
        let cache = CacheService::local_only();
        cache
            .safe_set("k", "v".to_owned(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.safe_get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let cache = CacheService::local_only();
        cache.safe_set("k", "v".to_owned(), Duration::ZERO).await;
        assert_eq!(cache.safe_get("k").await, None);
    }

    #[tokio::test]
    async fn test_unreachable_remote_degrades_silently() {
        let cache = CacheService::new(degraded_config());
        assert!(!cache.is_degraded());

        cache
            .safe_set("k", "v".to_owned(), Duration::from_secs(60))
            .await;
        assert!(cache.is_degraded());

        // Identical behavior from the caller's perspective.
        assert_eq!(cache.safe_get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_query_result_round_trip() {
        let cache = CacheService::local_only();
        let rows = vec!["acme".to_owned(), "globex".to_owned()];

        cache
            .cache_query_result("u1", "top suppliers", Some("sales_db"), &rows)
            .await;

        let cached: Option<Vec<String>> = cache
            .get_query_result("u1", "Top   Suppliers", Some("sales_db"))
            .await;
        assert_eq!(cached, Some(rows));

        // Different data source, different entry.
        let other: Option<Vec<String>> = cache
            .get_query_result("u1", "top suppliers", Some("finance_db"))
            .await;
        assert_eq!(other, None);
    }

    #[tokio::test]
    async fn test_conversation_context_merge() {
        let cache = CacheService::local_only();
        let mut first = JsonMap::new();
        first.insert("focus".to_owned(), json!("suppliers"));
        cache.update_conversation_context("u1", "c1", first).await;

        let mut second = JsonMap::new();
        second.insert("depth".to_owned(), json!("detailed"));
        let merged = cache.update_conversation_context("u1", "c1", second).await;

        assert_eq!(merged["focus"], json!("suppliers"));
        assert_eq!(merged["depth"], json!("detailed"));
    }

    #[tokio::test]
    async fn test_report_dependency_invalidation() {
        let cache = CacheService::local_only();
        cache
            .cache_report(
                "q3-spend",
                json!({"total": 1_250_000}),
                vec!["financial_data".to_owned()],
            )
            .await;

        let untouched = cache.invalidate_report_cache("unrelated_table").await;
        assert_eq!(untouched, 0);
        assert!(cache.get_report("q3-spend").await.is_some());

        let invalidated = cache.invalidate_report_cache("financial_data").await;
        assert_eq!(invalidated, 1);
        assert!(cache.get_report("q3-spend").await.is_none());
    }

    #[tokio::test]
    async fn test_embedding_round_trip() {
        let cache = CacheService::local_only();
        cache.cache_embedding("supplier spend", &[0.25, -0.5]).await;

        let vector = cache.get_embedding("Supplier  Spend").await;
        assert_eq!(vector, Some(vec![0.25, -0.5]));
    }

    #[tokio::test]
    async fn test_route_keyed_by_user_role_and_query() {
        let cache = CacheService::local_only();
        cache
            .cache_route("u1", "analyst", "show variance", &"decision-a".to_owned())
            .await;

        let hit: Option<String> = cache.get_route("u1", "analyst", "show variance").await;
        assert_eq!(hit.as_deref(), Some("decision-a"));

        let other_role: Option<String> = cache.get_route("u1", "executive", "show variance").await;
        assert_eq!(other_role, None);
    }
}
