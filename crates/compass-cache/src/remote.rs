//! HTTP client for the durable key/value store.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use compass_core::{CacheConfig, Error, Result};

use crate::store::CacheStore;

/// Payload for storing a value.
#[derive(Debug, Serialize)]
struct SetRequest<'a> {
    /// Serialized value to store.
    value: &'a str,
    /// Lifetime of the entry in seconds.
    ttl_seconds: u64,
}

/// Response body of a successful read.
#[derive(Debug, Deserialize)]
struct GetResponse {
    /// The stored value.
    value: String,
}

/// Response body of a key listing.
#[derive(Debug, Deserialize)]
struct KeysResponse {
    /// Matching keys.
    keys: Vec<String>,
}

/// Client for the durable networked store.
///
/// All operations carry the configured connect and command timeouts so a
/// dead store degrades the caller quickly instead of hanging it.
pub struct RemoteStore {
    client: Client,
    base_url: String,
}

impl RemoteStore {
    /// Creates a client for the store at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, config: &CacheConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.command_timeout_ms))
            .build()
            .map_err(|error| Error::Store(format!("failed to build store client: {error}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn key_url(&self, key: &str) -> String {
        format!("{}/kv/{key}", self.base_url)
    }
}

#[async_trait]
impl CacheStore for RemoteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.key_url(key))
            .send()
            .await
            .map_err(|error| Error::Store(format!("get {key}: {error}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::Store(format!(
                "get {key}: unexpected status {}",
                response.status()
            )));
        }

        let body: GetResponse = response
            .json()
            .await
            .map_err(|error| Error::Store(format!("get {key}: malformed body: {error}")))?;
        Ok(Some(body.value))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let request = SetRequest {
            value: &value,
            ttl_seconds: ttl.as_secs(),
        };

        let response = self
            .client
            .put(self.key_url(key))
            .json(&request)
            .send()
            .await
            .map_err(|error| Error::Store(format!("set {key}: {error}")))?;

        if !response.status().is_success() {
            return Err(Error::Store(format!(
                "set {key}: unexpected status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.key_url(key))
            .send()
            .await
            .map_err(|error| Error::Store(format!("delete {key}: {error}")))?;

        // Deleting an absent key is fine.
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(Error::Store(format!(
                "delete {key}: unexpected status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/kv", self.base_url))
            .query(&[("pattern", pattern)])
            .send()
            .await
            .map_err(|error| Error::Store(format!("keys {pattern}: {error}")))?;

        if !response.status().is_success() {
            return Err(Error::Store(format!(
                "keys {pattern}: unexpected status {}",
                response.status()
            )));
        }

        let body: KeysResponse = response
            .json()
            .await
            .map_err(|error| Error::Store(format!("keys {pattern}: malformed body: {error}")))?;
        Ok(body.keys)
    }

    async fn ping(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|error| Error::Store(format!("ping: {error}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Store(format!(
                "ping: unexpected status {}",
                response.status()
            )))
        }
    }
}
