//! Fetch orchestration for the three matter feeds.
//!
//! Mirrors the portal's loading path: each source is fetched behind the
//! cache, a failed source degrades to an empty record set (the merge
//! proceeds with whatever succeeded), and the merged normalized output is
//! itself cached, falling back to the memory tier when it is too large for
//! the persistent one. No error from this module reaches the caller; the worst
//! outcome is fewer or emptier matters.

use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::cache::CacheStore;
use crate::config::FeedConfig;
use crate::error::{CacheError, FeedError};
use crate::matters::merge::merge_matters_from_sources;
use crate::matters::normalize::NormalizedMatter;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Cache-key version for the normalized output. Bump when the normalized
/// shape changes so stale entries from older builds never deserialize.
const NORMALIZED_CACHE_VERSION: &str = "v5";

/// Client over the three matter feeds.
pub struct MatterFeeds {
    client: reqwest::Client,
    config: FeedConfig,
}

/// A feed body is either a bare JSON array or a `{ "matters": [...] }`
/// wrapper; anything else is treated as an empty feed.
fn extract_records(source_name: &'static str, body: Value) -> Vec<Value> {
    match body {
        Value::Array(records) => records,
        Value::Object(mut object) => match object.remove("matters") {
            Some(Value::Array(records)) => records,
            _ => {
                warn!(source = source_name, "unexpected feed response shape");
                Vec::new()
            }
        },
        _ => {
            warn!(source = source_name, "unexpected feed response shape");
            Vec::new()
        }
    }
}

fn with_code(mut url: Url, code: &str) -> Url {
    url.query_pairs_mut().append_pair("code", code);
    url
}

impl MatterFeeds {
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| FeedError::Request {
                source_name: "client",
                source: err,
            })?;
        Ok(Self { client, config })
    }

    fn proxy_url(&self, source_name: &'static str, path: &str, code: &str) -> Result<Url, FeedError> {
        let url = self
            .config
            .proxy_base_url
            .join(path)
            .map_err(|err| FeedError::Url {
                source_name,
                reason: err.to_string(),
            })?;
        Ok(with_code(url, code))
    }

    async fn fetch_json(&self, source_name: &'static str, request: reqwest::RequestBuilder) -> Result<Vec<Value>, FeedError> {
        let response = request.send().await.map_err(|err| FeedError::Request {
            source_name,
            source: err,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                source_name,
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await.map_err(|err| FeedError::Decode {
            source_name,
            reason: err.to_string(),
        })?;
        Ok(extract_records(source_name, body))
    }

    /// Legacy "all matters" feed (lowest merge priority).
    async fn fetch_all_matters(&self) -> Result<Vec<Value>, FeedError> {
        let url = self.proxy_url(
            "legacy_all",
            &self.config.all_matters_path,
            &self.config.all_matters_code,
        )?;
        self.fetch_json("legacy_all", self.client.get(url)).await
    }

    /// Legacy per-user feed. POSTs the fee earner's full name, as the
    /// upstream function expects.
    async fn fetch_user_matters(&self, full_name: &str) -> Result<Vec<Value>, FeedError> {
        let url = self.proxy_url(
            "legacy_user",
            &self.config.user_matters_path,
            &self.config.user_matters_code,
        )?;
        let request = self
            .client
            .post(url)
            .json(&serde_json::json!({ "fullName": full_name }));
        self.fetch_json("legacy_user", request).await
    }

    /// VNet-direct feed (highest merge priority), snake_case records.
    async fn fetch_vnet_matters(&self, full_name: &str) -> Result<Vec<Value>, FeedError> {
        let mut url = with_code(
            self.config.vnet_matters_url.clone(),
            &self.config.vnet_matters_code,
        );
        url.query_pairs_mut().append_pair("fullName", full_name);
        self.fetch_json("vnet_direct", self.client.get(url)).await
    }

    /// Fetch one source behind the cache, degrading to an empty record set
    /// on failure.
    async fn source_records<F>(&self, cache: &CacheStore, cache_key: &str, fetch: F) -> Vec<Value>
    where
        F: std::future::Future<Output = Result<Vec<Value>, FeedError>>,
    {
        if let Some(cached) = cache.get::<Vec<Value>>(cache_key) {
            return cached;
        }
        match fetch.await {
            Ok(records) => {
                if let Err(err) = cache.set(cache_key, &records) {
                    warn!(%err, key = cache_key, "feed result not cached");
                }
                records
            }
            Err(err) => {
                warn!(%err, key = cache_key, "matter feed failed, continuing without it");
                Vec::new()
            }
        }
    }

    /// Fetch all three feeds, merge them, and cache the normalized output.
    ///
    /// Per-source failures are absorbed (empty set substituted); a cached
    /// normalized result short-circuits the network entirely.
    pub async fn sync_matters(
        &self,
        cache: &CacheStore,
        user_full_name: &str,
    ) -> Vec<NormalizedMatter> {
        let normalized_key =
            format!("normalizedMatters-{NORMALIZED_CACHE_VERSION}-{user_full_name}");
        if let Some(cached) = cache.get::<Vec<NormalizedMatter>>(&normalized_key) {
            info!(count = cached.len(), "normalized matters served from cache");
            return cached;
        }
        if let Some(cached) = cache.memory_get::<Vec<NormalizedMatter>>(&normalized_key) {
            info!(
                count = cached.len(),
                "normalized matters served from memory tier"
            );
            return cached;
        }

        let user_key = format!("matters-{user_full_name}");
        let vnet_key = format!("vnetMatters-{user_full_name}");
        let (all, user, vnet) = tokio::join!(
            self.source_records(cache, "allMatters", self.fetch_all_matters()),
            self.source_records(cache, &user_key, self.fetch_user_matters(user_full_name)),
            self.source_records(cache, &vnet_key, self.fetch_vnet_matters(user_full_name)),
        );

        let merged = merge_matters_from_sources(&all, &user, &vnet, user_full_name);
        info!(count = merged.len(), "matter sources merged");

        match cache.set(&normalized_key, &merged) {
            Ok(()) => {}
            Err(err @ CacheError::PayloadTooLarge { .. }) => {
                warn!(%err, "normalized matters over the persistent limit, holding in memory");
                if let Ok(value) = serde_json::to_value(&merged) {
                    cache.memory_set(&normalized_key, value);
                }
            }
            Err(err) => warn!(%err, "normalized matters not cached"),
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn extract_records_accepts_array_and_wrapper() {
        let array = json!([{"matter_id": "M-1"}]);
        assert_eq!(extract_records("legacy_all", array).len(), 1);

        let wrapped = json!({"matters": [{"matter_id": "M-1"}, {"matter_id": "M-2"}]});
        assert_eq!(extract_records("legacy_all", wrapped).len(), 2);

        assert!(extract_records("legacy_all", json!({"rows": []})).is_empty());
        assert!(extract_records("legacy_all", json!("nope")).is_empty());
    }

    #[test]
    fn code_parameter_is_appended() {
        let url = with_code(Url::parse("https://proxy.example/getMatters").unwrap(), "s3cret");
        assert_eq!(url.as_str(), "https://proxy.example/getMatters?code=s3cret");
    }
}
