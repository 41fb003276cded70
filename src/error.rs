//! Error types shared across the crate.

use thiserror::Error;

/// Configuration resolution failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {key}")]
    MissingKey { key: String },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Cache-layer failures. Any error here means "not cached"; the cache is
/// best-effort and callers must never treat a failed write as fatal.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache payload for '{key}' is {size} bytes, over the {limit}-byte limit")]
    PayloadTooLarge { key: String, size: usize, limit: usize },

    #[error("failed to serialize cache payload for '{key}': {reason}")]
    Serialize { key: String, reason: String },

    #[error("cache storage failure for '{key}': {reason}")]
    Storage { key: String, reason: String },
}

/// Matter-feed fetch failures. A failed source degrades to an empty record
/// set in the merge; these errors surface only through logs and tests.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid {source_name} feed URL: {reason}")]
    Url {
        source_name: &'static str,
        reason: String,
    },

    #[error("request to {source_name} feed failed: {source}")]
    Request {
        source_name: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{source_name} feed returned HTTP {status}")]
    Status {
        source_name: &'static str,
        status: u16,
    },

    #[error("failed to decode {source_name} feed response: {reason}")]
    Decode {
        source_name: &'static str,
        reason: String,
    },
}
