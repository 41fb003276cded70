//! Matter-data reconciliation for the firm portal.
//!
//! Matter records arrive from three backends with three different field
//! naming conventions. This crate normalizes them into one canonical
//! record, merges the sources with a fixed priority order, derives status
//! and user-role fields, and caches results best-effort with a fixed TTL.
//! Everything degrades: a failed feed, a refused cache write, or a
//! malformed record mean fewer or emptier matters, never a hard failure.

pub mod cache;
pub mod config;
pub mod error;
pub mod feeds;
pub mod matters;

pub use cache::{CacheStore, Clock, SystemClock, CACHE_TTL_MS, MAX_PAYLOAD_BYTES};
pub use config::{CacheConfig, FeedConfig};
pub use error::{CacheError, ConfigError, FeedError};
pub use feeds::MatterFeeds;
pub use matters::merge::{
    apply_admin_filter, filter_matters_by_area, filter_matters_by_role, filter_matters_by_status,
    merge_matters_from_sources, unique_practice_areas, StatusFilter,
};
pub use matters::names::names_match;
pub use matters::normalize::{
    normalize_matter_data, MatterDataSource, NormalizedMatter, RawMatterRecord,
};
pub use matters::policy::{
    determine_matter_status, determine_user_role, has_admin_access, MatterRole, MatterStatus,
};
