//! End-to-end tests for the matter reconciliation pipeline:
//! - source-priority override across the three feed shapes
//! - merge idempotence and identifier filtering
//! - cache round-trip, TTL expiry and the oversized-payload path
//! - feed degradation: unreachable backends produce an empty merge, not an
//!   error

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

use matterhub::{
    merge_matters_from_sources, names_match, CacheError, CacheStore, Clock, FeedConfig,
    MatterFeeds, MatterStatus, NormalizedMatter, CACHE_TTL_MS, MAX_PAYLOAD_BYTES,
};

const USER: &str = "Luke Zemanek";

struct ManualClock(AtomicI64);

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

fn cache_fixture() -> (CacheStore, Arc<ManualClock>, TempDir) {
    let tmp = TempDir::new().expect("tempdir");
    let clock = Arc::new(ManualClock(AtomicI64::new(1_700_000_000_000)));
    let store = CacheStore::new(tmp.path(), clock.clone());
    store.init().expect("cache init");
    (store, clock, tmp)
}

fn legacy_spaced(id: &str, client: &str) -> Value {
    json!({
        "Unique ID": id,
        "Display Number": format!("HLX-{id}"),
        "Client Name": client,
        "Description": "Dispute",
        "Practice Area": "Commercial",
        "Responsible Solicitor": "Zemanek, Lukasz",
        "Originating Solicitor": "Jane Doe",
        "Close Date": ""
    })
}

fn legacy_pascal(id: &str, client: &str) -> Value {
    json!({
        "MatterID": id,
        "DisplayNumber": format!("HLX-{id}"),
        "ClientName": client,
        "Description": "Dispute",
        "PracticeArea": "Commercial",
        "ResponsibleSolicitor": "Zemanek, Lukasz",
        "OriginatingSolicitor": "Jane Doe"
    })
}

fn vnet_snake(id: &str, client: &str) -> Value {
    json!({
        "matter_id": id,
        "display_number": format!("HLX-{id}"),
        "client_name": client,
        "description": "Dispute",
        "practice_area": "Commercial",
        "responsible_solicitor": "Zemanek, Lukasz",
        "originating_solicitor": "Jane Doe",
        "close_date": "2024-06-01"
    })
}

#[test]
fn vnet_direct_wins_when_all_sources_supply_the_same_id() {
    let merged = merge_matters_from_sources(
        &[legacy_spaced("M-1", "Spaced Client")],
        &[legacy_pascal("M-1", "Pascal Client")],
        &[vnet_snake("M-1", "VNet Client")],
        USER,
    );

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].client_name, "VNet Client");
    assert_eq!(merged[0].data_source.as_str(), "vnet_direct");
    // The VNet record carries a close date; the replacement is wholesale.
    assert_eq!(merged[0].status, MatterStatus::Closed);
}

#[test]
fn merging_twice_yields_identical_output() {
    let all = vec![legacy_spaced("M-1", "A"), legacy_spaced("M-2", "B")];
    let user = vec![legacy_pascal("M-2", "B2")];
    let vnet = vec![vnet_snake("M-3", "C")];

    assert_eq!(
        merge_matters_from_sources(&all, &user, &vnet, USER),
        merge_matters_from_sources(&all, &user, &vnet, USER)
    );
}

#[test]
fn records_without_any_identifier_never_surface() {
    let merged =
        merge_matters_from_sources(&[json!({"Client Name": "Ghost"})], &[], &[], USER);
    assert_eq!(merged, Vec::<NormalizedMatter>::new());
}

#[test]
fn normalized_matters_survive_a_cache_round_trip() {
    let (cache, clock, _tmp) = cache_fixture();
    let merged = merge_matters_from_sources(
        &[legacy_spaced("M-1", "Acme")],
        &[],
        &[vnet_snake("M-2", "Beta")],
        USER,
    );

    cache
        .set(&format!("normalizedMatters-v5-{USER}"), &merged)
        .expect("cached");
    let cached: Vec<NormalizedMatter> = cache
        .get(&format!("normalizedMatters-v5-{USER}"))
        .expect("fresh entry");
    assert_eq!(cached, merged);

    clock.0.fetch_add(CACHE_TTL_MS + 1, Ordering::SeqCst);
    assert!(cache
        .get::<Vec<NormalizedMatter>>(&format!("normalizedMatters-v5-{USER}"))
        .is_none());
}

#[test]
fn oversized_payloads_are_refused_but_fit_the_memory_tier() {
    let (cache, _clock, _tmp) = cache_fixture();
    let huge: Vec<String> = vec!["x".repeat(1024); MAX_PAYLOAD_BYTES / 1024];

    let result = cache.set("allMatters", &huge);
    assert!(matches!(result, Err(CacheError::PayloadTooLarge { .. })));
    assert!(cache.get::<Vec<String>>("allMatters").is_none());

    cache.memory_set("allMatters", serde_json::to_value(&huge).expect("json"));
    assert_eq!(cache.memory_get::<Vec<String>>("allMatters"), Some(huge));
}

#[test]
fn nickname_and_ordering_properties_hold() {
    assert!(names_match("Zemanek, Lukasz", "Luke Zemanek"));
    assert!(!names_match("John Smith", "John Smyth"));
}

#[tokio::test]
async fn unreachable_feeds_degrade_to_an_empty_merge() {
    let (cache, _clock, _tmp) = cache_fixture();
    // Nothing listens on port 1; every source fails and is substituted
    // with an empty record set.
    let config = FeedConfig {
        proxy_base_url: "http://127.0.0.1:1/".parse().expect("url"),
        all_matters_path: "getAllMatters".to_string(),
        all_matters_code: "code-a".to_string(),
        user_matters_path: "getMatters".to_string(),
        user_matters_code: "code-u".to_string(),
        vnet_matters_url: "http://127.0.0.1:1/matters".parse().expect("url"),
        vnet_matters_code: "code-v".to_string(),
    };
    let feeds = MatterFeeds::new(config).expect("client");

    let merged = feeds.sync_matters(&cache, USER).await;
    assert!(merged.is_empty());
}
