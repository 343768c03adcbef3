//! Behavioural tests for the in-memory store adapter.

use std::sync::Arc;
use std::time::Duration;

use crate::clock::ManualClock;
use crate::store::adapters::InMemoryStore;
use crate::store::ports::{KeyTtl, KeyValueStore, StoreError};
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> ManualClock {
    ManualClock::default()
}

fn store_with(clock: &ManualClock) -> InMemoryStore<ManualClock> {
    InMemoryStore::with_clock(Arc::new(clock.clone()))
}

#[rstest]
#[tokio::test]
async fn values_disappear_once_their_ttl_lapses(clock: ManualClock) {
    let store = store_with(&clock);
    store
        .set("k", "v", Some(Duration::from_secs(5)))
        .await
        .expect("set succeeds");

    clock.advance(Duration::from_secs(4));
    assert_eq!(
        store.get("k").await.expect("get succeeds"),
        Some("v".to_owned())
    );

    clock.advance(Duration::from_secs(1));
    assert_eq!(store.get("k").await.expect("get succeeds"), None);
    assert_eq!(
        store.ttl("k").await.expect("ttl succeeds"),
        KeyTtl::Missing
    );
}

#[rstest]
#[tokio::test]
async fn ttl_reports_remaining_and_persistent_keys(clock: ManualClock) {
    let store = store_with(&clock);
    store
        .set("short", "v", Some(Duration::from_secs(30)))
        .await
        .expect("set succeeds");
    store.set("forever", "v", None).await.expect("set succeeds");

    clock.advance(Duration::from_secs(10));

    assert_eq!(
        store.ttl("short").await.expect("ttl succeeds"),
        KeyTtl::Remaining(Duration::from_secs(20))
    );
    assert_eq!(
        store.ttl("forever").await.expect("ttl succeeds"),
        KeyTtl::Persistent
    );
}

#[rstest]
#[tokio::test]
async fn list_push_prepends_and_range_accepts_negative_bounds(clock: ManualClock) {
    let store = store_with(&clock);
    for value in ["a", "b", "c"] {
        store.list_push("q", value).await.expect("push succeeds");
    }

    let all = store.list_range("q", 0, -1).await.expect("range succeeds");
    let oldest_two = store.list_range("q", -2, -1).await.expect("range succeeds");
    let beyond = store.list_range("q", 5, 10).await.expect("range succeeds");

    assert_eq!(all, vec!["c", "b", "a"]);
    assert_eq!(oldest_two, vec!["b", "a"]);
    assert!(beyond.is_empty());
}

#[rstest]
#[tokio::test]
async fn list_remove_is_idempotent_and_drops_empty_lists(clock: ManualClock) {
    let store = store_with(&clock);
    store.list_push("q", "x").await.expect("push succeeds");

    store
        .list_remove("q", "x")
        .await
        .expect("first removal succeeds");
    store
        .list_remove("q", "x")
        .await
        .expect("second removal succeeds");

    assert!(!store.contains_key("q").expect("lookup succeeds"));
}

#[rstest]
#[tokio::test]
async fn expire_refreshes_collection_lifetime(clock: ManualClock) {
    let store = store_with(&clock);
    store.list_push("q", "x").await.expect("push succeeds");

    assert!(
        store
            .expire("q", Duration::from_secs(2))
            .await
            .expect("expire succeeds")
    );
    assert!(
        !store
            .expire("absent", Duration::from_secs(2))
            .await
            .expect("expire succeeds")
    );

    clock.advance(Duration::from_secs(3));
    assert!(
        store
            .list_range("q", 0, -1)
            .await
            .expect("range succeeds")
            .is_empty()
    );
}

#[rstest]
#[tokio::test]
async fn sets_and_hashes_round_trip(clock: ManualClock) {
    let store = store_with(&clock);
    store.set_add("s", "one").await.expect("add succeeds");
    store
        .set_add("s", "one")
        .await
        .expect("duplicate add succeeds");
    store.set_add("s", "two").await.expect("add succeeds");
    store.set_remove("s", "two").await.expect("remove succeeds");
    store
        .hash_set("h", "field", "value")
        .await
        .expect("hset succeeds");

    assert_eq!(
        store.set_members("s").await.expect("members succeeds"),
        vec!["one"]
    );
    let hash = store.hash_get_all("h").await.expect("hgetall succeeds");
    assert_eq!(hash.get("field").map(String::as_str), Some("value"));
    assert!(
        store
            .hash_get_all("missing")
            .await
            .expect("hgetall succeeds")
            .is_empty()
    );
}

#[rstest]
#[tokio::test]
async fn mismatched_types_are_rejected(clock: ManualClock) {
    let store = store_with(&clock);
    store.set("k", "v", None).await.expect("set succeeds");

    let result = store.list_push("k", "x").await;

    assert!(matches!(
        result,
        Err(StoreError::WrongType { ref key }) if key == "k"
    ));
}
