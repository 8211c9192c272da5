// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Live stream behavior: deduplication, teardown, emission order, polling,
//! cross-pipeline updates and cancellation.
//!
//! Time is paused, so poll intervals and debounce windows elapse instantly.
//!
//! Run with: `cargo test --test stream_multiplexer`

mod common;

use std::time::Duration;

use serde_json::json;
use tokio_stream::StreamExt;

use common::*;
use model_sync::query::Query;
use model_sync::{Model, ModelStore, NetworkError, ResultState, StreamKey, SyncError};

fn widget_list_key() -> StreamKey {
    StreamKey::list(Widget::META.model_type, None, None, vec![])
}

#[tokio::test(start_paused = true)]
async fn test_identical_streams_share_one_pipeline() {
    let remote = MockRemote::new();
    remote.set_list(Widget::META.model_type, Ok(vec![widget_json("a", 1), widget_json("b", 2)]));
    let provider = provider_with(memory_store(), remote.clone());

    let mut first = provider.stream_list::<Widget>(None, None, vec![]);
    let mut second = provider.stream_list::<Widget>(None, None, vec![]);

    assert_eq!(provider.streams().active_streams(), 1);
    assert_eq!(provider.streams().observer_count(&widget_list_key()), 2);

    assert_eq!(loaded_ids(&next_settled(&mut first).await), vec!["a", "b"]);
    assert_eq!(loaded_ids(&next_settled(&mut second).await), vec!["a", "b"]);
    assert_eq!(remote.list_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_different_queries_get_separate_pipelines() {
    let provider = provider_with(memory_store(), MockRemote::new());

    let _all = provider.stream_list::<Widget>(None, None, vec![]);
    let _some = provider.stream_list::<Widget>(Some(Query::equals("value", 1)), None, vec![]);
    let _limited = provider.stream_list::<Widget>(None, Some(1), vec![]);

    assert_eq!(provider.streams().active_streams(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_last_observer_tears_down_pipeline() {
    let remote = MockRemote::new();
    remote.set_list(Widget::META.model_type, Ok(vec![widget_json("a", 1)]));
    let provider = provider_with(memory_store(), remote.clone());

    let mut subs: Vec<_> = (0..3)
        .map(|_| provider.stream_list::<Widget>(None, None, vec![]))
        .collect();
    next_settled(&mut subs[0]).await;
    assert_eq!(provider.streams().observer_count(&widget_list_key()), 3);

    subs.pop();
    subs.pop();
    assert_eq!(provider.streams().active_streams(), 1);
    subs.clear();
    assert_eq!(provider.streams().active_streams(), 0);
    assert_eq!(provider.streams().observer_count(&widget_list_key()), 0);

    // A fresh subscriber starts a fresh pipeline
    let mut again = provider.stream_list::<Widget>(None, None, vec![]);
    assert!(next_state(&mut again).await.is_loading());
    // Cached copy first, then the network refresh
    assert_eq!(loaded_ids(&next_settled(&mut again).await), vec!["a"]);
    assert_eq!(loaded_ids(&next_settled(&mut again).await), vec!["a"]);
    assert_eq!(remote.list_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_emits_loading_then_cache_then_network() {
    let store = memory_store();
    let remote = MockRemote::new();
    seed(store.as_ref(), &Widget { id: "A".into(), value: 1, name: String::new() }, None).await;
    remote.set_list(Widget::META.model_type, Ok(vec![widget_json("A", 2), widget_json("B", 3)]));
    let provider = provider_with(store.clone(), remote.clone());

    let mut sub = provider.stream_list::<Widget>(None, None, vec![]);

    assert!(next_state(&mut sub).await.is_loading());

    let provisional = next_state(&mut sub).await;
    let cached = provisional.loaded().expect("cached value");
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].value, 1);

    let fresh = next_state(&mut sub).await;
    assert_eq!(loaded_ids(&fresh), vec!["A", "B"]);
    assert_eq!(fresh.loaded().map(|l| l[0].value), Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_late_subscriber_sees_current_value() {
    let remote = MockRemote::new();
    remote.set_list(Widget::META.model_type, Ok(vec![widget_json("a", 1)]));
    let provider = provider_with(memory_store(), remote.clone());

    let mut early = provider.stream_list::<Widget>(None, None, vec![]);
    next_settled(&mut early).await;

    let mut late = provider.stream_list::<Widget>(None, None, vec![]);
    let first = next_state(&mut late).await;
    assert_eq!(loaded_ids(&first), vec!["a"]);
    assert_eq!(remote.list_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_poll_interval_refreshes() {
    let remote = MockRemote::new();
    remote.set_list(Reading::META.model_type, Ok(vec![json!({"id": "r1", "value": 1})]));
    let provider = provider_with(memory_store(), remote.clone());

    let mut sub = provider.stream_list::<Reading>(None, None, vec![]);
    next_settled(&mut sub).await;
    assert_eq!(remote.list_calls(), 1);

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(remote.list_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_shared_polling_stream_fetches_once_per_tick() {
    let remote = MockRemote::new();
    remote.set_list(Reading::META.model_type, Ok(vec![json!({"id": "r1", "value": 1})]));
    let provider = provider_with(memory_store(), remote.clone());

    let mut first = provider.stream_list::<Reading>(None, None, vec![]);
    let mut second = provider.stream_list::<Reading>(None, None, vec![]);
    next_settled(&mut first).await;
    next_settled(&mut second).await;
    assert_eq!(remote.list_calls(), 1);

    // Ticks at 10s, 20s and 30s
    tokio::time::sleep(Duration::from_secs(35)).await;
    assert_eq!(remote.list_calls(), 4);

    // Both observers saw every tick's refresh
    for sub in [&mut first, &mut second] {
        for _ in 0..3 {
            assert_eq!(loaded_ids(&next_settled(sub).await), vec!["r1"]);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_store_writes_publishes_once() {
    let store = memory_store();
    let remote = MockRemote::new();
    remote.set_list(Widget::META.model_type, Ok(vec![widget_json("a", 1)]));
    let provider = provider_with(store.clone(), remote.clone());

    let mut list = provider.stream_list::<Widget>(None, None, vec![]);
    let mut single = provider.stream_model::<Widget>("b");
    assert_eq!(loaded_ids(&next_settled(&mut list).await), vec!["a"]);
    assert!(next_settled(&mut single).await.error().map_or(false, SyncError::is_not_found));

    // Three separate writes inside one debounce window
    let widget = |id: &str| Widget { id: id.into(), value: 2, name: String::new() };
    seed(store.as_ref(), &widget("b"), None).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    seed(store.as_ref(), &widget("c"), None).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    seed(store.as_ref(), &widget("d"), None).await;

    assert_eq!(loaded_ids(&next_settled(&mut list).await), vec!["a", "b", "c", "d"]);
    assert_eq!(next_settled(&mut single).await.loaded().map(|w| w.id.clone()), Some("b".to_string()));

    // Nothing else follows the coalesced re-read
    let quiet = Duration::from_secs(1);
    assert!(tokio::time::timeout(quiet, list.next()).await.is_err());
    assert!(tokio::time::timeout(quiet, single.next()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_stream_recovers_after_failed_refresh() {
    let remote = MockRemote::new();
    remote.set_list(Reading::META.model_type, Err(NetworkError::Unauthorized));
    let provider = provider_with(memory_store(), remote.clone());

    let mut sub = provider.stream_list::<Reading>(None, None, vec![]);
    let failed = next_settled(&mut sub).await;
    assert!(failed.error().map_or(false, SyncError::is_unauthorized));

    remote.set_list(Reading::META.model_type, Ok(vec![json!({"id": "r1", "value": 4})]));
    let recovered = next_settled(&mut sub).await;
    assert_eq!(loaded_ids(&recovered), vec!["r1"]);
}

#[tokio::test(start_paused = true)]
async fn test_without_poll_interval_fetches_once() {
    let remote = MockRemote::new();
    remote.set_list(Widget::META.model_type, Ok(vec![widget_json("a", 1)]));
    let provider = provider_with(memory_store(), remote.clone());

    let mut sub = provider.stream_list::<Widget>(None, None, vec![]);
    next_settled(&mut sub).await;
    tokio::time::sleep(Duration::from_secs(600)).await;

    assert_eq!(remote.list_calls(), 1);
    assert_eq!(provider.streams().active_streams(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_model_stream_sees_list_pipeline_write() {
    let store = memory_store();
    let remote = MockRemote::new();
    remote.set_detail(Widget::META.model_type, Some("a"), Ok(widget_json("a", 1)));
    let provider = provider_with(store.clone(), remote.clone());

    let mut single = provider.stream_model::<Widget>("a");
    let first = next_settled(&mut single).await;
    assert_eq!(first.loaded().map(|w| w.value), Some(1));

    remote.set_list(Widget::META.model_type, Ok(vec![widget_json("a", 5)]));
    let mut list = provider.stream_list::<Widget>(None, None, vec![]);
    next_settled(&mut list).await;

    let updated = next_settled(&mut single).await;
    assert_eq!(updated.loaded().map(|w| w.value), Some(5));
    assert_eq!(remote.detail_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_list_stream_sees_direct_store_write() {
    let store = memory_store();
    let remote = MockRemote::new();
    remote.set_list(Widget::META.model_type, Ok(vec![widget_json("a", 1)]));
    let provider = provider_with(store.clone(), remote.clone());

    let mut sub = provider.stream_list::<Widget>(None, None, vec![]);
    assert_eq!(loaded_ids(&next_settled(&mut sub).await), vec!["a"]);

    seed(store.as_ref(), &Widget { id: "c".into(), value: 9, name: String::new() }, None).await;

    assert_eq!(loaded_ids(&next_settled(&mut sub).await), vec!["a", "c"]);
}

#[tokio::test(start_paused = true)]
async fn test_deleted_record_becomes_not_found() {
    let store = memory_store();
    let remote = MockRemote::new();
    remote.set_detail(Widget::META.model_type, Some("a"), Ok(widget_json("a", 1)));
    let provider = provider_with(store.clone(), remote.clone());

    let mut sub = provider.stream_model::<Widget>("a");
    assert!(next_settled(&mut sub).await.loaded().is_some());

    store.delete(Widget::META.model_type, &Query::id("a")).await.unwrap();

    let gone = next_settled(&mut sub).await;
    assert!(gone.error().map_or(false, SyncError::is_not_found));
}

#[tokio::test(start_paused = true)]
async fn test_missing_record_streams_not_found() {
    let provider = provider_with(memory_store(), MockRemote::new());

    let mut sub = provider.stream_model::<Widget>("missing");
    let state = next_settled(&mut sub).await;

    assert!(state.error().map_or(false, SyncError::is_not_found));
}

#[tokio::test(start_paused = true)]
async fn test_mismatched_subscriber_gets_type_error() {
    let remote = MockRemote::new();
    remote.set_detail(Widget::META.model_type, Some("a"), Ok(widget_json("a", 1)));
    let provider = provider_with(memory_store(), remote.clone());

    let mut widgets = provider.stream_model::<Widget>("a");
    let mut labels = provider.stream_model::<WidgetLabel>("a");
    assert_eq!(
        provider
            .streams()
            .observer_count(&StreamKey::model(Widget::META.model_type, "a")),
        2
    );

    assert!(next_settled(&mut widgets).await.loaded().is_some());
    match next_settled(&mut labels).await {
        ResultState::Error(SyncError::TypeMismatch { .. }) => {}
        other => panic!("expected type mismatch, got {:?}", other.error()),
    }
}

#[tokio::test(start_paused = true)]
async fn test_stream_first_shares_list_pipeline() {
    let remote = MockRemote::new();
    remote.set_list(Widget::META.model_type, Ok(vec![widget_json("b", 1), widget_json("a", 2)]));
    let provider = provider_with(memory_store(), remote.clone());

    let mut list = provider.stream_list::<Widget>(None, None, vec![]);
    let mut first = provider.stream_first::<Widget>(None, vec![]);

    assert_eq!(provider.streams().active_streams(), 1);
    assert_eq!(first.key(), Some(&widget_list_key()));

    assert_eq!(loaded_ids(&next_settled(&mut list).await), vec!["b", "a"]);
    assert_eq!(next_settled(&mut first).await.loaded().map(|w| w.id.clone()), Some("b".to_string()));
    assert_eq!(remote.list_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stream_first_of_empty_list_is_not_found() {
    let provider = provider_with(memory_store(), MockRemote::new());

    let mut first = provider.stream_first::<Widget>(None, vec![]);
    let state = next_settled(&mut first).await;

    assert!(state.error().map_or(false, SyncError::is_not_found));
}

#[tokio::test(start_paused = true)]
async fn test_list_limit_trims_published_value_only() {
    let store = memory_store();
    let remote = MockRemote::new();
    remote.set_list(Widget::META.model_type, Ok(vec![widget_json("a", 1), widget_json("b", 2)]));
    let provider = provider_with(store.clone(), remote.clone());

    let mut sub = provider.stream_list::<Widget>(None, Some(1), vec![]);

    assert_eq!(loaded_ids(&next_settled(&mut sub).await), vec!["a"]);
    assert_eq!(store.count(Widget::META.model_type), 2);
}

#[tokio::test(start_paused = true)]
async fn test_singleton_stream() {
    let remote = MockRemote::new();
    remote.set_detail(Profile::META.model_type, None, Ok(json!({"id": "me", "display_name": "Me"})));
    let provider = provider_with(memory_store(), remote.clone());

    let mut sub = provider.stream_singleton::<Profile>();
    let state = next_settled(&mut sub).await;

    assert_eq!(state.loaded().map(|p| p.display_name.as_str()), Some("Me"));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_last_observer_cancels_inflight_fetch() {
    let remote = MockRemote::new();
    remote.set_delay(Duration::from_secs(5));
    remote.set_list(Widget::META.model_type, Ok(vec![widget_json("a", 1)]));
    let provider = provider_with(memory_store(), remote.clone());

    let sub = provider.stream_list::<Widget>(None, None, vec![]);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(remote.list_calls(), 1);

    drop(sub);
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(remote.completed_calls(), 0);
    assert_eq!(provider.streams().active_streams(), 0);
}
