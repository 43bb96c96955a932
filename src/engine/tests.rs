//! Tests for engine module

use super::*;
use crate::auth::AuthConfig;
use crate::error::Error;
use crate::http::HttpClientConfig;
use chrono::TimeZone;
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Arc<HttpClient> {
    let config = HttpClientConfig::builder()
        .base_url(format!("{}/rest/v1", server.uri()))
        .max_retries(0)
        .no_rate_limit()
        .build();
    Arc::new(HttpClient::with_auth(config, AuthConfig::basic("u", "p")).unwrap())
}

fn record_ids(messages: &[Message]) -> Vec<i64> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Record { data, .. } => data["id"].as_i64(),
            _ => None,
        })
        .collect()
}

fn state_data(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::State { data, .. } => Some(data.clone()),
            _ => None,
        })
        .collect()
}

async fn mount_two_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/user/"))
        .and(query_param_is_missing("_offset"))
        .and(query_param("_limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"next": "/rest/v1/user/?_limit=2&_offset=2&format=json"},
            "objects": [
                {"id": 1, "updated_at": "2024-01-10T00:00:00+0000"},
                {"id": 2, "updated_at": "2024-01-20T00:00:00+0000"}
            ]
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user/"))
        .and(query_param("_offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"next": null},
            "objects": [
                {"id": 3, "updated_at": "2024-01-15T00:00:00+0000"}
            ]
        })))
        .mount(server)
        .await;
}

// ============================================================================
// Message Tests
// ============================================================================

#[test]
fn test_message_kinds() {
    let msg = Message::record("users", json!({"id": 1}));
    assert!(msg.is_record());
    assert!(!msg.is_state());

    let msg = Message::state("users", json!({"cursor": "abc"}));
    assert!(msg.is_state());
    assert!(!msg.is_record());

    for msg in [Message::info("i"), Message::warn("w"), Message::error("e")] {
        assert!(msg.is_log());
    }
}

// ============================================================================
// SyncConfig Tests
// ============================================================================

#[test]
fn test_sync_config_default() {
    let config = SyncConfig::default();
    assert_eq!(config.page_size, 100);
    assert_eq!(config.max_records, 0);
    assert!(config.start_date.is_none());
    assert!(!config.limit_reached(1_000_000));
}

#[test]
fn test_sync_config_builder() {
    let config = SyncConfig::new().with_page_size(10).with_max_records(5);

    assert_eq!(config.page_size, 10);
    assert!(!config.limit_reached(4));
    assert!(config.limit_reached(5));
}

// ============================================================================
// Sync Tests
// ============================================================================

#[tokio::test]
async fn test_sync_follows_next_links() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;

    let mut engine = SyncEngine::new(client_for(&server), StateManager::in_memory())
        .with_config(SyncConfig::new().with_page_size(2));
    let messages = engine
        .sync_stream(&StreamDefinition::users(), SyncMode::FullRefresh)
        .await
        .unwrap();

    assert_eq!(record_ids(&messages), vec![1, 2, 3]);
    assert_eq!(
        state_data(&messages),
        vec![json!({"cursor": "2024-01-20T00:00:00+0000"})]
    );
    assert_eq!(engine.stats().pages_fetched, 2);
    assert_eq!(engine.stats().records_synced, 3);
    assert_eq!(
        engine.state().get_cursor("users").await,
        Some("2024-01-20T00:00:00+0000".to_string())
    );
}

#[tokio::test]
async fn test_sync_incremental_skips_older_records() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;

    let state = StateManager::from_json(
        r#"{"streams": {"users": {"cursor": "2024-01-12T00:00:00+0000"}}}"#,
    )
    .unwrap();
    let mut engine = SyncEngine::new(client_for(&server), state)
        .with_config(SyncConfig::new().with_page_size(2));
    let messages = engine
        .sync_stream(&StreamDefinition::users(), SyncMode::Incremental)
        .await
        .unwrap();

    assert_eq!(record_ids(&messages), vec![2, 3]);
    assert_eq!(engine.stats().records_filtered, 1);
    assert_eq!(
        state_data(&messages),
        vec![json!({"cursor": "2024-01-20T00:00:00+0000"})]
    );
}

#[tokio::test]
async fn test_sync_incremental_uses_start_date_without_bookmark() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;

    let start = Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap();
    let mut engine = SyncEngine::new(client_for(&server), StateManager::in_memory())
        .with_config(SyncConfig::new().with_page_size(2).with_start_date(Some(start)));
    let messages = engine
        .sync_stream(&StreamDefinition::users(), SyncMode::Incremental)
        .await
        .unwrap();

    assert_eq!(record_ids(&messages), vec![2]);
}

#[tokio::test]
async fn test_sync_stops_at_max_records() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;

    let mut engine = SyncEngine::new(client_for(&server), StateManager::in_memory())
        .with_config(SyncConfig::new().with_page_size(2).with_max_records(1));
    let messages = engine
        .sync_stream(&StreamDefinition::users(), SyncMode::FullRefresh)
        .await
        .unwrap();

    assert_eq!(record_ids(&messages), vec![1]);
    assert_eq!(engine.stats().pages_fetched, 1);
}

#[tokio::test]
async fn test_sync_stream_without_replication_key_has_no_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user/"))
        .and(query_param_is_missing("order_by"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"next": null},
            "objects": [{"id": 7}, "junk"]
        })))
        .mount(&server)
        .await;

    let mut engine = SyncEngine::new(client_for(&server), StateManager::in_memory());
    let messages = engine
        .sync_stream(&StreamDefinition::contacts(), SyncMode::FullRefresh)
        .await
        .unwrap();

    assert_eq!(record_ids(&messages), vec![7]);
    assert!(state_data(&messages).is_empty());
    assert!(messages.first().unwrap().is_log());
    assert!(messages.last().unwrap().is_log());
}

#[tokio::test]
async fn test_sync_bookmark_never_moves_backwards() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;

    let state = StateManager::from_json(
        r#"{"streams": {"users": {"cursor": "2025-01-01T00:00:00+0000"}}}"#,
    )
    .unwrap();
    let mut engine = SyncEngine::new(client_for(&server), state)
        .with_config(SyncConfig::new().with_page_size(2));
    let messages = engine
        .sync_stream(&StreamDefinition::users(), SyncMode::FullRefresh)
        .await
        .unwrap();

    assert_eq!(record_ids(&messages).len(), 3);
    assert_eq!(
        state_data(&messages),
        vec![json!({"cursor": "2025-01-01T00:00:00+0000"})]
    );
}

#[tokio::test]
async fn test_sync_propagates_http_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let mut engine = SyncEngine::new(client_for(&server), StateManager::in_memory());
    let err = engine
        .sync_stream(&StreamDefinition::users(), SyncMode::FullRefresh)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 401, .. }));
}

#[tokio::test]
async fn test_sync_stream_into_emits_incrementally() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;

    let mut engine = SyncEngine::new(client_for(&server), StateManager::in_memory())
        .with_config(SyncConfig::new().with_page_size(2));
    let mut records = 0;
    engine
        .sync_stream_into(&StreamDefinition::users(), SyncMode::FullRefresh, &mut |m| {
            if m.is_record() {
                records += 1;
            }
        })
        .await
        .unwrap();

    assert_eq!(records, 3);

    engine.reset_stats();
    assert_eq!(engine.stats(), &SyncStats::default());
}
