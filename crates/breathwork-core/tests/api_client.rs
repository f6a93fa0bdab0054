//! HTTP client and remote sink tests against a mock server.

use breathwork_core::{
    ApiClient, ApiError, BreathingSessionEngine, Event, ManualClock, Pattern, RemoteSink,
    SessionSink, SessionSummary, UploadReport,
};
use chrono::NaiveDate;
use mockito::Matcher;
use serde_json::json;

fn summary() -> SessionSummary {
    SessionSummary {
        pattern: "4-7-8".into(),
        duration: 95,
        breath_count: 14,
        hold_count: 2,
        total_hold_time: 30,
        longest_hold: 18,
    }
}

const RECORD: &str = r#"{
    "id": 7, "pattern": "4-7-8", "duration": 95, "breathCount": 14,
    "holdCount": 2, "totalHoldTime": 30, "longestHold": 18,
    "completedAt": "2026-03-01T08:00:00Z"
}"#;

#[tokio::test]
async fn create_session_posts_camel_case_body_with_cookie() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/sessions")
        .match_header("cookie", "connect.sid=abc")
        .match_body(Matcher::Json(json!({
            "pattern": "4-7-8",
            "duration": 95,
            "breathCount": 14,
            "holdCount": 2,
            "totalHoldTime": 30,
            "longestHold": 18
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(RECORD)
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), Some("connect.sid=abc".into())).unwrap();
    let record = client.create_session(&summary()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(record.id, 7);
    assert_eq!(record.breath_count, 14);
}

#[tokio::test]
async fn list_sessions_filters_by_date() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/sessions")
        .match_query(Matcher::UrlEncoded("date".into(), "2026-03-01".into()))
        .with_header("content-type", "application/json")
        .with_body(format!("[{RECORD}]"))
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), None).unwrap();
    let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    let records = client.list_sessions(Some(date)).await.unwrap();

    mock.assert_async().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].completed_on(), date);
}

#[tokio::test]
async fn stats_decodes_counters() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/sessions/stats")
        .with_header("content-type", "application/json")
        .with_body(r#"{"totalSessions": 12, "totalMinutes": 80, "currentStreak": 3, "longestStreak": 5}"#)
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), None).unwrap();
    let stats = client.stats().await.unwrap();
    assert_eq!(stats.total_sessions, 12);
    assert_eq!(stats.current_streak, 3);
    assert_eq!(stats.total_breaths, 0);
}

#[tokio::test]
async fn favorites_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let add = server
        .mock("POST", "/api/favorites")
        .match_body(Matcher::Json(json!({"name": "Evening", "pattern": "4-7-8"})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 3, "name": "Evening", "pattern": "4-7-8"}"#)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/api/favorites/3")
        .with_status(204)
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), None).unwrap();
    let fav = client.add_favorite("Evening", "4-7-8").await.unwrap();
    assert_eq!(fav.id, 3);
    assert!(fav.created_at.is_none());
    client.delete_favorite(fav.id).await.unwrap();

    add.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn error_status_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/favorites")
        .with_status(401)
        .with_body("Unauthorized")
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), None).unwrap();
    match client.list_favorites().await {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "Unauthorized");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn remote_sink_uploads_in_background() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/sessions")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(RECORD)
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), None).unwrap();
    let (mut sink, pending) = RemoteSink::new(client, tokio::runtime::Handle::current());
    sink.save(&summary()).unwrap();

    assert_eq!(
        pending.wait().await,
        UploadReport {
            uploaded: 1,
            failed: 0
        }
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn remote_sink_swallows_server_errors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/sessions")
        .with_status(500)
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), None).unwrap();
    let (mut sink, pending) = RemoteSink::new(client, tokio::runtime::Handle::current());
    assert!(sink.save(&summary()).is_ok());
    assert_eq!(pending.wait().await.failed, 1);
    assert_eq!(pending.wait().await, UploadReport::default());
}

#[tokio::test]
async fn failed_remote_upload_is_reported_after_session_end() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/sessions")
        .with_status(503)
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), None).unwrap();
    let (sink, pending) = RemoteSink::new(client, tokio::runtime::Handle::current());
    let clock = ManualClock::new(0);
    let mut engine = BreathingSessionEngine::new(
        Pattern::new("4-7-8", vec![4.0, 7.0, 8.0]).unwrap(),
        Box::new(clock.clone()),
        Box::new(sink),
    )
    .unwrap();

    engine.start();
    clock.advance_secs(5);
    // The upload is only queued when the session ends.
    match engine.end() {
        Some(Event::SessionEnded { persisted, .. }) => assert!(persisted),
        other => panic!("expected SessionEnded, got {other:?}"),
    }

    let report = pending.wait().await;
    assert_eq!(report.uploaded, 0);
    assert_eq!(report.failed, 1);
    mock.assert_async().await;
}
