//! Redirect integration tests
//!
//! These tests drive the redirect router end to end: resolution, not-found
//! handling, archived links, and the isolation of redirects from scan
//! recording failures.

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::LOCATION, Request, StatusCode},
};
use serval::models::{NewLink, NewScan, ScanEvent};
use serval::redirect::{create_redirect_router, RedirectResolver};
use serval::scan::ScanRecorder;
use serval::storage::{LinkStore, ScanStore, SqliteStorage};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Scan store that fails every insert; used to prove redirect availability
/// does not depend on analytics-write availability.
struct FailingScanStore;

#[async_trait]
impl ScanStore for FailingScanStore {
    async fn insert(&self, _scan: &NewScan) -> Result<()> {
        Err(anyhow::anyhow!("analytics store is down"))
    }

    async fn list_by_link(&self, _link_id: &str, _limit: i64) -> Result<Vec<ScanEvent>> {
        Ok(vec![])
    }
}

async fn test_storage() -> Arc<SqliteStorage> {
    let storage = Arc::new(SqliteStorage::new("sqlite::memory:", 5).await.unwrap());
    storage.init().await.unwrap();
    storage
}

fn recorder_for(scans: Arc<dyn ScanStore>) -> Arc<ScanRecorder> {
    Arc::new(ScanRecorder::new(scans, None, Duration::from_millis(500)))
}

/// Wait for detached scan-recording tasks to land, bounded.
async fn wait_for_scans(storage: &SqliteStorage, link_id: &str, expected: usize) -> Vec<ScanEvent> {
    for _ in 0..50 {
        let scans = storage.list_by_link(link_id, 100).await.unwrap();
        if scans.len() >= expected {
            return scans;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {expected} scans for {link_id} to be recorded");
}

#[tokio::test]
async fn redirect_resolves_to_destination() {
    let storage = test_storage().await;
    storage
        .create(&NewLink {
            id: "hop001",
            destination_url: "https://example.com/destination",
            owner_id: "user-1",
        })
        .await
        .unwrap();

    let app = create_redirect_router(RedirectResolver::new(
        storage.clone(),
        recorder_for(storage.clone()),
    ));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/hop001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "https://example.com/destination"
    );
}

#[tokio::test]
async fn unknown_id_redirects_to_not_found() {
    let storage = test_storage().await;
    let app = create_redirect_router(RedirectResolver::new(
        storage.clone(),
        recorder_for(storage),
    ));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/doesnotexist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers().get(LOCATION).unwrap(), "/not-found");
}

#[tokio::test]
async fn not_found_page_is_served() {
    let storage = test_storage().await;
    let app = create_redirect_router(RedirectResolver::new(
        storage.clone(),
        recorder_for(storage),
    ));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/not-found")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn archived_links_still_redirect() {
    let storage = test_storage().await;
    storage
        .create(&NewLink {
            id: "arch99",
            destination_url: "https://example.com/archived",
            owner_id: "user-1",
        })
        .await
        .unwrap();
    storage
        .update(
            "arch99",
            &serval::models::LinkPatch {
                archived: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let app = create_redirect_router(RedirectResolver::new(
        storage.clone(),
        recorder_for(storage),
    ));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/arch99")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "https://example.com/archived"
    );
}

#[tokio::test]
async fn redirect_survives_failing_scan_store() {
    let storage = test_storage().await;
    storage
        .create(&NewLink {
            id: "tough1",
            destination_url: "https://example.com/tough",
            owner_id: "user-1",
        })
        .await
        .unwrap();

    let app = create_redirect_router(RedirectResolver::new(
        storage,
        recorder_for(Arc::new(FailingScanStore)),
    ));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/tough1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "https://example.com/tough"
    );
}

#[tokio::test]
async fn scans_record_context_and_classification() {
    let storage = test_storage().await;
    storage
        .create(&NewLink {
            id: "trace1",
            destination_url: "https://example.com/traced",
            owner_id: "user-1",
        })
        .await
        .unwrap();

    let app = create_redirect_router(RedirectResolver::new(
        storage.clone(),
        recorder_for(storage.clone()),
    ));

    // One scan arriving from a Google search...
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/trace1")
                .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
                .header("referer", "https://www.google.com/search?q=x")
                .header(
                    "user-agent",
                    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
                )
                .header("x-vercel-ip-country", "US")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    // ...and one with no referrer at all, in rapid succession.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/trace1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let scans = wait_for_scans(&storage, "trace1", 2).await;
    assert_eq!(scans.len(), 2);

    let organic = scans
        .iter()
        .find(|s| s.source.as_deref() == Some("google"))
        .expect("google-referred scan recorded");
    assert_eq!(organic.medium.as_deref(), Some("organic"));
    assert_eq!(organic.ip, "203.0.113.9");
    assert_eq!(organic.country.as_deref(), Some("US"));
    assert_eq!(organic.device.as_deref(), Some("pc"));
    assert_eq!(organic.browser.as_deref(), Some("Chrome"));

    let direct = scans
        .iter()
        .find(|s| s.source.as_deref() == Some("direct"))
        .expect("direct scan recorded");
    assert_eq!(direct.medium.as_deref(), Some("none"));
    assert_eq!(direct.ip, "unknown");
    assert_eq!(direct.country, None);
    assert_eq!(direct.scan_type, None);
}
