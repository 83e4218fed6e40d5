//! Session lifecycle tests: sign-on token handling, idempotent
//! sign-off, and request-scope cleanup guarantees.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bi_portal::config::{CredentialsConfig, UpstreamConfig};
use bi_portal::upstream::{RequestScope, UpstreamError, UpstreamSession};

mod common;
use common::{spawn_mock_upstream, MockOptions};

fn upstream_config(addr: SocketAddr) -> UpstreamConfig {
    UpstreamConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        timeout_secs: 5,
        ..UpstreamConfig::default()
    }
}

fn credentials() -> CredentialsConfig {
    CredentialsConfig::default()
}

#[tokio::test]
async fn sign_on_stores_the_issued_token() {
    let mock = spawn_mock_upstream(MockOptions::default()).await;
    let session = UpstreamSession::new(&upstream_config(mock.addr)).unwrap();

    assert!(session.token().is_none());
    session.sign_on("admin", "admin").await.unwrap();
    assert_eq!(session.token().as_deref(), Some("ABC123"));
    assert_eq!(mock.sign_on_count(), 1);
}

#[tokio::test]
async fn sign_on_without_token_entry_fails_and_leaves_token_absent() {
    let mock = spawn_mock_upstream(MockOptions {
        token: None,
        ..MockOptions::default()
    })
    .await;
    let session = UpstreamSession::new(&upstream_config(mock.addr)).unwrap();

    let err = session.sign_on("admin", "admin").await.unwrap_err();
    assert!(matches!(err, UpstreamError::Authentication));
    assert!(session.token().is_none());
}

#[tokio::test]
async fn sign_off_never_fails() {
    // Against a live upstream, after a normal sign-on.
    let mock = spawn_mock_upstream(MockOptions::default()).await;
    let session = UpstreamSession::new(&upstream_config(mock.addr)).unwrap();
    session.sign_on("admin", "admin").await.unwrap();
    session.sign_off().await;
    assert!(session.token().is_none());
    assert_eq!(mock.sign_off_count(), 1);

    // Redundant sign-off on a session that no longer holds a token.
    session.sign_off().await;
    assert_eq!(mock.sign_off_count(), 2);

    // Against an unreachable upstream, without ever signing on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = listener.local_addr().unwrap();
    drop(listener);
    let session = UpstreamSession::new(&upstream_config(dead_addr)).unwrap();
    session.sign_off().await;
    assert!(session.token().is_none());
}

#[tokio::test]
async fn token_is_stable_across_calls_within_a_session() {
    let mock = spawn_mock_upstream(MockOptions::default()).await;
    let session = UpstreamSession::new(&upstream_config(mock.addr)).unwrap();
    session.sign_on("admin", "admin").await.unwrap();

    session
        .list_repository("IBFS:/WFC/Repository/Public", None)
        .await
        .unwrap();
    session
        .list_repository("IBFS:/WFC/Repository/Public", None)
        .await
        .unwrap();

    let seen = mock.tokens_seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].as_deref(), Some("ABC123"));
    assert_eq!(seen[0], seen[1]);
}

#[tokio::test]
async fn listing_filters_and_preserves_order() {
    let mock = spawn_mock_upstream(MockOptions::default()).await;
    let session = UpstreamSession::new(&upstream_config(mock.addr)).unwrap();
    session.sign_on("admin", "admin").await.unwrap();

    let reports = session
        .list_repository("IBFS:/WFC/Repository/Public", Some("FexFile"))
        .await
        .unwrap();
    let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["R1", "R2", "R3"]);
}

#[tokio::test]
async fn defer_with_non_success_code_is_a_business_error() {
    let mock = spawn_mock_upstream(MockOptions {
        defer_return_code: "20000".to_string(),
        ..MockOptions::default()
    })
    .await;
    let session = UpstreamSession::new(&upstream_config(mock.addr)).unwrap();
    session.sign_on("admin", "admin").await.unwrap();

    let err = session
        .defer_report("IBFS:/WFC/Repository/Public/Report1.fex", "nightly")
        .await
        .unwrap_err();
    match err {
        UpstreamError::Business { code } => assert_eq!(code, "20000"),
        other => panic!("expected business error, got {:?}", other),
    }
    // Nothing was queued on the failing path.
    assert!(mock.deferred.lock().unwrap().is_empty());
}

#[tokio::test]
async fn scope_creates_one_session_and_signs_off_once() {
    let mock = spawn_mock_upstream(MockOptions::default()).await;
    let scope = RequestScope::new(upstream_config(mock.addr), credentials());

    let first = scope.session().await.unwrap();
    let second = scope.session().await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(mock.sign_on_count(), 1);

    scope.finish().await;
    scope.finish().await;
    assert_eq!(mock.sign_off_count(), 1);
}

#[tokio::test]
async fn scope_without_session_finishes_as_noop() {
    let mock = spawn_mock_upstream(MockOptions::default()).await;
    let scope = RequestScope::new(upstream_config(mock.addr), credentials());

    scope.finish().await;
    assert_eq!(mock.sign_on_count(), 0);
    assert_eq!(mock.sign_off_count(), 0);
}

#[tokio::test]
async fn dropped_scope_still_signs_off() {
    let mock = spawn_mock_upstream(MockOptions::default()).await;
    let scope = RequestScope::new(upstream_config(mock.addr), credentials());
    scope.session().await.unwrap();

    // Simulates an aborted request whose future never reached finish().
    drop(scope);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(mock.sign_off_count(), 1);
}

#[tokio::test]
async fn failed_sign_on_is_not_retried_within_a_request() {
    let mock = spawn_mock_upstream(MockOptions {
        token: None,
        ..MockOptions::default()
    })
    .await;
    let scope = RequestScope::new(upstream_config(mock.addr), credentials());

    assert!(matches!(
        scope.session().await.unwrap_err(),
        UpstreamError::Authentication
    ));
    assert!(matches!(
        scope.session().await.unwrap_err(),
        UpstreamError::Authentication
    ));
    assert_eq!(mock.sign_on_count(), 1);

    // No token was ever held, so finish() has nothing to sign off.
    scope.finish().await;
    assert_eq!(mock.sign_off_count(), 0);
}
