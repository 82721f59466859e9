//! Client library against a live gateway
//!
//! Run with: cargo test -p integration-tests --test client_tests

use std::sync::{Arc, Mutex};
use std::time::Duration;

use inbox_client::{ChatSession, ConnectionPhase, DeliveryStatus, ReconnectPolicy};
use inbox_core::UserId;
use integration_tests::{eventually, TestServer};
use tokio::sync::mpsc;

fn connected(session: &ChatSession) -> bool {
    session.status().phase == ConnectionPhase::Connected
}

/// Connected and registered server side
async fn connect(server: &TestServer, session: &ChatSession) {
    session.connect();
    let registry = server.state.registry().clone();
    let user = session.user_id().clone();
    assert!(eventually(|| connected(session) && registry.is_online(&user)).await);
}

#[tokio::test]
async fn test_sessions_exchange_messages() {
    let server = TestServer::start().await.unwrap();
    let alice = ChatSession::new(server.client_config("a1")).unwrap();
    let bob = ChatSession::new(server.client_config("b1")).unwrap();
    let a1 = UserId::new("a1");
    let b1 = UserId::new("b1");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = bob.on_message(&a1, move |m| {
        tx.send(m.text.clone()).ok();
    });

    connect(&server, &alice).await;
    connect(&server, &bob).await;

    let sent = alice.send(&b1, "hi").await.unwrap();
    let received = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received, "hi");

    // The pushed echo folds into the optimistic entry
    assert!(eventually(|| alice.messages(&b1).len() == 1
        && alice.messages(&b1)[0].status == DeliveryStatus::Sent)
        .await);
    assert_eq!(alice.messages(&b1)[0].id.as_ref(), Some(&sent.id));

    // Bob's cache received the push under Alice
    assert_eq!(bob.messages(&a1).len(), 1);

    assert!(eventually(|| bob
        .conversations()
        .first()
        .is_some_and(|c| c.user.id == a1 && c.unread_count == 1))
        .await);

    assert_eq!(bob.mark_read(&a1).await.unwrap(), 1);
    assert!(eventually(|| bob
        .conversations()
        .first()
        .is_some_and(|c| c.unread_count == 0))
        .await);

    let history = bob.history(&a1).await.unwrap();
    assert_eq!(history.len(), 1);

    alice.close();
    bob.close();
}

#[tokio::test]
async fn test_session_reconnects_after_server_drop() {
    let server = TestServer::start().await.unwrap();
    let policy = ReconnectPolicy::default().base_delay(Duration::from_millis(50));
    let alice = ChatSession::new(server.client_config("a1").with_reconnect(policy)).unwrap();

    let phases = Arc::new(Mutex::new(Vec::new()));
    let sink = phases.clone();
    let _sub = alice.on_status(move |status| sink.lock().unwrap().push(status.phase));

    connect(&server, &alice).await;
    assert_eq!(server.state.registry().close_all(), 1);

    let registry = server.state.registry().clone();
    assert!(eventually(|| registry.connection_count() == 1 && connected(&alice)).await);
    assert_eq!(alice.status().attempts, 0);
    assert!(phases.lock().unwrap().contains(&ConnectionPhase::Reconnecting));

    alice.close();
    assert!(eventually(|| registry.connection_count() == 0).await);
    assert_eq!(alice.status().phase, ConnectionPhase::Disconnected);
}

#[tokio::test]
async fn test_rejected_token_keeps_retrying() {
    let server = TestServer::start().await.unwrap();
    let policy = ReconnectPolicy::default().base_delay(Duration::from_millis(20));
    let config = server
        .client_config("a1")
        .with_token("not-a-token")
        .with_reconnect(policy);
    let alice = ChatSession::new(config).unwrap();

    alice.connect();
    assert!(eventually(|| alice.status().attempts >= 2).await);
    assert_ne!(alice.status().phase, ConnectionPhase::Connected);
    assert_eq!(server.state.registry().connection_count(), 0);

    alice.close();
}

#[tokio::test]
async fn test_failed_send_is_kept() {
    let server = TestServer::start().await.unwrap();
    let alice = ChatSession::new(server.client_config("a1")).unwrap();
    let b1 = UserId::new("b1");

    let err = alice.send(&b1, "   ").await.unwrap_err();
    assert_eq!(err.status_code(), Some(400));

    let cached = alice.messages(&b1);
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].status, DeliveryStatus::Failed);
}
