//! Gateway stream integration tests
//!
//! Run with: cargo test -p integration-tests --test stream_tests

use std::time::Duration;

use integration_tests::{
    assert_json, assert_status, eventually, test_config, SendMessage, TestServer,
};
use inbox_core::{Conversation, EventKind, Message, ServerEvent, UserId};
use reqwest::StatusCode;

fn conversations(event: ServerEvent) -> Vec<Conversation> {
    match event {
        ServerEvent::Conversations { conversations } => conversations,
        other => panic!("expected conversations, got {}", other.kind()),
    }
}

fn message(event: ServerEvent) -> Message {
    match event {
        ServerEvent::Message { message } => message,
        other => panic!("expected message, got {}", other.kind()),
    }
}

// ============================================================================
// Stream lifecycle
// ============================================================================

#[tokio::test]
async fn test_stream_requires_auth() {
    let server = TestServer::start().await.unwrap();

    let response = server.get("/api/v1/stream").await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    let response = server.get_auth("/api/v1/stream", "garbage").await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    assert_eq!(server.state.registry().connection_count(), 0);
}

#[tokio::test]
async fn test_health_counts_open_streams() {
    let server = TestServer::start().await.unwrap();
    let _a1 = server.open_stream("a1").await.unwrap();
    let _a2 = server.open_stream("a1").await.unwrap();
    let _b = server.open_stream("b1").await.unwrap();

    let health: serde_json::Value = assert_json(server.get("/health").await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert_eq!(health["connections"], 3);
    assert_eq!(health["online_users"], 2);
}

#[tokio::test]
async fn test_closed_stream_leaves_registry() {
    // The next heartbeat write notices the dropped client
    let mut config = test_config();
    config.stream.heartbeat_interval_secs = 1;
    let server = TestServer::start_with_config(config).await.unwrap();
    let user = UserId::new("a1");

    let reader = server.open_stream("a1").await.unwrap();
    assert!(server.state.registry().is_online(&user));

    drop(reader);
    let registry = server.state.registry().clone();
    assert!(eventually(|| !registry.is_online(&user)).await);
}

#[tokio::test]
async fn test_heartbeat_on_open_stream() {
    let mut config = test_config();
    config.stream.heartbeat_interval_secs = 1;
    let server = TestServer::start_with_config(config).await.unwrap();

    let mut reader = server.open_stream("a1").await.unwrap();
    let event = reader.expect(EventKind::Heartbeat).await.unwrap();
    assert!(matches!(event, ServerEvent::Heartbeat { .. }));
}

#[tokio::test]
async fn test_shutdown_closes_streams() {
    let server = TestServer::start().await.unwrap();
    let mut reader = server.open_stream("a1").await.unwrap();

    server.shutdown().await.unwrap();
    assert!(reader.ends().await);
}

// ============================================================================
// Delivery scenarios
// ============================================================================

#[tokio::test]
async fn test_send_reaches_every_stream_of_both_parties() {
    let server = TestServer::start().await.unwrap();
    let mut alice_1 = server.open_stream("a1").await.unwrap();
    let mut alice_2 = server.open_stream("a1").await.unwrap();
    let mut bob = server.open_stream("b1").await.unwrap();
    let mut carol = server.open_stream("c1").await.unwrap();

    let sent: Message = assert_json(
        server
            .post_auth(
                "/api/v1/messages",
                &server.token("a1"),
                &SendMessage {
                    receiver_id: "b1",
                    text: "hi",
                },
            )
            .await
            .unwrap(),
        StatusCode::CREATED,
    )
    .await
    .unwrap();

    for reader in [&mut alice_1, &mut alice_2, &mut bob] {
        let pushed = message(reader.expect(EventKind::Message).await.unwrap());
        assert_eq!(pushed, sent);
    }

    for reader in [&mut alice_1, &mut alice_2] {
        let list = conversations(reader.expect(EventKind::Conversations).await.unwrap());
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].user.id, UserId::new("b1"));
        assert_eq!(list[0].last_message.text, "hi");
        assert_eq!(list[0].unread_count, 0);
    }

    let list = conversations(bob.expect(EventKind::Conversations).await.unwrap());
    assert_eq!(list[0].user.id, UserId::new("a1"));
    assert_eq!(list[0].user.name, "Alice");
    assert_eq!(list[0].last_message.text, "hi");
    assert_eq!(list[0].unread_count, 1);

    assert!(carol.is_quiet_for(Duration::from_millis(300)).await);
}

#[tokio::test]
async fn test_mark_read_pushes_to_reader_and_peer() {
    let server = TestServer::start().await.unwrap();
    let alice_token = server.token("a1");
    let bob_token = server.token("b1");

    for text in ["hi", "you there?"] {
        let response = server
            .post_auth(
                "/api/v1/messages",
                &alice_token,
                &SendMessage {
                    receiver_id: "b1",
                    text,
                },
            )
            .await
            .unwrap();
        assert_status(response, StatusCode::CREATED).await.unwrap();
    }

    let mut alice = server.open_stream("a1").await.unwrap();
    let mut bob = server.open_stream("b1").await.unwrap();

    let marked: serde_json::Value = assert_json(
        server
            .post_auth("/api/v1/conversations/a1/read", &bob_token, &serde_json::json!({}))
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(marked["updated"], 2);

    let list = conversations(bob.expect(EventKind::Conversations).await.unwrap());
    assert_eq!(list[0].user.id, UserId::new("a1"));
    assert_eq!(list[0].unread_count, 0);

    let list = conversations(alice.expect(EventKind::Conversations).await.unwrap());
    assert_eq!(list[0].user.id, UserId::new("b1"));
    assert_eq!(list[0].last_message.text, "you there?");
    assert!(list[0].last_message.read_at.is_some());
    assert_eq!(list[0].unread_count, 0);

    // A new unread message from the peer counts again
    let response = server
        .post_auth(
            "/api/v1/messages",
            &alice_token,
            &SendMessage {
                receiver_id: "b1",
                text: "ping",
            },
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::CREATED).await.unwrap();
    bob.expect(EventKind::Message).await.unwrap();
    let list = conversations(bob.expect(EventKind::Conversations).await.unwrap());
    assert_eq!(list[0].unread_count, 1);
}

#[tokio::test]
async fn test_send_to_offline_user_is_persisted() {
    let server = TestServer::start().await.unwrap();

    let response = server
        .post_auth(
            "/api/v1/messages",
            &server.token("a1"),
            &SendMessage {
                receiver_id: "b1",
                text: "see you later",
            },
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::CREATED).await.unwrap();

    let history: Vec<Message> = assert_json(
        server
            .get_auth("/api/v1/conversations/a1/messages", &server.token("b1"))
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].text, "see you later");
}

#[tokio::test]
async fn test_invalid_send_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let token = server.token("a1");

    let response = server
        .post_auth(
            "/api/v1/messages",
            &token,
            &SendMessage {
                receiver_id: "b1",
                text: "  ",
            },
        )
        .await
        .unwrap();
    let body: serde_json::Value = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(body["error"]["code"], "EMPTY_MESSAGE");

    let long = "x".repeat(4001);
    let response = server
        .post_auth(
            "/api/v1/messages",
            &token,
            &SendMessage {
                receiver_id: "b1",
                text: &long,
            },
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}
