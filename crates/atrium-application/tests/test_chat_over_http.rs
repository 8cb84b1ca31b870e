use atrium_application::{ChatUseCase, SendOutcome};
use atrium_core::chat::{ChatSession, MessageRole};
use atrium_core::events::EventBus;
use atrium_core::guest::GuestIdentity;
use atrium_infrastructure::InMemoryKeyValueStore;
use atrium_interaction::HttpChatTransport;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn chat_against(server: &MockServer) -> ChatUseCase {
    let store = Arc::new(InMemoryKeyValueStore::new());
    let session = ChatSession::load(store.clone(), EventBus::new()).await.unwrap();
    ChatUseCase::new(
        Arc::new(Mutex::new(session)),
        Arc::new(HttpChatTransport::new(server.uri())),
        GuestIdentity::new(store),
        10,
    )
}

#[tokio::test]
async fn test_relay_stream_lands_in_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"content\":\"Hel\"}\n\ndata: garbage\n\ndata: {\"content\":\"lo\"}\n\ndata: [DONE]\n\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let chat = chat_against(&server).await;
    let outcome = chat
        .send_message("strategist", "Hi", CancellationToken::new())
        .await
        .unwrap();

    match outcome {
        SendOutcome::Completed(message) => assert_eq!(message.content, "Hello"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_relay_rejection_records_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(serde_json::json!({"detail": "Unknown persona"})),
        )
        .mount(&server)
        .await;

    let chat = chat_against(&server).await;
    let err = chat
        .send_message("nobody", "Hi", CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Unknown persona"));

    let history = chat.history("nobody").await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, MessageRole::User);

    let session = chat.session();
    let session = session.lock().await;
    assert_eq!(session.last_error("nobody"), Some(err.to_string().as_str()));
}
