use atrium_core::chat::{ChatRequest, ChatTransport, HistoryEntry, MessageRole};
use atrium_interaction::{
    AuthClient, CompletionClient, CompletionError, HttpChatTransport, UpstreamMessage,
};
use futures::StreamExt;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/event-stream")
}

fn chat_request() -> ChatRequest {
    ChatRequest {
        persona_id: "strategist".to_string(),
        message: "Hello?".to_string(),
        history: vec![HistoryEntry {
            role: MessageRole::User,
            content: "earlier".to_string(),
        }],
        guest_id: Some("guest-1".to_string()),
    }
}

#[tokio::test]
async fn test_chat_transport_streams_running_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(serde_json::json!({
            "persona_id": "strategist",
            "guest_id": "guest-1"
        })))
        .respond_with(sse(
            ": keep-alive\n\ndata: {\"content\":\"H\"}\n\ndata: {\"content\":\"e\"}\n\ndata: {\"content\":\"llo\"}\n\ndata: [DONE]\n\n",
        ))
        .mount(&server)
        .await;

    let transport = HttpChatTransport::new(server.uri());
    let stream = transport.open(&chat_request()).await.unwrap();
    let items: Vec<String> = stream.map(|item| item.unwrap()).collect().await;

    assert_eq!(items, vec!["H", "He", "Hello"]);
}

#[tokio::test]
async fn test_chat_transport_non_success_fails_before_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(502).set_body_json(serde_json::json!({"detail": "Upstream unavailable"})),
        )
        .mount(&server)
        .await;

    let transport = HttpChatTransport::new(format!("{}/", server.uri()));
    let err = match transport.open(&chat_request()).await {
        Ok(_) => panic!("expected failure"),
        Err(e) => e,
    };

    assert!(err.is_transport());
    assert!(err.to_string().contains("Upstream unavailable"));
}

#[tokio::test]
async fn test_chat_transport_error_frame_keeps_partial() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(sse(
            "data: {\"content\":\"Hel\"}\n\ndata: {\"error\":\"Upstream timed out\"}\n\n",
        ))
        .mount(&server)
        .await;

    let transport = HttpChatTransport::new(server.uri());
    let items: Vec<_> = transport.open(&chat_request()).await.unwrap().collect().await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_deref().unwrap(), "Hel");
    assert!(items[1].as_ref().unwrap_err().to_string().contains("Upstream timed out"));
}

#[tokio::test]
async fn test_completion_client_yields_deltas() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({"stream": true, "model": "test-model"})))
        .respond_with(sse(concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Good \"}}]}\n\n",
            "data: not-json\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"morning\"}}]}\n\n",
            "data: [DONE]\n\n",
        )))
        .mount(&server)
        .await;

    let client = CompletionClient::new(server.uri(), "sk-test", "test-model");
    let stream = client
        .stream(vec![UpstreamMessage::new(MessageRole::User, "hi")])
        .await
        .unwrap();
    let deltas: Vec<String> = stream.map(|item| item.unwrap()).collect().await;

    assert_eq!(deltas, vec!["Good ", "morning"]);
}

#[tokio::test]
async fn test_completion_client_error_frame_is_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse(concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Par\"}}]}\n\n",
            "data: {\"error\":{\"message\":\"The server had an error\"}}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"tial\"}}]}\n\n",
        )))
        .mount(&server)
        .await;

    let client = CompletionClient::new(server.uri(), "sk-test", "test-model");
    let items: Vec<_> = client.stream(vec![]).await.unwrap().collect().await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0], Ok("Par".to_string()));
    assert_eq!(
        items[1],
        Err(CompletionError::Stream("The server had an error".to_string()))
    );
}

#[tokio::test]
async fn test_completion_client_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {"message": "Rate limit reached"}
        })))
        .mount(&server)
        .await;

    let client = CompletionClient::new(server.uri(), "sk-test", "test-model");
    let err = match client.stream(vec![]).await {
        Ok(_) => panic!("expected failure"),
        Err(e) => e,
    };

    assert_eq!(
        err,
        CompletionError::Api {
            status: 429,
            message: "Rate limit reached".to_string()
        }
    );
}

#[tokio::test]
async fn test_auth_client_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_partial_json(serde_json::json!({"username": "a@b.c"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "token-123"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/auth"))
        .and(header("authorization", "Bearer token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "u1",
            "email": "a@b.c",
            "role": "user",
            "first_name": "Ann",
            "last_name": "Bee"
        })))
        .mount(&server)
        .await;

    let client = AuthClient::new(server.uri());
    let token = client.login("a@b.c", "pw").await.unwrap();
    let identity = client.whoami(&token.access_token).await.unwrap();

    assert_eq!(identity.email, "a@b.c");
    assert_eq!(identity.first_name, "Ann");
}

#[tokio::test]
async fn test_auth_client_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"detail": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let err = AuthClient::new(server.uri())
        .login("a@b.c", "wrong")
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert!(err.to_string().contains("Invalid credentials"));
}

#[tokio::test]
async fn test_persona_client_lists_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/personas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": "strategist",
                "name": "Mara",
                "role": "Strategy Consultant",
                "background": "Growth strategy",
                "communication_style": "Direct",
                "source": "System"
            }
        ])))
        .mount(&server)
        .await;

    let client = atrium_interaction::PersonaClient::new(server.uri());
    let persona = client.find("strategist").await.unwrap().unwrap();
    assert_eq!(persona.name, "Mara");
    assert!(client.find("missing").await.unwrap().is_none());
}
