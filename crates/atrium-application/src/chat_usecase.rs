//! Chat use case.
//!
//! Coordinates one send: records the user message, opens the relay stream,
//! applies running text to the session as it arrives and finalizes the
//! assistant message. The session lock is taken per mutation and never held
//! across a network await.

use atrium_core::chat::{ChatEvent, ChatRequest, ChatSession, ChatTransport, Message};
use atrium_core::error::{AtriumError, Result};
use atrium_core::events::Subscription;
use atrium_core::guest::GuestIdentity;
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Result of a send that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The text was blank; nothing was recorded or sent.
    Ignored,
    /// The response streamed to completion.
    Completed(Message),
    /// Cancelled by the caller. Holds the partial assistant message if
    /// streaming had started.
    Cancelled(Option<Message>),
}

/// Sends user messages to personas and streams their replies into the
/// session.
pub struct ChatUseCase {
    session: Arc<Mutex<ChatSession>>,
    transport: Arc<dyn ChatTransport>,
    guest: GuestIdentity,
    history_limit: usize,
    /// Partners with a send in flight, including the window before the
    /// assistant placeholder exists
    in_flight: StdMutex<HashSet<String>>,
}

impl ChatUseCase {
    pub fn new(
        session: Arc<Mutex<ChatSession>>,
        transport: Arc<dyn ChatTransport>,
        guest: GuestIdentity,
        history_limit: usize,
    ) -> Self {
        Self {
            session,
            transport,
            guest,
            history_limit,
            in_flight: StdMutex::new(HashSet::new()),
        }
    }

    pub fn session(&self) -> Arc<Mutex<ChatSession>> {
        self.session.clone()
    }

    pub async fn subscribe(&self) -> Subscription<ChatEvent> {
        self.session.lock().await.subscribe()
    }

    /// Messages exchanged with `partner_id`, oldest first.
    pub async fn history(&self, partner_id: &str) -> Vec<Message> {
        self.session.lock().await.conversation(partner_id).to_vec()
    }

    pub async fn open_conversation(&self, partner_id: &str) -> Result<()> {
        self.session.lock().await.open_conversation(partner_id).await
    }

    pub async fn reset(&self, partner_id: &str) -> Result<()> {
        if self.is_in_flight(partner_id) {
            return Err(AtriumError::StreamInProgress {
                partner_id: partner_id.to_string(),
            });
        }
        self.session.lock().await.reset_conversation(partner_id).await
    }

    /// Sends `text` to `partner_id` and streams the reply into the session.
    ///
    /// Failures before streaming leave only the user message behind. A
    /// mid-stream failure keeps the partial assistant content. Either way the
    /// error is also recorded on the session for display.
    pub async fn send_message(
        &self,
        partner_id: &str,
        text: &str,
        cancel: CancellationToken,
    ) -> Result<SendOutcome> {
        if text.trim().is_empty() {
            return Ok(SendOutcome::Ignored);
        }

        let _slot = self.reserve(partner_id)?;
        if self.session.lock().await.is_streaming(partner_id) {
            return Err(AtriumError::StreamInProgress {
                partner_id: partner_id.to_string(),
            });
        }

        let guest_id = match self.guest.get_or_create().await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(error = %e, "Sending without a guest id");
                None
            }
        };

        let request = {
            let mut session = self.session.lock().await;
            let history = session.recent_history(partner_id, self.history_limit);
            session.append_user_message(partner_id, text).await?;
            ChatRequest {
                persona_id: partner_id.to_string(),
                message: text.to_string(),
                history,
                guest_id,
            }
        };

        tracing::debug!(partner = %partner_id, history = request.history.len(), "Opening chat stream");
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(SendOutcome::Cancelled(None)),
            opened = self.transport.open(&request) => opened,
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                self.session.lock().await.record_error(partner_id, e.to_string());
                return Err(e);
            }
        };

        let handle = self
            .session
            .lock()
            .await
            .begin_assistant_stream(partner_id)
            .await?;

        let result = loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ok(false),
                item = stream.next() => item,
            };

            match item {
                Some(Ok(full_text)) => {
                    let mut session = self.session.lock().await;
                    if let Err(e) = session.update_streaming_content(&handle, &full_text).await {
                        break Err(e);
                    }
                }
                Some(Err(e)) => {
                    self.session.lock().await.record_error(partner_id, e.to_string());
                    break Err(e);
                }
                None => break Ok(true),
            }
        };
        // Closes the connection if the stream was abandoned early
        drop(stream);

        let mut session = self.session.lock().await;
        session.end_stream(&handle);
        let message = session
            .conversation(partner_id)
            .iter()
            .rev()
            .find(|m| m.id == handle.message_id())
            .cloned();

        match result {
            Ok(true) => {
                tracing::debug!(partner = %partner_id, "Chat stream completed");
                message
                    .map(SendOutcome::Completed)
                    .ok_or_else(|| AtriumError::internal("streamed message disappeared"))
            }
            Ok(false) => {
                tracing::info!(partner = %partner_id, "Chat stream cancelled");
                Ok(SendOutcome::Cancelled(message))
            }
            Err(e) => {
                tracing::warn!(partner = %partner_id, error = %e, "Chat stream failed");
                Err(e)
            }
        }
    }

    fn is_in_flight(&self, partner_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(partner_id)
    }

    fn reserve(&self, partner_id: &str) -> Result<InFlightSlot<'_>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !in_flight.insert(partner_id.to_string()) {
            return Err(AtriumError::StreamInProgress {
                partner_id: partner_id.to_string(),
            });
        }
        Ok(InFlightSlot {
            set: &self.in_flight,
            partner_id: partner_id.to_string(),
        })
    }
}

/// Releases a partner's in-flight reservation on drop.
struct InFlightSlot<'a> {
    set: &'a StdMutex<HashSet<String>>,
    partner_id: String,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.partner_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use atrium_core::chat::{ContentStream, MessageRole};
    use atrium_core::events::EventBus;
    use atrium_infrastructure::InMemoryKeyValueStore;
    use futures::stream;
    use std::sync::Mutex as SyncMutex;

    /// Replays a fixed script and records the requests it receives.
    struct ScriptedTransport {
        script: SyncMutex<Option<Result<Vec<Result<String>>>>>,
        requests: SyncMutex<Vec<ChatRequest>>,
        pending_forever: bool,
    }

    impl ScriptedTransport {
        fn new(script: Result<Vec<Result<String>>>) -> Self {
            Self {
                script: SyncMutex::new(Some(script)),
                requests: SyncMutex::new(Vec::new()),
                pending_forever: false,
            }
        }

        fn hanging(prefix: Vec<Result<String>>) -> Self {
            Self {
                pending_forever: true,
                ..Self::new(Ok(prefix))
            }
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn open(&self, request: &ChatRequest) -> Result<ContentStream> {
            self.requests.lock().unwrap().push(request.clone());
            let items = self.script.lock().unwrap().take().unwrap_or(Ok(Vec::new()))?;
            let head = stream::iter(items);
            if self.pending_forever {
                Ok(head.chain(stream::pending()).boxed())
            } else {
                Ok(head.boxed())
            }
        }
    }

    fn running(parts: &[&str]) -> Vec<Result<String>> {
        parts.iter().map(|p| Ok(p.to_string())).collect()
    }

    async fn usecase(transport: Arc<ScriptedTransport>) -> ChatUseCase {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let session = ChatSession::load(store.clone(), EventBus::new()).await.unwrap();
        ChatUseCase::new(
            Arc::new(Mutex::new(session)),
            transport,
            GuestIdentity::new(store),
            10,
        )
    }

    #[tokio::test]
    async fn test_streamed_reply_is_finalized() {
        let transport = Arc::new(ScriptedTransport::new(Ok(running(&["H", "He", "Hello"]))));
        let chat = usecase(transport.clone()).await;
        let mut events = chat.subscribe().await;

        let outcome = chat
            .send_message("strategist", "Hi there", CancellationToken::new())
            .await
            .unwrap();

        let SendOutcome::Completed(message) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(message.content, "Hello");
        assert_eq!(message.role, MessageRole::Assistant);

        let history = chat.history("strategist").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "Hi there");

        let mut updates = Vec::new();
        while let Some(event) = events.try_recv() {
            if let ChatEvent::ContentUpdated { content, .. } = event {
                updates.push(content);
            }
        }
        assert_eq!(updates, vec!["H", "He", "Hello"]);

        let request = &transport.requests()[0];
        assert_eq!(request.persona_id, "strategist");
        assert!(request.history.is_empty());
        assert!(request.guest_id.is_some());
    }

    #[tokio::test]
    async fn test_blank_message_sends_nothing() {
        let transport = Arc::new(ScriptedTransport::new(Ok(running(&["x"]))));
        let chat = usecase(transport.clone()).await;

        let outcome = chat
            .send_message("strategist", "   ", CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, SendOutcome::Ignored);
        assert!(transport.requests().is_empty());
        assert!(chat.history("strategist").await.is_empty());
    }

    #[tokio::test]
    async fn test_open_failure_leaves_only_user_message() {
        let transport = Arc::new(ScriptedTransport::new(Err(AtriumError::transport(
            "connection refused",
        ))));
        let chat = usecase(transport).await;

        let err = chat
            .send_message("engineer", "ping", CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_transport());

        let history = chat.history("engineer").await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, MessageRole::User);

        let session = chat.session();
        let session = session.lock().await;
        assert!(session.last_error("engineer").is_some());
        assert!(!session.is_streaming("engineer"));
    }

    #[tokio::test]
    async fn test_mid_stream_error_keeps_partial_content() {
        let mut script = running(&["Hel"]);
        script.push(Err(AtriumError::transport("Upstream unavailable")));
        let transport = Arc::new(ScriptedTransport::new(Ok(script)));
        let chat = usecase(transport).await;

        let err = chat
            .send_message("designer", "sketch?", CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Upstream unavailable"));

        let history = chat.history("designer").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "Hel");

        // The slot is free again
        let session = chat.session();
        assert!(!session.lock().await.is_streaming("designer"));
    }

    #[tokio::test]
    async fn test_history_precedes_new_message() {
        let transport = Arc::new(ScriptedTransport::new(Ok(running(&["first reply"]))));
        let chat = usecase(transport.clone()).await;
        chat.send_message("strategist", "first", CancellationToken::new())
            .await
            .unwrap();

        *transport.script.lock().unwrap() = Some(Ok(running(&["second reply"])));
        chat.send_message("strategist", "second", CancellationToken::new())
            .await
            .unwrap();

        let second = &transport.requests()[1];
        assert_eq!(second.message, "second");
        let contents: Vec<&str> = second.history.iter().map(|h| h.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "first reply"]);
    }

    #[tokio::test]
    async fn test_cancel_keeps_partial_and_releases_slot() {
        let transport = Arc::new(ScriptedTransport::hanging(running(&["Par", "Partial"])));
        let chat = Arc::new(usecase(transport).await);
        let mut events = chat.subscribe().await;
        let cancel = CancellationToken::new();

        let task = {
            let chat = chat.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { chat.send_message("engineer", "long answer", cancel).await })
        };

        // Wait until the second delta has been applied
        loop {
            if let Some(ChatEvent::ContentUpdated { content, .. }) = events.recv().await {
                if content == "Partial" {
                    break;
                }
            }
        }
        cancel.cancel();

        let outcome = task.await.unwrap().unwrap();
        let SendOutcome::Cancelled(Some(message)) = outcome else {
            panic!("expected cancellation with partial message");
        };
        assert_eq!(message.content, "Partial");

        let session = chat.session();
        assert!(!session.lock().await.is_streaming("engineer"));
        chat.reset("engineer").await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_send_to_same_partner_is_rejected() {
        let transport = Arc::new(ScriptedTransport::hanging(running(&["..."])));
        let chat = Arc::new(usecase(transport).await);
        let mut events = chat.subscribe().await;
        let cancel = CancellationToken::new();

        let task = {
            let chat = chat.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { chat.send_message("strategist", "one", cancel).await })
        };
        while !matches!(events.recv().await, Some(ChatEvent::ContentUpdated { .. })) {}

        let err = chat
            .send_message("strategist", "two", CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AtriumError::StreamInProgress { .. }));
        assert!(matches!(
            chat.reset("strategist").await,
            Err(AtriumError::StreamInProgress { .. })
        ));

        cancel.cancel();
        task.await.unwrap().unwrap();
    }
}
