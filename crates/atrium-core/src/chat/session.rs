//! Chat session state.
//!
//! `ChatSession` owns the per-partner message sequences and mediates every
//! mutation. Each mutation writes the whole conversation map to the
//! key-value store and publishes a [`ChatEvent`] so renderers can refresh.

use super::message::{HistoryEntry, Message, MessageRole};
use crate::error::{AtriumError, Result};
use crate::events::{EventBus, Subscription};
use crate::storage::{CONVERSATIONS_KEY, KeyValueStore};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Partner id -> ordered messages.
pub type Conversations = BTreeMap<String, Vec<Message>>;

/// Addresses the assistant message currently being streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHandle {
    partner_id: String,
    message_id: String,
}

impl StreamHandle {
    pub fn partner_id(&self) -> &str {
        &self.partner_id
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }
}

/// Notifications published after session mutations.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A message was appended to a conversation.
    MessageAppended { partner_id: String, message: Message },
    /// The streamed message's content was replaced.
    ContentUpdated {
        partner_id: String,
        message_id: String,
        content: String,
    },
    /// The stream for a partner finished (normally, by error, or cancelled).
    StreamEnded {
        partner_id: String,
        message_id: String,
    },
    /// A user-visible error was raised for a partner.
    Failed { partner_id: String, error: String },
    /// A conversation was cleared.
    ConversationReset { partner_id: String },
}

/// Per-partner conversation state backed by a key-value store.
pub struct ChatSession {
    conversations: Conversations,
    store: Arc<dyn KeyValueStore>,
    events: EventBus<ChatEvent>,
    /// Partner id -> id of the message being streamed
    streaming: HashMap<String, String>,
    /// Partner id -> last user-visible error
    errors: HashMap<String, String>,
}

impl ChatSession {
    /// Loads the session from `store`.
    ///
    /// A missing or unparseable snapshot yields an empty session; only a
    /// failing store read is reported as an error.
    pub async fn load(store: Arc<dyn KeyValueStore>, events: EventBus<ChatEvent>) -> Result<Self> {
        let conversations = match store.get(CONVERSATIONS_KEY).await? {
            None => Conversations::new(),
            Some(raw) => match serde_json::from_str::<Conversations>(&raw) {
                Ok(conversations) => conversations,
                Err(err) => {
                    tracing::warn!(error = %err, "Discarding unreadable conversation snapshot");
                    Conversations::new()
                }
            },
        };

        tracing::debug!(partners = conversations.len(), "Loaded chat session");

        Ok(Self {
            conversations,
            store,
            events,
            streaming: HashMap::new(),
            errors: HashMap::new(),
        })
    }

    /// Registers a renderer for session events.
    pub fn subscribe(&self) -> Subscription<ChatEvent> {
        self.events.subscribe()
    }

    /// All conversations keyed by partner id.
    pub fn conversations(&self) -> &Conversations {
        &self.conversations
    }

    /// Messages exchanged with `partner_id`, oldest first.
    pub fn conversation(&self, partner_id: &str) -> &[Message] {
        self.conversations
            .get(partner_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Creates the conversation for `partner_id` if this is the first visit.
    pub async fn open_conversation(&mut self, partner_id: &str) -> Result<()> {
        if self.conversations.contains_key(partner_id) {
            return Ok(());
        }
        self.conversations.insert(partner_id.to_string(), Vec::new());
        self.persist().await
    }

    /// Appends a user message.
    ///
    /// Whitespace-only text is ignored and `Ok(None)` is returned. Rejected
    /// while a reply to this partner is streaming, since the streamed
    /// message must stay last.
    pub async fn append_user_message(
        &mut self,
        partner_id: &str,
        text: &str,
    ) -> Result<Option<Message>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        if self.streaming.contains_key(partner_id) {
            return Err(AtriumError::StreamInProgress {
                partner_id: partner_id.to_string(),
            });
        }

        let message = Message::user(text);
        self.errors.remove(partner_id);
        self.push(partner_id, message.clone()).await?;
        Ok(Some(message))
    }

    /// Appends an empty assistant placeholder and marks the partner as
    /// streaming.
    pub async fn begin_assistant_stream(&mut self, partner_id: &str) -> Result<StreamHandle> {
        if self.streaming.contains_key(partner_id) {
            return Err(AtriumError::StreamInProgress {
                partner_id: partner_id.to_string(),
            });
        }

        let message = Message::assistant("");
        let handle = StreamHandle {
            partner_id: partner_id.to_string(),
            message_id: message.id.clone(),
        };
        self.streaming
            .insert(partner_id.to_string(), message.id.clone());
        if let Err(e) = self.push(partner_id, message).await {
            self.streaming.remove(partner_id);
            return Err(e);
        }
        Ok(handle)
    }

    /// Replaces the streamed message's content with `full_text`.
    ///
    /// Re-applying the same text is a no-op.
    pub async fn update_streaming_content(
        &mut self,
        handle: &StreamHandle,
        full_text: &str,
    ) -> Result<()> {
        if self.streaming.get(&handle.partner_id) != Some(&handle.message_id) {
            return Err(AtriumError::InvalidState(format!(
                "no active stream {} for '{}'",
                handle.message_id, handle.partner_id
            )));
        }

        let last = self
            .conversations
            .get_mut(&handle.partner_id)
            .and_then(|messages| messages.last_mut())
            .filter(|message| message.id == handle.message_id)
            .ok_or_else(|| {
                AtriumError::InvalidState(format!(
                    "streamed message {} is no longer the last message",
                    handle.message_id
                ))
            })?;

        if last.content == full_text {
            return Ok(());
        }
        last.content = full_text.to_string();

        self.persist().await?;
        self.events.publish(ChatEvent::ContentUpdated {
            partner_id: handle.partner_id.clone(),
            message_id: handle.message_id.clone(),
            content: full_text.to_string(),
        });
        Ok(())
    }

    /// Releases the partner's stream slot. Content stays as last published.
    pub fn end_stream(&mut self, handle: &StreamHandle) {
        if self.streaming.get(&handle.partner_id) == Some(&handle.message_id) {
            self.streaming.remove(&handle.partner_id);
            self.events.publish(ChatEvent::StreamEnded {
                partner_id: handle.partner_id.clone(),
                message_id: handle.message_id.clone(),
            });
        }
    }

    /// Whether a response is currently streaming for `partner_id`.
    pub fn is_streaming(&self, partner_id: &str) -> bool {
        self.streaming.contains_key(partner_id)
    }

    /// Records a user-visible error for `partner_id`.
    pub fn record_error(&mut self, partner_id: &str, error: impl Into<String>) {
        let error = error.into();
        self.errors.insert(partner_id.to_string(), error.clone());
        self.events.publish(ChatEvent::Failed {
            partner_id: partner_id.to_string(),
            error,
        });
    }

    /// The last error raised for `partner_id`, cleared by the next user message.
    pub fn last_error(&self, partner_id: &str) -> Option<&str> {
        self.errors.get(partner_id).map(String::as_str)
    }

    /// Removes every message exchanged with `partner_id`.
    pub async fn reset_conversation(&mut self, partner_id: &str) -> Result<()> {
        if self.is_streaming(partner_id) {
            return Err(AtriumError::StreamInProgress {
                partner_id: partner_id.to_string(),
            });
        }

        self.conversations.remove(partner_id);
        self.errors.remove(partner_id);
        self.persist().await?;
        self.events.publish(ChatEvent::ConversationReset {
            partner_id: partner_id.to_string(),
        });
        Ok(())
    }

    /// The last `limit` non-empty messages for `partner_id`, oldest first.
    pub fn recent_history(&self, partner_id: &str, limit: usize) -> Vec<HistoryEntry> {
        let messages: Vec<&Message> = self
            .conversation(partner_id)
            .iter()
            .filter(|m| m.role != MessageRole::System && !m.content.trim().is_empty())
            .collect();
        let skip = messages.len().saturating_sub(limit);
        messages.into_iter().skip(skip).map(HistoryEntry::from).collect()
    }

    /// Writes the whole conversation map to the store.
    pub async fn persist(&self) -> Result<()> {
        let snapshot = serde_json::to_string(&self.conversations)?;
        self.store.set(CONVERSATIONS_KEY, &snapshot).await
    }

    async fn push(&mut self, partner_id: &str, message: Message) -> Result<()> {
        self.conversations
            .entry(partner_id.to_string())
            .or_default()
            .push(message.clone());
        self.persist().await?;
        self.events.publish(ChatEvent::MessageAppended {
            partner_id: partner_id.to_string(),
            message,
        });
        Ok(())
    }
}
