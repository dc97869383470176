//! Conversation history and the store that owns it.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::llm::{Message, MessageRole};

use super::prompts::{EXAMPLE_PROMPT, EXAMPLE_RESPONSE, FIRST_TURN_PREFIX};

/// ID of the conversation used when a request names none.
pub const DEFAULT_CONVERSATION_ID: &str = "default";

/// Default idle timeout (30 minutes).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Format a user prompt for the history.
///
/// The first prompt of a conversation is introduced as the prompt to
/// optimize; follow-ups are feedback and pass through verbatim.
pub fn format_prompt(prompt: &str, is_followup: bool) -> String {
    if is_followup {
        prompt.to_string()
    } else {
        format!("{FIRST_TURN_PREFIX}{prompt}")
    }
}

fn seed_messages() -> Vec<Message> {
    vec![
        Message::user(EXAMPLE_PROMPT),
        Message::assistant(EXAMPLE_RESPONSE),
    ]
}

/// A single conversation.
///
/// Cloning is cheap and yields a handle to the same history.
#[derive(Debug, Clone)]
pub struct Conversation {
    inner: Arc<ConversationInner>,
}

#[derive(Debug)]
struct ConversationInner {
    id: String,
    messages: RwLock<Vec<Message>>,
    /// Number of leading seed messages.
    seed_len: usize,
    created_at: DateTime<Utc>,
    last_activity: RwLock<DateTime<Utc>>,
    /// Held for the whole of a turn so turns never interleave.
    turn_lock: Arc<Mutex<()>>,
}

impl Conversation {
    /// Create a seeded conversation with the given ID.
    pub(crate) fn new(id: String) -> Self {
        let seed = seed_messages();
        let now = Utc::now();
        Self {
            inner: Arc::new(ConversationInner {
                id,
                seed_len: seed.len(),
                messages: RwLock::new(seed),
                created_at: now,
                last_activity: RwLock::new(now),
                turn_lock: Arc::new(Mutex::new(())),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Wait for exclusive use of this conversation.
    pub async fn begin_turn(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.inner.turn_lock).lock_owned().await
    }

    pub fn add_user_message(&self, content: impl Into<String>) {
        self.add_message(Message::user(content));
    }

    pub fn add_model_message(&self, content: impl Into<String>) {
        self.add_message(Message::assistant(content));
    }

    pub fn add_message(&self, message: Message) {
        self.inner
            .messages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        self.touch();
    }

    /// Full history sent upstream, seed included.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.inner
            .messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages exchanged by the user, without the seed.
    #[must_use]
    pub fn transcript(&self) -> Vec<Message> {
        let guard = self
            .inner
            .messages
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard[self.inner.seed_len.min(guard.len())..].to_vec()
    }

    /// Number of messages in the transcript.
    #[must_use]
    pub fn message_count(&self) -> usize {
        let len = self
            .inner
            .messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        len.saturating_sub(self.inner.seed_len)
    }

    /// Content of the most recent model reply in the transcript.
    #[must_use]
    pub fn last_model_reply(&self) -> Option<String> {
        self.transcript()
            .into_iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
            .map(|m| m.content)
    }

    /// Drop the transcript, keeping the seed.
    pub fn reset(&self) {
        let mut guard = self
            .inner
            .messages
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.truncate(self.inner.seed_len);
        drop(guard);
        self.touch();
    }

    fn touch(&self) {
        *self
            .inner
            .last_activity
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Utc::now();
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        *self
            .inner
            .last_activity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Check if the conversation has been idle longer than `timeout`.
    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        match (Utc::now() - self.last_activity()).to_std() {
            Ok(idle) => idle > timeout,
            // Negative: clock skew.
            Err(_) => false,
        }
    }
}

/// Thread-safe store for conversations.
///
/// Always holds the default conversation, which is never expired.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    inner: Arc<RwLock<HashMap<String, Conversation>>>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    #[must_use]
    pub fn new() -> Self {
        let default = Conversation::new(DEFAULT_CONVERSATION_ID.to_string());
        let mut map = HashMap::new();
        map.insert(DEFAULT_CONVERSATION_ID.to_string(), default);
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// The process-wide default conversation.
    #[must_use]
    pub fn default_conversation(&self) -> Conversation {
        self.get_or_create(DEFAULT_CONVERSATION_ID)
    }

    /// Resolve an optional session ID: blank or missing means the default.
    #[must_use]
    pub fn resolve(&self, session_id: Option<&str>) -> Conversation {
        match session_id.map(str::trim) {
            Some(id) if !id.is_empty() => self.get_or_create(id),
            _ => self.default_conversation(),
        }
    }

    /// Create a new conversation with a random ID.
    #[must_use]
    pub fn create(&self) -> Conversation {
        let conversation = Conversation::new(Uuid::new_v4().to_string());
        self.write()
            .insert(conversation.id().to_string(), conversation.clone());
        conversation
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Conversation> {
        self.read().get(id).cloned()
    }

    #[must_use]
    pub fn get_or_create(&self, id: &str) -> Conversation {
        if let Some(conversation) = self.get(id) {
            return conversation;
        }
        self.write()
            .entry(id.to_string())
            .or_insert_with(|| Conversation::new(id.to_string()))
            .clone()
    }

    /// Remove a conversation. The default conversation is reset instead.
    pub fn remove(&self, id: &str) -> Option<Conversation> {
        if id == DEFAULT_CONVERSATION_ID {
            let default = self.default_conversation();
            default.reset();
            return Some(default);
        }
        self.write().remove(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// List all conversation IDs.
    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Remove conversations idle longer than `timeout`.
    ///
    /// Returns the number removed.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self.write();
        let before = guard.len();
        guard.retain(|id, c| id == DEFAULT_CONVERSATION_ID || !c.is_expired_with_timeout(timeout));
        before - guard.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Conversation>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Conversation>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
