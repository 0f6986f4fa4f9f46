//! Per-user conversation memory
//!
//! Bounded history of recent exchanges, keyed by user id. Process
//! lifetime only: a restart clears everything and no persistence is
//! attempted. The bound is per user, so one chatty user cannot evict
//! another user's context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Messages retained per user (an exchange appends two). Oldest are
/// evicted first.
pub const HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    fn speaker(&self) -> &'static str {
        match self {
            MessageRole::User => "User",
            MessageRole::Assistant => "Bot",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub message_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub role: MessageRole,
    pub content: String,
}

impl ConversationMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            role,
            content: content.into(),
        }
    }
}

/// One user's rolling window of messages.
#[derive(Debug, Default)]
struct ConversationHistory {
    messages: VecDeque<ConversationMessage>,
}

impl ConversationHistory {
    fn push(&mut self, message: ConversationMessage) {
        if self.messages.len() >= HISTORY_CAPACITY {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }
}

/// In-memory conversation store shared across handlers.
#[derive(Default)]
pub struct MemoryStore {
    histories: Arc<RwLock<HashMap<i64, ConversationHistory>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed exchange: the user's message followed by the
    /// reply that was sent.
    pub async fn append_exchange(&self, user_id: i64, user_message: &str, reply: &str) {
        let mut histories = self.histories.write().await;
        let history = histories.entry(user_id).or_default();
        history.push(ConversationMessage::new(MessageRole::User, user_message));
        history.push(ConversationMessage::new(MessageRole::Assistant, reply));
        debug!(
            user_id,
            message_count = history.messages.len(),
            "conversation exchange recorded"
        );
    }

    /// History rendered for prompt injection, oldest first, one
    /// `Speaker: text` line per message. Empty string for unknown users.
    pub async fn formatted_history(&self, user_id: i64) -> String {
        let histories = self.histories.read().await;
        match histories.get(&user_id) {
            Some(history) => history
                .messages
                .iter()
                .map(|m| format!("{}: {}", m.role.speaker(), m.content))
                .collect::<Vec<_>>()
                .join("\n"),
            None => String::new(),
        }
    }

    pub async fn clear(&self, user_id: i64) {
        let mut histories = self.histories.write().await;
        histories.remove(&user_id);
    }
}
