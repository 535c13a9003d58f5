//! Conversation history management.
//!
//! `HistoryManager` keeps a sliding window over the transcript, bounded both by message
//! count and by an estimated token budget, next to a pinned system message that is
//! never evicted.
//!
//! After every append the window is restored to these invariants:
//! - the transcript holds at most `max_messages` entries;
//! - system tokens plus transcript tokens stay within `max_tokens`, unless the
//!   transcript is down to a single message (a lone oversized turn is kept);
//! - the transcript never starts with an assistant reply.

use std::collections::VecDeque;

use arcspec_core::{ChatMessage, ConfigError, ConfigRecord, HistorySummary, Role};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::token::estimate_tokens;

pub const DEFAULT_MAX_HISTORY_TOKENS: usize = 3000;
pub const DEFAULT_MAX_HISTORY_MESSAGES: usize = 20;

pub const MAX_HISTORY_TOKENS_KEY: &str = "max_history_tokens";
pub const MAX_HISTORY_MESSAGES_KEY: &str = "max_history_messages";
pub const PERSONALITY_KEY: &str = "Personality";

/// Limits for a history window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Token budget shared by the system message and the transcript
    pub max_tokens: usize,
    /// Maximum number of transcript messages (system message excluded)
    pub max_messages: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_HISTORY_TOKENS,
            max_messages: DEFAULT_MAX_HISTORY_MESSAGES,
        }
    }
}

impl HistoryConfig {
    #[must_use]
    pub const fn with_max_messages(mut self, max: usize) -> Self {
        self.max_messages = max;
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = max;
        self
    }

    /// Read `max_history_tokens` / `max_history_messages`, falling back to the defaults.
    pub fn from_config(config: &ConfigRecord) -> Result<Self, ConfigError> {
        Ok(Self {
            max_tokens: config
                .positive_usize_or(MAX_HISTORY_TOKENS_KEY, DEFAULT_MAX_HISTORY_TOKENS)?,
            max_messages: config
                .positive_usize_or(MAX_HISTORY_MESSAGES_KEY, DEFAULT_MAX_HISTORY_MESSAGES)?,
        })
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.max_tokens == 0 {
            return Err(ConfigError::invalid(MAX_HISTORY_TOKENS_KEY, "must be > 0"));
        }
        if self.max_messages == 0 {
            return Err(ConfigError::invalid(MAX_HISTORY_MESSAGES_KEY, "must be > 0"));
        }
        Ok(self)
    }
}

/// A single recorded turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    role: Role,
    content: String,
    tokens: usize,
    created_at: Option<DateTime<Utc>>,
}

impl Message {
    fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            tokens: estimate_tokens(content),
            created_at: Some(Utc::now()),
        }
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub const fn tokens(&self) -> usize {
        self.tokens
    }

    #[must_use]
    pub const fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Project onto the role/content pair sent to an API.
    #[must_use]
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage::new(self.role, self.content.clone())
    }
}

/// Bounded, token-aware transcript with a pinned system message.
///
/// Not synchronized: one manager belongs to one parser instance.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    config: HistoryConfig,
    system_message: Option<Message>,
    transcript: VecDeque<Message>,
}

impl HistoryManager {
    /// Create an empty history. Both limits must be positive.
    pub fn new(max_tokens: usize, max_messages: usize) -> Result<Self, ConfigError> {
        Self::with_config(HistoryConfig {
            max_tokens,
            max_messages,
        })
    }

    pub fn with_config(config: HistoryConfig) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        debug!(
            "History manager initialised: max_tokens={}, max_messages={}",
            config.max_tokens, config.max_messages
        );
        Ok(Self {
            config,
            system_message: None,
            transcript: VecDeque::new(),
        })
    }

    /// Size the history from a parser configuration record and pin its `Personality`,
    /// if one is set.
    pub fn from_config(config: &ConfigRecord) -> Result<Self, ConfigError> {
        let mut manager = Self::with_config(HistoryConfig::from_config(config)?)?;
        match config.get_str(PERSONALITY_KEY)? {
            Some(persona) if !persona.is_empty() => manager.set_system_message(persona),
            _ => {}
        }
        Ok(manager)
    }

    /// Replace the pinned system message. The transcript is left alone.
    pub fn set_system_message(&mut self, content: &str) {
        let message = Message::new(Role::System, content);
        debug!("System message set, tokens: {}", message.tokens);
        self.system_message = Some(message);
    }

    pub fn add_user_message(&mut self, content: &str) {
        self.push(Role::User, content);
    }

    pub fn add_assistant_message(&mut self, content: &str) {
        self.push(Role::Assistant, content);
    }

    pub fn add_function_message(&mut self, content: &str) {
        self.push(Role::Function, content);
    }

    fn push(&mut self, role: Role, content: &str) {
        let message = Message::new(role, content);
        debug!("Adding {role} message, tokens: {}", message.tokens);
        self.transcript.push_back(message);
        self.evict();
    }

    fn evict(&mut self) {
        while self.transcript.len() > self.config.max_messages {
            if let Some(removed) = self.transcript.pop_front() {
                debug!("Message cap reached, evicted oldest {} message", removed.role);
            }
        }

        // A single message is kept even when it alone exceeds the budget.
        while self.total_tokens() > self.config.max_tokens && self.transcript.len() > 1 {
            if let Some(removed) = self.transcript.pop_front() {
                debug!("Token budget exceeded, evicted oldest {} message", removed.role);
            }
        }

        while self
            .transcript
            .front()
            .is_some_and(|m| m.role == Role::Assistant)
        {
            self.transcript.pop_front();
            debug!("Dropped orphaned assistant reply at window start");
        }
    }

    /// System message (if any) followed by the retained transcript.
    #[must_use]
    pub fn messages_for_api(&self) -> Vec<ChatMessage> {
        self.system_message
            .iter()
            .chain(self.transcript.iter())
            .map(Message::to_chat_message)
            .collect()
    }

    /// Empty the transcript. The system message stays pinned.
    pub fn clear(&mut self) {
        self.transcript.clear();
        debug!("History cleared");
    }

    #[must_use]
    pub fn total_tokens(&self) -> usize {
        let system = self.system_message.as_ref().map_or(0, Message::tokens);
        system + self.transcript.iter().map(Message::tokens).sum::<usize>()
    }

    /// Number of transcript messages; the system message is not counted.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.transcript.len()
    }

    #[must_use]
    pub const fn system_message(&self) -> Option<&Message> {
        self.system_message.as_ref()
    }

    pub fn transcript(&self) -> impl Iterator<Item = &Message> {
        self.transcript.iter()
    }

    #[must_use]
    pub const fn config(&self) -> HistoryConfig {
        self.config
    }

    #[must_use]
    pub fn summary(&self) -> HistorySummary {
        HistorySummary {
            message_count: self.message_count(),
            total_tokens: self.total_tokens(),
            max_tokens: self.config.max_tokens,
            max_messages: self.config.max_messages,
            has_system_message: self.system_message.is_some(),
        }
    }
}
