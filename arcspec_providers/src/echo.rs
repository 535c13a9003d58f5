use arcspec_conversation::{HistoryManager, PERSONALITY_KEY};
use arcspec_core::{ConfigRecord, HistorySummary, ModelInfo, Parser, ParserError, ParserSpec};
use async_trait::async_trait;
use serde_json::Map;
use tracing::debug;

use crate::openai::DEFAULT_FALLBACK_REPLY;

/// Offline backend that answers with the message it was given.
///
/// Useful for trying profiles and the chat loop without network access; it runs
/// through the same history handling as a real backend.
pub struct EchoParser {
    model: String,
    personality: String,
    fallback_reply: String,
    history: HistoryManager,
}

impl EchoParser {
    fn reply_to(&self, message: &str) -> String {
        let message = message.trim();
        if message.is_empty() {
            String::new()
        } else {
            format!("[echo:{}] {message}", self.model)
        }
    }
}

#[async_trait]
impl Parser for EchoParser {
    async fn chat(&mut self, message: &str) -> Result<String, ParserError> {
        let reply = self.reply_to(message);
        self.history.add_user_message(message);
        if reply.is_empty() {
            return Ok(self.fallback_reply.clone());
        }
        self.history.add_assistant_message(&reply);
        debug!(
            "Echo history: {} messages, {} tokens",
            self.history.message_count(),
            self.history.total_tokens()
        );
        Ok(reply)
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            parser: Self::TYPE_NAME.to_string(),
            model: self.model.clone(),
            base_url: None,
            temperature: None,
            max_tokens: None,
            top_p: None,
            personality: self.personality.clone(),
            stream_enabled: false,
            multimodal: false,
            extra_params: Map::new(),
            extra_body: Map::new(),
            history_summary: self.history.summary(),
        }
    }

    fn clear_history(&mut self) {
        self.history.clear();
        if !self.personality.is_empty() {
            self.history.set_system_message(&self.personality);
        }
    }

    fn history_summary(&self) -> HistorySummary {
        self.history.summary()
    }
}

impl ParserSpec for EchoParser {
    const TYPE_NAME: &'static str = "EchoParser";
    const MODULE_NAME: &'static str = "echo";
    const PARSER_DESCRIPTION: &'static str = "Offline backend that repeats the message";

    fn from_config(config: ConfigRecord) -> Result<Self, ParserError> {
        Ok(Self {
            model: config.require_str("Model")?.to_string(),
            personality: config.str_or(PERSONALITY_KEY, "")?,
            fallback_reply: config.str_or("if_return_none", DEFAULT_FALLBACK_REPLY)?,
            history: HistoryManager::from_config(&config)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcspec_core::Role;

    fn parser() -> EchoParser {
        EchoParser::from_config(
            ConfigRecord::new()
                .with("Model", "m")
                .with("Personality", "be brief")
                .with("if_return_none", "nothing"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn echoes_and_records_both_turns() {
        let mut p = parser();
        assert_eq!(p.chat("hello").await.unwrap(), "[echo:m] hello");
        assert_eq!(p.history_summary().message_count, 2);
        assert!(p.history_summary().has_system_message);
    }

    #[tokio::test]
    async fn empty_reply_uses_fallback_without_recording_it() {
        let mut p = parser();
        assert_eq!(p.chat("   ").await.unwrap(), "nothing");
        let roles: Vec<Role> = p.history.transcript().map(|m| m.role()).collect();
        assert_eq!(roles, vec![Role::User]);
    }

    #[tokio::test]
    async fn clear_keeps_persona() {
        let mut p = parser();
        p.chat("hello").await.unwrap();
        p.clear_history();
        let api = p.history.messages_for_api();
        assert_eq!(api.len(), 1);
        assert_eq!(api[0].content, "be brief");
    }
}
