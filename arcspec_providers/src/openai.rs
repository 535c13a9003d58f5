use std::env;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use arcspec_conversation::{HistoryManager, PERSONALITY_KEY};
use arcspec_core::{
    ChatMessage, ChunkSink, ConfigError, ConfigRecord, HistorySummary, MULTIMODAL_KEY, ModelInfo,
    Parser, ParserError, ParserSpec, Role,
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::stream::accumulate_sse;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_FALLBACK_REPLY: &str = "The model returned no content.";

const DEFAULT_TEMPERATURE: f64 = 0.5;
const DEFAULT_MAX_TOKENS: u64 = 1000;
const DEFAULT_TOP_P: f64 = 1.0;
const DEFAULT_RETRY_DELAY_SECS: u64 = 2;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Backend for any OpenAI-compatible `chat/completions` endpoint.
pub struct OpenAiParser {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: u64,
    top_p: f64,
    personality: String,
    stream: bool,
    multimodal: bool,
    extra_params: Map<String, Value>,
    extra_body: Map<String, Value>,
    fallback_reply: String,
    retry: RetryPolicy,
    history: HistoryManager,
    chunk_sink: Option<ChunkSink>,
}

fn resolve_api_key(config: &ConfigRecord) -> Result<String, ConfigError> {
    if let Some(var) = config.get_str("APIKeyEnv")? {
        match env::var(var) {
            Ok(key) if !key.trim().is_empty() => return Ok(key),
            _ => debug!("Environment variable {var} is not set, falling back to APIKey"),
        }
    }
    Ok(config.require_str("APIKey")?.to_string())
}

fn secs(config: &ConfigRecord, key: &str, default: u64) -> Result<Duration, ConfigError> {
    Ok(Duration::from_secs(config.get_u64(key)?.unwrap_or(default)))
}

/// Turn a non-2xx response into an error carrying the API's own message when it has one.
async fn ensure_success(response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body);
    bail!("API returned {status}: {detail}")
}

impl OpenAiParser {
    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Request body for `messages`. Pass-through parameters go in after the standard
    /// fields, `Extra_Body` after those, and `stream` always reflects this instance.
    #[must_use]
    pub fn build_payload(&self, messages: &[ChatMessage]) -> Value {
        let mut payload = Map::new();
        payload.insert("model".to_string(), json!(self.model));
        payload.insert("messages".to_string(), json!(messages));
        payload.insert("temperature".to_string(), json!(self.temperature));
        payload.insert("max_tokens".to_string(), json!(self.max_tokens));
        payload.insert("top_p".to_string(), json!(self.top_p));

        for (key, value) in self.extra_params.iter().chain(&self.extra_body) {
            payload.insert(key.clone(), value.clone());
        }
        payload.insert("stream".to_string(), Value::Bool(self.stream));

        Value::Object(payload)
    }

    async fn send_completion(&self, payload: &Value) -> anyhow::Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .context("request failed")?;

        let body: Value = ensure_success(response)
            .await?
            .json()
            .await
            .context("invalid response body")?;

        if body.get("choices").is_none() {
            return Err(anyhow!("Invalid response format: missing choices"));
        }
        Ok(body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    async fn open_stream(&self, payload: &Value) -> anyhow::Result<Response> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .context("request failed")?;
        ensure_success(response).await
    }

    async fn request_reply(&self, payload: &Value) -> Result<String, ParserError> {
        if !self.stream {
            return retry_with_backoff(|| self.send_completion(payload), self.retry)
                .await
                .map_err(ParserError::Backend);
        }

        let response = retry_with_backoff(|| self.open_stream(payload), self.retry)
            .await
            .map_err(ParserError::Backend)?;
        let sink = self.chunk_sink.as_ref();
        accumulate_sse(response.bytes_stream(), |chunk| {
            if let Some(sink) = sink {
                sink(chunk);
            }
        })
        .await
    }
}

#[async_trait]
impl Parser for OpenAiParser {
    async fn chat(&mut self, message: &str) -> Result<String, ParserError> {
        let mut messages = self.history.messages_for_api();
        messages.push(ChatMessage::new(Role::User, message));
        let payload = self.build_payload(&messages);

        info!(
            "Sending request: model={}, messages={}, stream={}",
            self.model,
            messages.len(),
            self.stream
        );
        let reply = self.request_reply(&payload).await?;
        info!("Received reply from {}", self.base_url);

        self.history.add_user_message(message);
        let reply = reply.trim();
        if reply.is_empty() {
            warn!("Empty reply from model {}; returning fallback text", self.model);
            return Ok(self.fallback_reply.clone());
        }
        self.history.add_assistant_message(reply);
        Ok(reply.to_string())
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            parser: Self::TYPE_NAME.to_string(),
            model: self.model.clone(),
            base_url: Some(self.base_url.clone()),
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            top_p: Some(self.top_p),
            personality: self.personality.clone(),
            stream_enabled: self.stream,
            multimodal: self.multimodal,
            extra_params: self.extra_params.clone(),
            extra_body: self.extra_body.clone(),
            history_summary: self.history.summary(),
        }
    }

    fn clear_history(&mut self) {
        self.history.clear();
        if !self.personality.is_empty() {
            self.history.set_system_message(&self.personality);
        }
        info!("Conversation history cleared");
    }

    fn history_summary(&self) -> HistorySummary {
        self.history.summary()
    }

    fn set_chunk_sink(&mut self, sink: ChunkSink) {
        self.chunk_sink = Some(sink);
    }
}

impl ParserSpec for OpenAiParser {
    const TYPE_NAME: &'static str = "OpenAiParser";
    const MODULE_NAME: &'static str = "openai";
    const PARSER_ALIASES: &'static [&'static str] = &["openai_compat", "gpt"];
    const PARSER_DESCRIPTION: &'static str = "OpenAI-compatible chat completions API";

    fn from_config(config: ConfigRecord) -> Result<Self, ParserError> {
        let model = config.require_str("Model")?.to_string();
        let api_key = resolve_api_key(&config)?;
        let base_url = config
            .str_or("BaseURL", DEFAULT_BASE_URL)?
            .trim_end_matches('/')
            .to_string();

        let extra_params = config.object_or_empty("other")?;
        let stream = match extra_params.get("stream") {
            Some(Value::Bool(b)) => *b,
            _ => config.get_bool("stream")?.unwrap_or(false),
        };

        let retry = RetryPolicy::new(
            u32::try_from(config.get_u64("max_retries")?.unwrap_or(0))
                .map_err(|_| ConfigError::invalid("max_retries", "out of range"))?,
            secs(&config, "retry_delay_secs", DEFAULT_RETRY_DELAY_SECS)?,
        );

        let client = Client::builder()
            .timeout(secs(&config, "timeout_secs", DEFAULT_TIMEOUT_SECS)?)
            .build()
            .map_err(|e| ParserError::Backend(e.into()))?;

        let parser = Self {
            client,
            api_key,
            base_url,
            model,
            temperature: config.f64_or("Temperature", DEFAULT_TEMPERATURE)?,
            max_tokens: config.get_u64("MaxTokens")?.unwrap_or(DEFAULT_MAX_TOKENS),
            top_p: config.f64_or("TopP", DEFAULT_TOP_P)?,
            personality: config.str_or(PERSONALITY_KEY, "")?,
            stream,
            multimodal: config.is_enabled(MULTIMODAL_KEY),
            extra_params,
            extra_body: config.object_or_empty("Extra_Body")?,
            fallback_reply: config.str_or("if_return_none", DEFAULT_FALLBACK_REPLY)?,
            retry,
            history: HistoryManager::from_config(&config)?,
            chunk_sink: None,
        };

        info!(
            "Created OpenAiParser: model={}, base_url={}, stream={}",
            parser.model, parser.base_url, parser.stream
        );
        Ok(parser)
    }
}
