use std::fmt;

use anyhow::{Context, bail, ensure};
use arcspec_core::ConfigRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `it_multimodal_model` may be a plain switch or the name of the vision model.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum MultimodalSetting {
    Enabled(bool),
    Model(String),
}

/// Typed view of the keys every profile must carry.
///
/// Backend-specific keys (`APIKey`, `BaseURL`, `other`, ...) are not listed here;
/// they stay in [`Profile::record`] and are read by the parser itself.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProfileSchema {
    #[serde(rename = "FriendlyName")]
    pub friendly_name: String,
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "ResponseType")]
    pub response_type: String,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "MaxTokens")]
    pub max_tokens: u64,
    #[serde(rename = "Introduction", default, skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
    #[serde(rename = "Personality", default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_history_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_history_messages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub it_multimodal_model: Option<MultimodalSetting>,
}

impl ProfileSchema {
    fn validate(&self) -> anyhow::Result<()> {
        for (key, value) in [
            ("FriendlyName", &self.friendly_name),
            ("Model", &self.model),
            ("ResponseType", &self.response_type),
        ] {
            ensure!(!value.trim().is_empty(), "{key} must not be empty");
        }
        ensure!(
            (0.0..=2.0).contains(&self.temperature),
            "Temperature must be within [0.0, 2.0], got {}",
            self.temperature
        );
        ensure!(self.max_tokens > 0, "MaxTokens must be > 0");
        if self.max_history_tokens == Some(0) {
            bail!("max_history_tokens must be > 0");
        }
        if self.max_history_messages == Some(0) {
            bail!("max_history_messages must be > 0");
        }
        Ok(())
    }
}

/// A validated `<name>.ai.json` profile.
#[derive(Debug, Clone)]
pub struct Profile {
    /// File name without the `.ai.json` suffix
    pub name: String,
    pub schema: ProfileSchema,
    /// The complete record, handed to the parser unchanged.
    pub record: ConfigRecord,
}

impl Profile {
    /// Parse and validate a profile document.
    pub fn from_value(name: &str, value: Value) -> anyhow::Result<Self> {
        ensure!(value.is_object(), "profile must be a JSON object");
        let schema: ProfileSchema =
            serde_json::from_value(value.clone()).context("profile does not match the schema")?;
        schema.validate()?;
        let record = ConfigRecord::try_from(value)?;

        Ok(Self {
            name: name.to_string(),
            schema,
            record,
        })
    }

    pub fn from_json(name: &str, content: &str) -> anyhow::Result<Self> {
        let value: Value = serde_json::from_str(content).context("invalid JSON")?;
        Self::from_value(name, value)
    }

    /// Whether `query` names this profile, by file name or friendly name.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        self.name.eq_ignore_ascii_case(query) || self.schema.friendly_name.eq_ignore_ascii_case(query)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            self.schema.friendly_name, self.schema.model, self.schema.response_type
        )
    }
}
