//! The backend parser capability contract.
//!
//! A parser wraps one conversational backend. It owns its history, turns a single user
//! message into a backend request and hands back plain assistant text. Concrete parsers
//! live in `arcspec_providers`; this module only describes what every one of them must
//! offer and how the registry refers to a parser type before it is instantiated.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{ConfigError, ConfigRecord};
use crate::{HistorySummary, ModelInfo};

pub mod discovery;
pub mod registry;

/// Errors produced by parser construction and `chat`.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("backend call failed: {0}")]
    Backend(anyhow::Error),

    #[error("backend stream failed: {0}")]
    Stream(String),
}

impl ParserError {
    /// Whether the error came from talking to the backend (as opposed to configuration).
    #[must_use]
    pub const fn is_backend_failure(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Stream(_))
    }
}

/// Receives streamed reply fragments as they arrive. Fragments are display-only; the
/// history records the assembled reply.
pub type ChunkSink = Box<dyn Fn(&str) + Send + Sync>;

/// Capability set every backend adapter implements.
#[async_trait]
pub trait Parser: Send + Sync {
    /// Send one user message and return the assistant's reply.
    ///
    /// History is only touched once the backend has answered, so a failed call leaves
    /// it exactly as it was.
    async fn chat(&mut self, message: &str) -> Result<String, ParserError>;

    /// Static and dynamic facts about this instance, for diagnostic display.
    fn model_info(&self) -> ModelInfo;

    /// Empty the transcript and re-apply the persona, if one is configured.
    fn clear_history(&mut self);

    fn history_summary(&self) -> HistorySummary;

    /// Install a sink for streamed fragments. Parsers that never stream ignore it.
    fn set_chunk_sink(&mut self, sink: ChunkSink) {
        drop(sink);
    }
}

/// Compile-time description of a parser type.
///
/// Implementing this is what makes a type registrable: the trait bound replaces the
/// runtime check that a registered type offers the full capability set.
pub trait ParserSpec: Parser + Sized + 'static {
    /// Type name, used by discovery manifests to refer to this implementation.
    const TYPE_NAME: &'static str;

    /// Fallback registration name, standing in for the implementing module's file name.
    const MODULE_NAME: &'static str;

    /// Explicit registration name; wins over `MODULE_NAME` and manifest file stems.
    const PARSER_NAME: Option<&'static str> = None;

    const PARSER_ALIASES: &'static [&'static str] = &[];

    const PARSER_DESCRIPTION: &'static str = "";

    /// Build an instance, validating every required key up front.
    fn from_config(config: ConfigRecord) -> Result<Self, ParserError>;
}

/// Constructor signature stored by the registry.
pub type ParserConstructor = fn(ConfigRecord) -> Result<Box<dyn Parser>, ParserError>;

/// A not-yet-instantiated parser type: the registry's "class reference".
#[derive(Clone, Copy)]
pub struct ParserClass {
    type_name: &'static str,
    module_name: &'static str,
    parser_name: Option<&'static str>,
    aliases: &'static [&'static str],
    description: &'static str,
    construct: ParserConstructor,
}

fn construct_boxed<P: ParserSpec>(config: ConfigRecord) -> Result<Box<dyn Parser>, ParserError> {
    Ok(Box::new(P::from_config(config)?))
}

impl ParserClass {
    /// Class reference for a concrete parser type.
    #[must_use]
    pub fn of<P: ParserSpec>() -> Self {
        Self {
            type_name: P::TYPE_NAME,
            module_name: P::MODULE_NAME,
            parser_name: P::PARSER_NAME,
            aliases: P::PARSER_ALIASES,
            description: P::PARSER_DESCRIPTION,
            construct: construct_boxed::<P>,
        }
    }

    /// Class reference assembled by hand, for types that do not implement `ParserSpec`.
    ///
    /// The registry validates these descriptors when they are registered.
    #[must_use]
    pub const fn from_parts(
        type_name: &'static str,
        module_name: &'static str,
        construct: ParserConstructor,
    ) -> Self {
        Self {
            type_name,
            module_name,
            parser_name: None,
            aliases: &[],
            description: "",
            construct,
        }
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub const fn module_name(&self) -> &'static str {
        self.module_name
    }

    #[must_use]
    pub const fn parser_name(&self) -> Option<&'static str> {
        self.parser_name
    }

    #[must_use]
    pub const fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.description
    }

    /// Name used when the class is registered without a manifest.
    #[must_use]
    pub fn default_name(&self) -> &'static str {
        self.parser_name.unwrap_or(self.module_name)
    }

    /// Instantiate the class with `config`.
    pub fn instantiate(&self, config: ConfigRecord) -> Result<Box<dyn Parser>, ParserError> {
        (self.construct)(config)
    }
}

impl PartialEq for ParserClass {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
    }
}

impl Eq for ParserClass {}

impl std::fmt::Debug for ParserClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserClass")
            .field("type_name", &self.type_name)
            .field("name", &self.default_name())
            .finish_non_exhaustive()
    }
}
