//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type; `main` builds the
//! [`AppContext`] and dispatches to exactly one of them.

use std::path::PathBuf;

use anyhow::Context;
use arcspec_config::{Profile, default_config_dir, default_parsers_dir, find_profile};
use arcspec_core::{Parser, ParserRegistry};
use tracing::{debug, info};

mod chat;
mod info;
mod init;
mod list;
mod parsers;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use list::ListStrategy;
pub use parsers::ParsersStrategy;
pub use version::VersionStrategy;

/// Contract shared by all command strategies.
///
/// Each strategy defines its own input type, so commands take exactly the state
/// they need without runtime casting.
pub trait CommandStrategy: Send + Sync + 'static {
    type Input;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Directories and the parser registry, resolved once at startup.
pub struct AppContext {
    pub config_dir: PathBuf,
    pub parsers_dir: PathBuf,
    pub registry: ParserRegistry,
}

impl AppContext {
    /// Resolve directories only; for commands that never touch a parser.
    pub fn paths(config_dir: Option<PathBuf>, parsers_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let config_dir = config_dir.map_or_else(default_config_dir, Ok)?;
        let parsers_dir = parsers_dir.map_or_else(default_parsers_dir, Ok)?;
        Ok(Self {
            config_dir,
            parsers_dir,
            registry: ParserRegistry::new(),
        })
    }

    /// Resolve directories, register the built-in parsers and run manifest discovery.
    ///
    /// Discovery completes here, before any lookup.
    pub fn load(config_dir: Option<PathBuf>, parsers_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut context = Self::paths(config_dir, parsers_dir)?;
        context.registry =
            arcspec_providers::builtin_registry().context("Failed to register built-in parsers")?;

        if context.parsers_dir.is_dir() {
            let found = context
                .registry
                .discover(&context.parsers_dir, &arcspec_providers::catalog());
            info!(
                "Discovered {found} parser manifests in {}",
                context.parsers_dir.display()
            );
        } else {
            debug!(
                "No parser manifest directory at {}",
                context.parsers_dir.display()
            );
        }
        Ok(context)
    }

    pub fn profile(&self, query: &str) -> anyhow::Result<Profile> {
        find_profile(&self.config_dir, query)
    }

    /// Instantiate the parser selected by `profile`'s `ResponseType`.
    pub fn create_parser(&self, profile: &Profile) -> anyhow::Result<Box<dyn Parser>> {
        self.registry
            .create_from_config(profile.record.clone())
            .with_context(|| format!("Cannot create a parser for profile '{}'", profile.name))
    }
}

/// Shorten `s` to at most `max_chars` characters.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("你好世界你好世界", 5), "你好...");
    }
}
