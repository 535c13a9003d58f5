use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use tracing::{debug, info, warn};

use crate::schema::Profile;

pub const PROFILE_SUFFIX: &str = ".ai.json";
pub const EXAMPLE_PROFILE: &str = "example.ai.json";

const EXAMPLE_TEMPLATE: &str = r#"{
  "FriendlyName": "Example Assistant",
  "Introduction": "General-purpose assistant on an OpenAI-compatible API.",
  "ResponseType": "openai",
  "Model": "gpt-4o-mini",
  "APIKeyEnv": "OPENAI_API_KEY",
  "APIKey": "your-api-key-here",
  "BaseURL": "https://api.openai.com/v1",
  "Temperature": 0.7,
  "MaxTokens": 1000,
  "TopP": 1.0,
  "Personality": "You are a helpful assistant. Answer clearly and concisely.",
  "max_history_tokens": 3000,
  "max_history_messages": 20,
  "max_retries": 2,
  "other": {
    "stream": true
  },
  "if_return_none": "The model returned no content."
}
"#;

/// `~/arcspec`
pub fn base_dir() -> anyhow::Result<PathBuf> {
    Ok(dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
        .join("arcspec"))
}

pub fn default_config_dir() -> anyhow::Result<PathBuf> {
    Ok(base_dir()?.join("configs"))
}

pub fn default_parsers_dir() -> anyhow::Result<PathBuf> {
    Ok(base_dir()?.join("parsers"))
}

/// Profile name for `path`, if it is a profile file at all.
fn profile_name(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()?.strip_suffix(PROFILE_SUFFIX)
}

pub fn load_profile(path: &Path) -> anyhow::Result<Profile> {
    let name = profile_name(path)
        .with_context(|| format!("{} is not a {PROFILE_SUFFIX} file", path.display()))?;
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Profile::from_json(name, &content).with_context(|| format!("Invalid profile {}", path.display()))
}

/// Every valid profile in `dir`, sorted by file name.
///
/// Files that fail validation are logged and skipped.
pub fn load_profiles(dir: &Path) -> anyhow::Result<Vec<Profile>> {
    if !dir.is_dir() {
        bail!(
            "Config directory not found at: {}. Please run 'arcspec init' to create one.",
            dir.display()
        );
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && profile_name(path).is_some())
        .collect();
    paths.sort();

    let mut profiles = Vec::with_capacity(paths.len());
    for path in paths {
        match load_profile(&path) {
            Ok(profile) => {
                debug!("Loaded profile {}", profile.name);
                profiles.push(profile);
            }
            Err(e) => warn!("Skipping profile: {e:#}"),
        }
    }

    info!("Loaded {} profiles from {}", profiles.len(), dir.display());
    Ok(profiles)
}

/// Look a profile up by file name, friendly name or 1-based list index.
pub fn find_profile(dir: &Path, query: &str) -> anyhow::Result<Profile> {
    let profiles = load_profiles(dir)?;

    if let Some(profile) = profiles.iter().find(|p| p.matches(query)) {
        return Ok(profile.clone());
    }
    if let Some(profile) = query
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|index| index.checked_sub(1))
        .and_then(|index| profiles.get(index))
    {
        return Ok(profile.clone());
    }

    let available: Vec<&str> = profiles.iter().map(|p| p.name.as_str()).collect();
    bail!(
        "Profile '{query}' not found. Available profiles: {}",
        if available.is_empty() {
            "(none)".to_string()
        } else {
            available.join(", ")
        }
    )
}

pub fn ensure_config_dir(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}

/// Write the example profile into `dir` and return its path.
pub fn create_config(dir: &Path) -> anyhow::Result<PathBuf> {
    ensure_config_dir(dir)?;
    let path = dir.join(EXAMPLE_PROFILE);

    if path.exists() {
        bail!(
            "Config file already exists at: {}. Please edit it directly.",
            path.display()
        );
    }

    fs::write(&path, EXAMPLE_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Created example profile at {}", path.display());
    Ok(path)
}
