//! Opt-in discovery of parser modules from a directory.
//!
//! Parser implementations are compiled in; a directory of manifests decides which of
//! them get registered and under what names. Each `<module>.json` file binds one compiled
//! type:
//!
//! ```json
//! { "backend": "OpenAiParser", "aliases": ["gpt"], "description": "OpenAI chat" }
//! ```
//!
//! The registration name is the type's `PARSER_NAME` when it declares one, otherwise the
//! manifest's file stem. A broken manifest is logged and skipped; it never aborts the scan.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::ParserClass;
use super::registry::{ParserRegistry, RegistryError};

const MANIFEST_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid parser manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest {path} names unknown backend type '{backend}'")]
    UnknownBackend { path: PathBuf, backend: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Deserialize)]
struct ParserManifest {
    backend: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    description: Option<String>,
}

fn is_manifest(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MANIFEST_EXTENSION));
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_none_or(|n| n.starts_with("__") || n.starts_with('.'));
    path.is_file() && has_extension && !hidden
}

impl ParserRegistry {
    /// Scan `directory` for parser manifests and register every valid one.
    ///
    /// `catalog` is the set of compiled parser types manifests may refer to, matched by
    /// type name. Returns how many parsers were registered by this scan.
    pub fn discover(&mut self, directory: &Path, catalog: &[ParserClass]) -> usize {
        if !directory.exists() {
            error!("Parser directory does not exist: {}", directory.display());
            return 0;
        }
        if !directory.is_dir() {
            error!("Parser path is not a directory: {}", directory.display());
            return 0;
        }

        let mut paths: Vec<PathBuf> = match fs::read_dir(directory) {
            Ok(read_dir) => read_dir
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|p| is_manifest(p))
                .collect(),
            Err(e) => {
                error!("Failed to scan parser directory {}: {e}", directory.display());
                return 0;
            }
        };
        paths.sort();

        info!("Scanning parser directory: {}", directory.display());
        let mut discovered = 0_usize;
        for path in &paths {
            match self.load_manifest(path, catalog) {
                Ok(name) => {
                    debug!("Discovered parser '{name}' from {}", path.display());
                    discovered += 1;
                }
                Err(e) => warn!("Skipping parser manifest: {e}"),
            }
        }

        info!("Parser discovery finished: {discovered} registered");
        discovered
    }

    fn load_manifest(
        &mut self,
        path: &Path,
        catalog: &[ParserClass],
    ) -> Result<String, DiscoveryError> {
        let content = fs::read_to_string(path).map_err(|source| DiscoveryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: ParserManifest =
            serde_json::from_str(&content).map_err(|source| DiscoveryError::Manifest {
                path: path.to_path_buf(),
                source,
            })?;

        let class = catalog
            .iter()
            .find(|c| c.type_name().eq_ignore_ascii_case(manifest.backend.trim()))
            .copied()
            .ok_or_else(|| DiscoveryError::UnknownBackend {
                path: path.to_path_buf(),
                backend: manifest.backend.clone(),
            })?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let name = class.parser_name().unwrap_or(stem).to_string();

        let mut aliases: Vec<String> = class.aliases().iter().map(ToString::to_string).collect();
        for alias in manifest.aliases {
            if !aliases.iter().any(|a| a.eq_ignore_ascii_case(&alias)) {
                aliases.push(alias);
            }
        }

        self.register(&name, class, manifest.description.as_deref(), &aliases)?;
        Ok(name)
    }
}
