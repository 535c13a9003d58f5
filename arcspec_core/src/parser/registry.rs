use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::{Parser, ParserClass};
use crate::config::{ConfigError, ConfigRecord, MULTIMODAL_KEY, RESPONSE_TYPE_KEY};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("parser type '{type_name}' violates the parser contract: {reason}")]
    ContractViolation { type_name: String, reason: String },

    #[error("unsupported ResponseType '{requested}'; available parsers: {}", available.join(", "))]
    UnsupportedResponseType {
        requested: String,
        available: Vec<String>,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One registered backend type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub name: String,
    pub class: ParserClass,
    pub description: String,
    pub aliases: Vec<String>,
}

/// Name/alias keyed table of parser classes.
///
/// Lookups are case-insensitive. Only canonical names are enumerated; aliases resolve to
/// the same class but never show up in `list_names`.
#[derive(Debug, Default)]
pub struct ParserRegistry {
    entries: Vec<RegistryEntry>,
    lookup: HashMap<String, ParserClass>,
}

impl ParserRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with `classes`, each under its default name and declared
    /// aliases.
    pub fn with_classes(classes: &[ParserClass]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for class in classes {
            registry.register_class(*class)?;
        }
        Ok(registry)
    }

    /// Register `class` under its own declared name, aliases and description.
    pub fn register_class(&mut self, class: ParserClass) -> Result<(), RegistryError> {
        let aliases: Vec<String> = class.aliases().iter().map(ToString::to_string).collect();
        self.register(
            class.default_name(),
            class,
            Some(class.description()),
            &aliases,
        )
    }

    /// Register `class` under `name` and every alias.
    ///
    /// Registering a name that already exists replaces the previous class and drops the
    /// previous aliases; the entry keeps its original position in the enumeration order.
    /// An alias may not shadow another parser's canonical name. Every lookup key belongs
    /// to exactly one entry, so a name or alias taken over from another entry is removed
    /// from that entry's alias list.
    pub fn register(
        &mut self,
        name: &str,
        class: ParserClass,
        description: Option<&str>,
        aliases: &[String],
    ) -> Result<(), RegistryError> {
        Self::check_contract(name, &class, aliases)?;

        let key = name.trim().to_lowercase();
        let mut unique: Vec<String> = Vec::with_capacity(aliases.len());
        for alias in aliases.iter().map(|a| a.trim().to_lowercase()) {
            if alias != key && !unique.contains(&alias) {
                unique.push(alias);
            }
        }
        let aliases = unique;

        if let Some(alias) = aliases
            .iter()
            .find(|a| self.entries.iter().any(|e| e.name == **a))
        {
            return Err(RegistryError::ContractViolation {
                type_name: class.type_name().to_string(),
                reason: format!("alias '{alias}' is already a parser name"),
            });
        }

        let description = description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| class.description())
            .to_string();

        let entry = RegistryEntry {
            name: key.clone(),
            class,
            description,
            aliases: aliases.clone(),
        };

        if let Some(existing) = self.entries.iter_mut().find(|e| e.name == key) {
            warn!(
                "Parser '{key}' already registered ({}), replacing with {}",
                existing.class.type_name(),
                class.type_name()
            );
            let replaced = std::mem::replace(existing, entry);
            for alias in &replaced.aliases {
                self.lookup.remove(alias);
            }
        } else {
            self.entries.push(entry);
        }

        for other in self.entries.iter_mut().filter(|e| e.name != key) {
            other.aliases.retain(|a| *a != key && !aliases.contains(a));
        }

        self.lookup.insert(key.clone(), class);
        for alias in &aliases {
            debug!("Registering alias: {alias} -> {key}");
            self.lookup.insert(alias.clone(), class);
        }

        info!("Registered parser: {key} -> {}", class.type_name());
        Ok(())
    }

    fn check_contract(
        name: &str,
        class: &ParserClass,
        aliases: &[String],
    ) -> Result<(), RegistryError> {
        let violation = |reason: &str| RegistryError::ContractViolation {
            type_name: class.type_name().to_string(),
            reason: reason.to_string(),
        };

        if class.type_name().trim().is_empty() {
            return Err(violation("type name is empty"));
        }
        if name.trim().is_empty() {
            return Err(violation("registration name is empty"));
        }
        if aliases.iter().any(|a| a.trim().is_empty()) {
            return Err(violation("alias is empty"));
        }
        Ok(())
    }

    /// Case-insensitive lookup by canonical name or alias.
    #[must_use]
    pub fn get_backend_class(&self, name: &str) -> Option<ParserClass> {
        self.lookup.get(&name.trim().to_lowercase()).copied()
    }

    /// Entry for a canonical name or alias.
    #[must_use]
    pub fn get_entry(&self, name: &str) -> Option<&RegistryEntry> {
        let key = name.trim().to_lowercase();
        self.entries
            .iter()
            .find(|e| e.name == key)
            .or_else(|| self.entries.iter().find(|e| e.aliases.contains(&key)))
    }

    /// Resolve and instantiate a parser.
    ///
    /// Unknown names and construction failures both come back as `None`; the cause is
    /// logged here so callers can present one uniform "unavailable" message.
    #[must_use]
    pub fn create_instance(&self, name: &str, config: ConfigRecord) -> Option<Box<dyn Parser>> {
        let Some(class) = self.get_backend_class(name) else {
            error!("Parser not found: {name}");
            return None;
        };

        match class.instantiate(config) {
            Ok(parser) => {
                info!("Created parser instance: {name} -> {}", class.type_name());
                Some(parser)
            }
            Err(e) => {
                error!("Failed to create parser instance: {name} -> {e}");
                None
            }
        }
    }

    /// Create the parser selected by the record's `ResponseType`.
    pub fn create_from_config(
        &self,
        config: ConfigRecord,
    ) -> Result<Box<dyn Parser>, RegistryError> {
        let response_type = config.require_str(RESPONSE_TYPE_KEY)?.to_lowercase();

        if config.is_enabled(MULTIMODAL_KEY) {
            warn!("Multimodal model requested; using the plain '{response_type}' parser");
        }

        info!("Creating parser for ResponseType: {response_type}");
        self.create_instance(&response_type, config)
            .ok_or_else(|| RegistryError::UnsupportedResponseType {
                requested: response_type,
                available: self.list_names(),
            })
    }

    /// Canonical names in registration order.
    #[must_use]
    pub fn list_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    #[must_use]
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
