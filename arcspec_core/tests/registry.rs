//! Registry behaviour: case-insensitive lookup, aliases, overwrite policy, instantiation
//! failures and manifest discovery.

use std::fs;

use arcspec_core::{
    ConfigRecord, HistorySummary, ModelInfo, Parser, ParserClass, ParserError, ParserRegistry,
    ParserSpec, RegistryError,
};
use async_trait::async_trait;

struct StubParser {
    model: String,
}

#[async_trait]
impl Parser for StubParser {
    async fn chat(&mut self, message: &str) -> Result<String, ParserError> {
        Ok(format!("{}: {message}", self.model))
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            parser: "stub".to_string(),
            model: self.model.clone(),
            base_url: None,
            temperature: None,
            max_tokens: None,
            top_p: None,
            personality: String::new(),
            stream_enabled: false,
            multimodal: false,
            extra_params: serde_json::Map::new(),
            extra_body: serde_json::Map::new(),
            history_summary: self.history_summary(),
        }
    }

    fn clear_history(&mut self) {}

    fn history_summary(&self) -> HistorySummary {
        HistorySummary {
            message_count: 0,
            total_tokens: 0,
            max_tokens: 1,
            max_messages: 1,
            has_system_message: false,
        }
    }
}

impl ParserSpec for StubParser {
    const TYPE_NAME: &'static str = "StubParser";
    const MODULE_NAME: &'static str = "stub";
    const PARSER_DESCRIPTION: &'static str = "Answers with the model name";

    fn from_config(config: ConfigRecord) -> Result<Self, ParserError> {
        Ok(Self {
            model: config.require_str("Model")?.to_string(),
        })
    }
}

struct OtherParser;

#[async_trait]
impl Parser for OtherParser {
    async fn chat(&mut self, _message: &str) -> Result<String, ParserError> {
        Ok(String::from("other"))
    }

    fn model_info(&self) -> ModelInfo {
        StubParser {
            model: "other".to_string(),
        }
        .model_info()
    }

    fn clear_history(&mut self) {}

    fn history_summary(&self) -> HistorySummary {
        StubParser {
            model: "other".to_string(),
        }
        .history_summary()
    }
}

impl ParserSpec for OtherParser {
    const TYPE_NAME: &'static str = "OtherParser";
    const MODULE_NAME: &'static str = "other";
    const PARSER_NAME: Option<&'static str> = Some("named_other");
    const PARSER_ALIASES: &'static [&'static str] = &["alt"];

    fn from_config(_config: ConfigRecord) -> Result<Self, ParserError> {
        Ok(Self)
    }
}

fn stub() -> ParserClass {
    ParserClass::of::<StubParser>()
}

fn other() -> ParserClass {
    ParserClass::of::<OtherParser>()
}

#[test]
fn lookup_is_case_insensitive() {
    let mut registry = ParserRegistry::new();
    registry
        .register("Foo", stub(), None, &[])
        .expect("register");

    for name in ["foo", "FOO", "Foo"] {
        assert_eq!(registry.get_backend_class(name), Some(stub()), "{name}");
    }
}

#[test]
fn aliases_resolve_but_are_not_listed() {
    let mut registry = ParserRegistry::new();
    registry
        .register("foo", stub(), None, &["bar".to_string()])
        .expect("register");

    let names = registry.list_names();
    assert!(names.contains(&"foo".to_string()));
    assert!(!names.contains(&"bar".to_string()));
    assert_eq!(registry.get_backend_class("bar"), Some(stub()));
    assert_eq!(registry.get_backend_class("BAR"), Some(stub()));
    assert_eq!(
        registry.get_entry("bar").map(|e| e.name.as_str()),
        Some("foo")
    );
}

#[test]
fn unknown_backend_yields_none() {
    let registry = ParserRegistry::with_classes(&[stub()]).expect("registry");
    assert!(
        registry
            .create_instance("unknown_backend", ConfigRecord::new())
            .is_none()
    );
    assert!(registry.get_backend_class("unknown_backend").is_none());
}

#[test]
fn construction_failure_yields_none() {
    let registry = ParserRegistry::with_classes(&[stub()]).expect("registry");
    // StubParser requires Model.
    assert!(registry.create_instance("stub", ConfigRecord::new()).is_none());
    assert!(
        registry
            .create_instance("stub", ConfigRecord::new().with("Model", "m"))
            .is_some()
    );
}

#[test]
fn second_registration_wins() {
    let mut registry = ParserRegistry::new();
    registry.register("dup", stub(), None, &[]).expect("first");
    registry.register("dup", other(), None, &[]).expect("second");

    assert_eq!(registry.get_backend_class("dup"), Some(other()));
    assert_eq!(registry.list_names(), vec!["dup".to_string()]);
}

#[test]
fn listing_keeps_registration_order() {
    let registry = ParserRegistry::with_classes(&[other(), stub()]).expect("registry");
    assert_eq!(
        registry.list_names(),
        vec!["named_other".to_string(), "stub".to_string()]
    );
    let entry = registry.get_entry("stub").expect("entry");
    assert_eq!(entry.description, "Answers with the model name");
    assert_eq!(registry.get_backend_class("alt"), Some(other()));
}

#[test]
fn empty_names_violate_the_contract() {
    let mut registry = ParserRegistry::new();
    let err = registry
        .register("  ", stub(), None, &[])
        .expect_err("blank name");
    assert!(matches!(err, RegistryError::ContractViolation { .. }));

    let err = registry
        .register("ok", stub(), None, &[String::new()])
        .expect_err("blank alias");
    assert!(matches!(err, RegistryError::ContractViolation { .. }));

    let nameless = ParserClass::from_parts("", "nameless", |config| {
        StubParser::from_config(config).map(|p| Box::new(p) as Box<dyn Parser>)
    });
    assert!(registry.register_class(nameless).is_err());
    assert!(registry.is_empty());
}

#[test]
fn create_from_config_uses_response_type() {
    let registry = ParserRegistry::with_classes(&[stub()]).expect("registry");

    let config = ConfigRecord::new()
        .with("ResponseType", "STUB")
        .with("Model", "m");
    assert!(registry.create_from_config(config).is_ok());

    let err = registry
        .create_from_config(ConfigRecord::new().with("ResponseType", "nope"))
        .err()
        .expect("unsupported");
    assert_eq!(
        err,
        RegistryError::UnsupportedResponseType {
            requested: "nope".to_string(),
            available: vec!["stub".to_string()],
        }
    );

    assert!(matches!(
        registry.create_from_config(ConfigRecord::new()),
        Err(RegistryError::Config(_))
    ));
}

#[tokio::test]
async fn created_instance_chats() {
    let registry = ParserRegistry::with_classes(&[stub()]).expect("registry");
    let mut parser = registry
        .create_instance("stub", ConfigRecord::new().with("Model", "m1"))
        .expect("instance");
    assert_eq!(parser.chat("hi").await.expect("chat"), "m1: hi");
}

#[test]
fn discover_registers_manifests() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("mystub.json"),
        r#"{"backend": "StubParser", "aliases": ["ms"], "description": "from manifest"}"#,
    )
    .expect("write");
    fs::write(dir.path().join("named.json"), r#"{"backend": "otherparser"}"#).expect("write");
    fs::write(dir.path().join("broken.json"), "{ not json").expect("write");
    fs::write(dir.path().join("ghost.json"), r#"{"backend": "GhostParser"}"#).expect("write");
    fs::write(dir.path().join("__init__.json"), r#"{"backend": "StubParser"}"#).expect("write");
    fs::write(dir.path().join("readme.md"), "ignored").expect("write");

    let mut registry = ParserRegistry::new();
    let count = registry.discover(dir.path(), &[stub(), other()]);

    assert_eq!(count, 2);
    assert_eq!(registry.get_backend_class("mystub"), Some(stub()));
    assert_eq!(registry.get_backend_class("ms"), Some(stub()));
    // PARSER_NAME wins over the file stem.
    assert_eq!(registry.get_backend_class("named_other"), Some(other()));
    assert!(registry.get_backend_class("named").is_none());
    assert_eq!(
        registry.get_entry("mystub").map(|e| e.description.as_str()),
        Some("from manifest")
    );
}

#[test]
fn discover_missing_directory_finds_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut registry = ParserRegistry::new();
    assert_eq!(registry.discover(&dir.path().join("absent"), &[stub()]), 0);

    let file = dir.path().join("file.json");
    fs::write(&file, "{}").expect("write");
    assert_eq!(registry.discover(&file, &[stub()]), 0);
}

#[test]
fn reregistration_drops_stale_aliases() {
    let mut registry = ParserRegistry::new();
    registry
        .register("foo", stub(), None, &["f".to_string()])
        .expect("first");
    registry.register("foo", other(), None, &[]).expect("second");

    assert!(registry.get_backend_class("f").is_none());
    assert!(registry.get_entry("f").is_none());
    assert_eq!(registry.get_backend_class("foo"), Some(other()));
}

#[test]
fn alias_cannot_shadow_a_canonical_name() {
    let mut registry = ParserRegistry::new();
    registry.register("foo", stub(), None, &[]).expect("foo");

    let err = registry
        .register("bar", other(), None, &["FOO".to_string()])
        .expect_err("shadowing alias");
    assert!(matches!(err, RegistryError::ContractViolation { .. }));

    assert_eq!(registry.get_backend_class("foo"), Some(stub()));
    assert_eq!(registry.get_entry("foo").map(|e| e.class), Some(stub()));
    assert!(registry.get_backend_class("bar").is_none());
}

#[test]
fn lookup_keys_stay_owned_by_one_entry() {
    let mut registry = ParserRegistry::new();
    registry
        .register("bar", other(), None, &["foo".to_string(), "shared".to_string()])
        .expect("bar");
    // A new canonical name and a reused alias take over from "bar".
    registry
        .register("foo", stub(), None, &["shared".to_string()])
        .expect("foo");

    for key in ["foo", "shared", "bar"] {
        let entry = registry.get_entry(key).expect("entry");
        assert_eq!(registry.get_backend_class(key), Some(entry.class), "{key}");
    }
    assert_eq!(registry.get_backend_class("shared"), Some(stub()));
    assert!(registry.get_entry("bar").expect("bar").aliases.is_empty());
}
