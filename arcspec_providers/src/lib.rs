#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! Concrete chat backends.

mod echo;
mod openai;
mod retry;
mod stream;

use arcspec_core::{ParserClass, ParserRegistry, RegistryError};

pub use echo::EchoParser;
pub use openai::{DEFAULT_BASE_URL, DEFAULT_FALLBACK_REPLY, OpenAiParser};
pub use retry::{RetryPolicy, retry_with_backoff};
pub use stream::accumulate_sse;

/// Every parser type compiled into this build, in registration order.
///
/// Discovery manifests may only name types listed here.
#[must_use]
pub fn catalog() -> Vec<ParserClass> {
    vec![ParserClass::of::<OpenAiParser>(), ParserClass::of::<EchoParser>()]
}

/// Registry holding the compiled-in parsers under their default names.
pub fn builtin_registry() -> Result<ParserRegistry, RegistryError> {
    ParserRegistry::with_classes(&catalog())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered_with_aliases() {
        let registry = builtin_registry().unwrap();
        assert_eq!(registry.list_names(), vec!["openai", "echo"]);
        assert_eq!(
            registry.get_backend_class("GPT"),
            Some(ParserClass::of::<OpenAiParser>())
        );
        assert_eq!(
            registry.get_backend_class("openai_compat"),
            Some(ParserClass::of::<OpenAiParser>())
        );
    }
}
