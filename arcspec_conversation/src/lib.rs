#![warn(
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

//! Bounded conversation history for chat parsers.
//!
//! # Key Features
//! - Sliding window limited by message count and estimated tokens
//! - Pinned system message that survives eviction and `clear`
//! - Continuity repair so the window never opens on an assistant reply

mod history;
mod token;

pub use history::{
    DEFAULT_MAX_HISTORY_MESSAGES, DEFAULT_MAX_HISTORY_TOKENS, HistoryConfig, HistoryManager,
    MAX_HISTORY_MESSAGES_KEY, MAX_HISTORY_TOKENS_KEY, Message, PERSONALITY_KEY,
};
pub use token::estimate_tokens;
