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

//! Chat profiles stored as `<name>.ai.json` files.

mod schema;
mod store;

pub use schema::{MultimodalSetting, Profile, ProfileSchema};
pub use store::{
    EXAMPLE_PROFILE, PROFILE_SUFFIX, base_dir, create_config, default_config_dir,
    default_parsers_dir, ensure_config_dir, find_profile, load_profile, load_profiles,
};
