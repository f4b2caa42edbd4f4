//! Configuration loading.

/// `warden.toml` parsing, defaults and validation.
pub mod toml_config;
