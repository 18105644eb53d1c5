// src/config/mod.rs

//! Configuration loading and validation for gamectl.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it and resolve derived settings (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, ConsoleSection, ConsoleSettings, HttpSection, PluginsSection, RawConfigFile,
    ServerSection, StatusSection, StatusTarget, TelemetrySection,
};
pub use validate::validate_config;
