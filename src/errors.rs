// src/errors.rs

//! Crate-wide error types.
//!
//! - [`GamectlError`] covers startup concerns (config, IO, TOML).
//! - [`SupervisorError`] is the lifecycle taxonomy surfaced by the
//!   supervisor handle.
//! - [`CommandError`] is what the command channel hands back to callers.
//! - [`ProbeError`] never reaches operators; probes degrade instead.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GamectlError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures of supervisor operations. None of them are fatal: the state
/// machine is left consistent for the next request.
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The OS could not create the process. State remains `Stopped`.
    #[error("failed to launch server process: {0}")]
    LaunchFailure(#[source] io::Error),

    /// No process handle is active.
    #[error("server is not running")]
    NotRunning,

    /// The process's stdin is closed or broken.
    #[error("failed to write to server stdin: {0}")]
    WriteFailure(#[source] io::Error),

    /// The supervisor task is gone (only during shutdown).
    #[error("supervisor is no longer available")]
    Unavailable,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("invalid command: {0}")]
    Invalid(String),

    #[error("server is not running")]
    NotRunning,

    #[error("failed to send command: {0}")]
    WriteFailure(String),
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("probe IO error: {0}")]
    Io(#[from] io::Error),

    #[error("probe timed out")]
    Timeout,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("invalid status JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GamectlError>;
