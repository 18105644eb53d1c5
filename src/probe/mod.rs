// src/probe/mod.rs

//! Read-only probes the HTTP layer consults: the game server's own status
//! endpoint and host telemetry.

pub mod status;
pub mod telemetry;

pub use status::{PlayerSample, ServerStatus, SlpProbe, StatusProbe};
pub use telemetry::{MetricsProvider, SysinfoProvider, SystemStats};
