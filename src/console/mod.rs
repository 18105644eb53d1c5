// src/console/mod.rs

//! Console capture for the managed server.
//!
//! - [`buffer`] holds the bounded ring of recent output.
//! - [`trim`] runs the periodic trim safety net.

pub mod buffer;
pub mod trim;

pub use buffer::{ConsoleBuffer, DEFAULT_CAPACITY, EMPTY_PLACEHOLDER};
pub use trim::spawn_trim_task;
