//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each capability has a real adapter and a scripted one for tests.

mod command;
mod signal;

// Re-export main types for convenience
pub use command::{ScriptedRunner, SystemRunner};
#[cfg(unix)]
pub use signal::NixSignals;
pub use signal::{ScriptedSignals, TermBehavior};
