//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the capabilities the rest of the crate depends on
//! to reach the outside world. Implementations live in `adapters`.

mod command;
mod scanner;
mod signal;

pub use command::CommandRunner;
pub use scanner::ListenerSource;
pub use signal::SignalSender;
