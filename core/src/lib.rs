//! whport core library
//!
//! Library for finding which processes own which ports and acting on them.
//! Provides functionality to:
//! - Scan listening sockets and established connections through lsof
//! - Inspect and terminate the owning process, guarding against PID reuse
//! - Record how the set of listeners changes over time
//! - Drive an interactive dashboard as a message-driven state machine
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services
//!
//! # Platform Support
//! Unix only: relies on `lsof`, `ps`, `pgrep` and `kill(2)`.

#[cfg(not(unix))]
compile_error!("whport-core supports Unix-like systems only");

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod dashboard;
pub mod error;
pub mod history;
mod persist;
pub mod process;
pub mod scanner;

// Re-export domain types (primary API)
pub use domain::{ListenerEntry, ListenerKey, ProcessProfile, Protocol};

// Re-export other commonly used types
pub use application::{KillMode, KillService, KillStatus, ScanService};
pub use config::{Config, ConfigStore, ScanScope};
pub use error::{Error, ErrorKind, Result};
pub use history::{Event, EventKind, HistoryData, HistoryStore};
pub use persist::app_dir;
pub use process::{InfoFetcher, KillSignal, ProcessManager, ProtectedPids};
pub use scanner::LsofScanner;
