//! Domain layer - Pure data models.
//!
//! This module contains the entities every other layer speaks in.
//! These types have no I/O dependencies and can be tested in isolation.

mod listener;
mod profile;

// Re-export all domain types
pub use listener::{
    ListenerEntry, ListenerKey, Protocol, STATE_ESTABLISHED, STATE_LISTEN,
};
pub use profile::ProcessProfile;
