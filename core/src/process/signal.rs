//! Signal names understood by the process manager.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Signals an operator may send to a process.
///
/// Serialized by name ("SIGTERM"); any spelling [`KillSignal::parse`]
/// accepts deserializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum KillSignal {
    /// SIGTERM: graceful termination request.
    Term,
    /// SIGKILL: cannot be caught or ignored.
    Kill,
    Int,
    Hup,
    Usr1,
    Usr2,
}

impl KillSignal {
    pub const ALL: [KillSignal; 6] = [
        KillSignal::Term,
        KillSignal::Kill,
        KillSignal::Int,
        KillSignal::Hup,
        KillSignal::Usr1,
        KillSignal::Usr2,
    ];

    /// Parse a signal name, with or without the `SIG` prefix, in any case.
    pub fn parse(name: &str) -> Option<Self> {
        let upper = name.trim().to_uppercase();
        let bare = upper.strip_prefix("SIG").unwrap_or(&upper);
        match bare {
            "TERM" => Some(KillSignal::Term),
            "KILL" => Some(KillSignal::Kill),
            "INT" => Some(KillSignal::Int),
            "HUP" => Some(KillSignal::Hup),
            "USR1" => Some(KillSignal::Usr1),
            "USR2" => Some(KillSignal::Usr2),
            _ => None,
        }
    }

    /// Canonical name, e.g. "SIGTERM".
    pub fn name(&self) -> &'static str {
        match self {
            KillSignal::Term => "SIGTERM",
            KillSignal::Kill => "SIGKILL",
            KillSignal::Int => "SIGINT",
            KillSignal::Hup => "SIGHUP",
            KillSignal::Usr1 => "SIGUSR1",
            KillSignal::Usr2 => "SIGUSR2",
        }
    }
}

impl FromStr for KillSignal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KillSignal::parse(s).ok_or_else(|| Error::ParseError(format!("unknown signal {:?}", s)))
    }
}

impl TryFrom<String> for KillSignal {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KillSignal> for &'static str {
    fn from(signal: KillSignal) -> Self {
        signal.name()
    }
}

impl std::fmt::Display for KillSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(unix)]
impl From<KillSignal> for nix::sys::signal::Signal {
    fn from(signal: KillSignal) -> Self {
        use nix::sys::signal::Signal;
        match signal {
            KillSignal::Term => Signal::SIGTERM,
            KillSignal::Kill => Signal::SIGKILL,
            KillSignal::Int => Signal::SIGINT,
            KillSignal::Hup => Signal::SIGHUP,
            KillSignal::Usr1 => Signal::SIGUSR1,
            KillSignal::Usr2 => Signal::SIGUSR2,
        }
    }
}
