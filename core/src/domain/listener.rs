//! Listener domain models.

use serde::{Deserialize, Serialize};

// ============================================================================
// Protocol
// ============================================================================

/// Transport protocol of a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// Derive the protocol from lsof's NODE column: anything mentioning UDP is
    /// UDP, everything else is TCP.
    pub fn from_node(node: &str) -> Self {
        if node.to_uppercase().contains("UDP") {
            Protocol::Udp
        } else {
            Protocol::Tcp
        }
    }

    /// Parse a user-supplied protocol filter ("tcp", "UDP", ...).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_uppercase().as_str() {
            "TCP" => Some(Protocol::Tcp),
            "UDP" => Some(Protocol::Udp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ListenerKey
// ============================================================================

/// Composite identity of a listener across scans: (port, protocol).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerKey {
    pub port: u16,
    pub protocol: Protocol,
}

impl ListenerKey {
    pub fn new(port: u16, protocol: Protocol) -> Self {
        Self { port, protocol }
    }
}

impl std::fmt::Display for ListenerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}

// ============================================================================
// ListenerEntry
// ============================================================================

/// Connection state reported for listening sockets.
pub const STATE_LISTEN: &str = "LISTEN";

/// Connection state assumed for `local->remote` pairs without an explicit state.
pub const STATE_ESTABLISHED: &str = "ESTABLISHED";

/// A single socket owned by a process, as reported by one scan.
///
/// Entries are produced fresh by every scan and never mutated afterwards,
/// apart from the scanner's command enrichment pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerEntry {
    /// Local port number.
    pub port: u16,
    /// Transport protocol.
    pub protocol: Protocol,
    /// Process ID of the owning process.
    pub pid: u32,
    /// Short process name.
    pub process: String,
    /// Username of the process owner.
    pub user: String,
    /// Full command line (the short name until enriched).
    pub command: String,
    /// Connection state, e.g. LISTEN or ESTABLISHED.
    pub state: String,
    /// File descriptor tag from lsof.
    pub fd: String,
}

impl ListenerEntry {
    /// Create an entry whose command is initially the short process name.
    pub fn new(
        port: u16,
        protocol: Protocol,
        pid: u32,
        process: impl Into<String>,
        user: impl Into<String>,
        state: impl Into<String>,
        fd: impl Into<String>,
    ) -> Self {
        let process = process.into();
        Self {
            port,
            protocol,
            pid,
            command: process.clone(),
            process,
            user: user.into(),
            state: state.into(),
            fd: fd.into(),
        }
    }

    /// The (port, protocol) identity used for change detection.
    pub fn key(&self) -> ListenerKey {
        ListenerKey::new(self.port, self.protocol)
    }

    pub fn is_listening(&self) -> bool {
        self.state == STATE_LISTEN
    }

    /// Check if this entry matches a search query.
    ///
    /// Case-insensitive substring match across process name, user, command,
    /// and the decimal text of port and PID.
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }

        let query_lower = query.to_lowercase();
        self.process.to_lowercase().contains(&query_lower)
            || self.user.to_lowercase().contains(&query_lower)
            || self.command.to_lowercase().contains(&query_lower)
            || self.port.to_string().contains(&query_lower)
            || self.pid.to_string().contains(&query_lower)
    }
}

impl std::fmt::Display for ListenerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} (PID {}, {})",
            self.port, self.protocol, self.pid, self.process
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ListenerEntry {
        let mut e = ListenerEntry::new(3000, Protocol::Tcp, 1234, "node", "dev", STATE_LISTEN, "19u");
        e.command = "/usr/local/bin/node server.js".to_string();
        e
    }

    #[test]
    fn test_new_copies_process_into_command() {
        let e = ListenerEntry::new(80, Protocol::Tcp, 1, "nginx", "root", STATE_LISTEN, "6u");
        assert_eq!(e.command, "nginx");
        assert!(e.is_listening());
    }

    #[test]
    fn test_protocol_from_node() {
        assert_eq!(Protocol::from_node("TCP"), Protocol::Tcp);
        assert_eq!(Protocol::from_node("UDP"), Protocol::Udp);
        assert_eq!(Protocol::from_node("udp6"), Protocol::Udp);
        assert_eq!(Protocol::from_node("0t0"), Protocol::Tcp);
    }

    #[test]
    fn test_protocol_serde() {
        assert_eq!(serde_json::to_string(&Protocol::Udp).unwrap(), "\"UDP\"");
        let p: Protocol = serde_json::from_str("\"TCP\"").unwrap();
        assert_eq!(p, Protocol::Tcp);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(entry().key().to_string(), "3000/TCP");
    }

    #[test]
    fn test_matches_search() {
        let e = entry();
        assert!(e.matches_search("NODE"));
        assert!(e.matches_search("dev"));
        assert!(e.matches_search("server.js"));
        assert!(e.matches_search("300"));
        assert!(e.matches_search("1234"));
        assert!(e.matches_search(""));
        assert!(!e.matches_search("nginx"));
        assert!(!e.matches_search("LISTEN"));
    }
}
