//! Parser for lsof's columnar output.
//!
//! Expected format:
//! ```text
//! COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
//! node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
//! chrome    1111  code   20u  IPv4 0x1234567890abcdef      0t0  TCP 192.168.1.10:54321->93.184.216.34:443 (ESTABLISHED)
//! ```

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{ListenerEntry, Protocol, STATE_ESTABLISHED, STATE_LISTEN};

/// Rows with fewer whitespace-separated fields than this are dropped.
pub const MIN_FIELDS: usize = 9;

/// Commands longer than this are truncated during enrichment.
pub const MAX_COMMAND_LEN: usize = 200;

/// Parse lsof output into listener entries, in input order.
///
/// The first line is the header. Rows that cannot be interpreted are
/// dropped so that one garbled line never aborts a whole scan.
pub fn parse_lsof_output(output: &str) -> Vec<ListenerEntry> {
    output
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_lsof_line)
        .collect()
}

/// Parse one row: COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE NAME [STATE]
fn parse_lsof_line(line: &str) -> Option<ListenerEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MIN_FIELDS {
        debug!(line = line, "Dropping short lsof row");
        return None;
    }

    let pid: u32 = match fields[1].parse() {
        Ok(p) => p,
        Err(_) => {
            debug!(line = line, "Dropping lsof row with invalid PID");
            return None;
        }
    };

    let protocol = Protocol::from_node(fields[7]);
    let name = fields[8..].join(" ");
    let (port, state) = parse_name_field(&name)?;

    Some(ListenerEntry::new(
        port,
        protocol,
        pid,
        unescape_process_name(fields[0]),
        fields[2],
        state,
        fields[3],
    ))
}

/// Extract the local port and connection state from the NAME column.
///
/// Shapes, tried in order:
/// - `*:8080 (LISTEN)`: trailing parenthesized state, stripped before parsing
/// - `10.0.0.2:54321->93.184.216.34:443`: port from the local side,
///   state defaults to ESTABLISHED
/// - `127.0.0.1:3000` or `[::1]:3000`: state defaults to LISTEN
///
/// A wildcard port (`*:*`) is rejected.
pub fn parse_name_field(name: &str) -> Option<(u16, String)> {
    let mut name = name.trim();
    let mut state: Option<String> = None;

    if let (Some(open), Some(close)) = (name.rfind('('), name.rfind(')')) {
        if close > open {
            state = Some(name[open + 1..close].to_string());
            name = name[..open].trim();
        }
    }

    let local = match name.find("->") {
        Some(idx) => {
            state.get_or_insert_with(|| STATE_ESTABLISHED.to_string());
            &name[..idx]
        }
        None => name,
    };

    let port_str = match local.rfind(':') {
        Some(idx) => &local[idx + 1..],
        None => local,
    };
    if port_str == "*" {
        return None;
    }

    let port: u16 = port_str.parse().ok()?;
    Some((port, state.unwrap_or_else(|| STATE_LISTEN.to_string())))
}

/// lsof escapes some bytes in COMMAND.
fn unescape_process_name(raw: &str) -> String {
    raw.replace("\\x20", " ") // Space
        .replace("\\x2f", "/") // Slash
}

/// Parse `ps -axo pid=,command=` output into a PID -> full command map.
///
/// Commands longer than [`MAX_COMMAND_LEN`] characters are truncated.
pub fn parse_ps_commands(output: &str) -> HashMap<u32, String> {
    let mut commands = HashMap::new();

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Split into PID and command (only first split)
        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let pid: u32 = match parts.next().map(str::parse) {
            Some(Ok(p)) => p,
            _ => continue,
        };
        let command = match parts.next() {
            Some(s) if !s.trim().is_empty() => s.trim(),
            _ => continue,
        };

        let command = if command.chars().count() > MAX_COMMAND_LEN {
            format!("{}...", command.chars().take(MAX_COMMAND_LEN).collect::<String>())
        } else {
            command.to_string()
        };

        commands.insert(pid, command);
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "COMMAND     PID      USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME";

    #[test]
    fn test_parse_listen_rows() {
        let output = format!(
            "{HEADER}
nginx      1234      root    6u  IPv4 0x1234567890      0t0  TCP *:80 (LISTEN)
nginx      1234      root    7u  IPv4 0x1234567891      0t0  TCP *:443 (LISTEN)
node       5678       dev    8u  IPv6 0x1234567892      0t0  TCP [::1]:3000 (LISTEN)
postgres   9012 _postgres    9u  IPv4 0x1234567893      0t0  TCP 127.0.0.1:5432 (LISTEN)
"
        );

        let entries = parse_lsof_output(&output);
        assert_eq!(entries.len(), 4);

        let e = &entries[0];
        assert_eq!(e.process, "nginx");
        assert_eq!(e.pid, 1234);
        assert_eq!(e.user, "root");
        assert_eq!(e.fd, "6u");
        assert_eq!(e.protocol, Protocol::Tcp);
        assert_eq!(e.port, 80);
        assert_eq!(e.state, "LISTEN");
        assert_eq!(e.command, "nginx");

        // Input order is preserved
        let ports: Vec<u16> = entries.iter().map(|e| e.port).collect();
        assert_eq!(ports, vec![80, 443, 3000, 5432]);
        assert_eq!(entries[3].user, "_postgres");
    }

    #[test]
    fn test_parse_established() {
        let output = format!(
            "{HEADER}
chrome     1111       dev   20u  IPv4 0x1234567890      0t0  TCP 192.168.1.10:54321->93.184.216.34:443
"
        );

        let entries = parse_lsof_output(&output);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].port, 54321);
        assert_eq!(entries[0].state, "ESTABLISHED");
        assert_eq!(entries[0].process, "chrome");
    }

    #[test]
    fn test_parse_explicit_state_wins_over_arrow_default() {
        let output = format!(
            "{HEADER}
curl        222       dev    5u  IPv4 0x1234567890      0t0  TCP 10.0.0.2:50000->10.0.0.3:80 (CLOSE_WAIT)
"
        );

        let entries = parse_lsof_output(&output);
        assert_eq!(entries[0].port, 50000);
        assert_eq!(entries[0].state, "CLOSE_WAIT");
    }

    #[test]
    fn test_parse_udp() {
        let output = format!(
            "{HEADER}
mDNSRespo   100      root    5u  IPv4 0x1234567890      0t0  UDP *:5353
"
        );

        let entries = parse_lsof_output(&output);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].protocol, Protocol::Udp);
        assert_eq!(entries[0].port, 5353);
        assert_eq!(entries[0].state, "LISTEN");
    }

    #[test]
    fn test_malformed_rows_are_dropped() {
        let output = format!(
            "{HEADER}
garbage
node       notapid    dev    8u  IPv6 0x1234567892      0t0  TCP *:3000 (LISTEN)
launchd       1      root   10u  IPv4 0x1234567890      0t0  UDP *:*
nginx      1234      root    6u  IPv4 0x1234567890      0t0  TCP *:80 (LISTEN)
"
        );

        let entries = parse_lsof_output(&output);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].process, "nginx");
    }

    #[test]
    fn test_empty_and_header_only() {
        assert!(parse_lsof_output("").is_empty());
        assert!(parse_lsof_output(&format!("{HEADER}\n")).is_empty());
    }

    #[test]
    fn test_unescape_process_name() {
        let output = format!(
            "{HEADER}
Code\\x20Helper  1234  user   10u  IPv4 0x1234567890abcdef      0t0  TCP *:3000 (LISTEN)
"
        );

        let entries = parse_lsof_output(&output);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].process, "Code Helper");
    }

    #[test]
    fn test_parse_name_field() {
        let cases = [
            ("*:8080", Some((8080, "LISTEN"))),
            ("127.0.0.1:3000", Some((3000, "LISTEN"))),
            ("*:443 (LISTEN)", Some((443, "LISTEN"))),
            ("[fe80::1]:8080", Some((8080, "LISTEN"))),
            (
                "192.168.1.10:54321->93.184.216.34:443",
                Some((54321, "ESTABLISHED")),
            ),
            ("*:*", None),
            ("*:http", None),
            ("*:70000", None),
        ];

        for (input, expected) in cases {
            let got = parse_name_field(input);
            let got = got.as_ref().map(|(p, s)| (*p, s.as_str()));
            assert_eq!(got, expected, "input {:?}", input);
        }
    }

    #[test]
    fn test_parse_ps_commands() {
        let long = "x".repeat(250);
        let output = format!(
            "  1 /sbin/launchd\n 412 /usr/local/bin/node server.js --port 3000\nbad line\n 77 {long}\n"
        );

        let commands = parse_ps_commands(&output);
        assert_eq!(commands.get(&1).unwrap(), "/sbin/launchd");
        assert_eq!(
            commands.get(&412).unwrap(),
            "/usr/local/bin/node server.js --port 3000"
        );
        assert_eq!(commands.get(&77).unwrap().len(), MAX_COMMAND_LEN + 3);
        assert_eq!(commands.len(), 3);
    }
}
