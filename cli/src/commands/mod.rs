//! One-shot subcommands.

pub mod config;
pub mod history;
pub mod info;
pub mod kill;
pub mod list;
pub mod watch;

use whport_core::ListenerEntry;

use crate::format::{render_table, truncate};

/// PORT/PROTO/PID/PROCESS/USER/STATE table, optionally with COMMAND.
pub(crate) fn entries_table(entries: &[ListenerEntry], command_width: Option<usize>) -> String {
    let mut headers = vec!["PORT", "PROTO", "PID", "PROCESS", "USER", "STATE"];
    if command_width.is_some() {
        headers.push("COMMAND");
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            let mut row = vec![
                e.port.to_string(),
                e.protocol.to_string(),
                e.pid.to_string(),
                e.process.clone(),
                e.user.clone(),
                e.state.clone(),
            ];
            if let Some(width) = command_width {
                row.push(truncate(&e.command, width));
            }
            row
        })
        .collect();

    render_table(&headers, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use whport_core::Protocol;

    #[test]
    fn test_entries_table() {
        let mut e = ListenerEntry::new(3000, Protocol::Tcp, 42, "node", "dev", "LISTEN", "19u");
        e.command = "/usr/local/bin/node /srv/app/a-very-long-entry-point.js".to_string();

        let plain = entries_table(&[e.clone()], None);
        assert!(plain.starts_with("PORT  PROTO  PID  PROCESS  USER  STATE\n"));
        assert!(!plain.contains("COMMAND"));

        let wide = entries_table(&[e], Some(20));
        assert!(wide.contains("COMMAND"));
        assert!(wide.contains("/usr/local/bin/no..."));
    }
}
