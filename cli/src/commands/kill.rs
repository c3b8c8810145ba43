//! Kill command - terminate the process listening on a port.

use anyhow::{bail, Context, Result};
use whport_core::{ErrorKind, KillMode, KillSignal, KillStatus, ListenerEntry};

use crate::services::Services;

/// Pick the kill protocol from the flags. `--force` wins over `--signal`;
/// `--signal KILL` is the same as `--force`.
pub fn resolve_mode(force: bool, signal: Option<KillSignal>) -> KillMode {
    match (force, signal) {
        (true, _) | (false, Some(KillSignal::Kill)) => KillMode::Force,
        (false, Some(signal)) => KillMode::Signal(signal),
        (false, None) => KillMode::Graceful,
    }
}

fn signal_name(mode: KillMode) -> &'static str {
    match mode {
        KillMode::Graceful => KillSignal::Term.name(),
        KillMode::Force => KillSignal::Kill.name(),
        KillMode::Signal(signal) => signal.name(),
    }
}

/// LISTEN entries on exactly `port`.
pub fn listeners_on(entries: Vec<ListenerEntry>, port: u16) -> Vec<ListenerEntry> {
    entries
        .into_iter()
        .filter(|e| e.port == port && e.is_listening())
        .collect()
}

pub async fn run(
    services: &Services,
    port: u16,
    force: bool,
    signal: Option<KillSignal>,
) -> Result<()> {
    let entries = services
        .scans
        .find_by_port(port)
        .await
        .with_context(|| format!("Failed to find processes on port {}", port))?;

    let listeners = listeners_on(entries, port);
    if listeners.is_empty() {
        bail!("No process listening on port {}", port);
    }

    let configured = services.config().kill_signal;
    let signal = signal.or_else(|| Some(configured).filter(|s| *s != KillSignal::Term));
    let mode = resolve_mode(force, signal);

    for entry in &listeners {
        println!(
            "Killing {} (PID {}) on port {} with {}...",
            entry.process,
            entry.pid,
            entry.port,
            signal_name(mode)
        );

        let status = match services.kills.terminate(entry, mode).await {
            Ok(status) => status,
            Err(e) if e.kind() == ErrorKind::Stale => {
                println!("Warning: {}. Skipping.", e);
                continue;
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context(format!("Failed to kill PID {}", entry.pid)))
            }
        };

        match status {
            KillStatus::Terminated => println!(
                "Process {} (PID {}) terminated gracefully.",
                entry.process, entry.pid
            ),
            KillStatus::StillRunning => {
                println!(
                    "Process {} (PID {}) did not exit after SIGTERM.",
                    entry.process, entry.pid
                );
                println!("Use --force to send SIGKILL.");
            }
            KillStatus::ForceKilled => println!("Sent SIGKILL to PID {}.", entry.pid),
            KillStatus::Signalled(signal) => println!("Sent {} to PID {}.", signal, entry.pid),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use whport_core::domain::{STATE_ESTABLISHED, STATE_LISTEN};
    use whport_core::Protocol;

    #[test]
    fn test_resolve_mode() {
        assert_eq!(resolve_mode(false, None), KillMode::Graceful);
        assert_eq!(resolve_mode(true, None), KillMode::Force);
        assert_eq!(resolve_mode(true, Some(KillSignal::Hup)), KillMode::Force);
        assert_eq!(resolve_mode(false, Some(KillSignal::Kill)), KillMode::Force);
        assert_eq!(
            resolve_mode(false, Some(KillSignal::Int)),
            KillMode::Signal(KillSignal::Int)
        );
        assert_eq!(signal_name(KillMode::Graceful), "SIGTERM");
    }

    #[test]
    fn test_listeners_on() {
        let conn = ListenerEntry::new(443, Protocol::Tcp, 2, "nginx", "www", STATE_ESTABLISHED, "7u");
        let entries = vec![
            ListenerEntry::new(443, Protocol::Tcp, 1, "nginx", "root", STATE_LISTEN, "6u"),
            conn,
            ListenerEntry::new(4430, Protocol::Tcp, 3, "dev", "dev", STATE_LISTEN, "6u"),
        ];
        let found = listeners_on(entries, 443);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pid, 1);
    }
}
