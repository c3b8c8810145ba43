//! Kill use case: identity check, then the requested kill protocol.

use tracing::info;

use crate::domain::ListenerEntry;
use crate::error::{Error, Result};
use crate::ports::{CommandRunner, SignalSender};
use crate::process::{KillSignal, ProcessManager};

/// How to terminate a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillMode {
    /// SIGTERM, then wait for the process to exit.
    Graceful,
    /// SIGKILL.
    Force,
    /// Deliver a specific signal and return immediately.
    Signal(KillSignal),
}

/// Outcome of a kill that was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillStatus {
    /// Exited after SIGTERM within the wait budget.
    Terminated,
    /// Still alive when the wait budget ran out.
    StillRunning,
    ForceKilled,
    Signalled(KillSignal),
}

impl KillStatus {
    /// Whether the operator got what they asked for.
    pub fn is_success(&self) -> bool {
        !matches!(self, KillStatus::StillRunning)
    }

    /// One-line description for `entry`.
    pub fn describe(&self, entry: &ListenerEntry) -> String {
        match self {
            KillStatus::Terminated => format!(
                "Killed {} (PID {}) on port {}",
                entry.process, entry.pid, entry.port
            ),
            KillStatus::ForceKilled => format!(
                "Force killed {} (PID {}) on port {}",
                entry.process, entry.pid, entry.port
            ),
            KillStatus::StillRunning => {
                "process did not exit after SIGTERM (still running)".to_string()
            }
            KillStatus::Signalled(signal) => format!(
                "Sent {} to {} (PID {}) on port {}",
                signal, entry.process, entry.pid, entry.port
            ),
        }
    }
}

/// Terminates the process behind a scanned entry.
pub struct KillService<R, S> {
    manager: ProcessManager<R, S>,
}

impl<R: CommandRunner, S: SignalSender> KillService<R, S> {
    pub fn new(manager: ProcessManager<R, S>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &ProcessManager<R, S> {
        &self.manager
    }

    /// Verify `entry.pid` still runs `entry.process`, then kill it per `mode`.
    ///
    /// A mismatch is refused as [`Error::Stale`](crate::Error::Stale) and
    /// nothing is signalled.
    pub async fn terminate(&self, entry: &ListenerEntry, mode: KillMode) -> Result<KillStatus> {
        if self.manager.is_protected(entry.pid) {
            return Err(Error::Protected { pid: entry.pid });
        }
        self.manager.verify_process(entry.pid, &entry.process).await?;

        let status = match mode {
            KillMode::Graceful => {
                if self.manager.graceful_kill(entry.pid).await? {
                    KillStatus::Terminated
                } else {
                    KillStatus::StillRunning
                }
            }
            KillMode::Force => {
                self.manager.force_kill(entry.pid)?;
                KillStatus::ForceKilled
            }
            KillMode::Signal(signal) => {
                self.manager.kill(entry.pid, signal)?;
                KillStatus::Signalled(signal)
            }
        };

        info!(pid = entry.pid, port = entry.port, status = ?status, "Kill finished");
        Ok(status)
    }
}
