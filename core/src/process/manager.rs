//! Process manager: signals, liveness and identity checks for one PID.

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ports::{CommandRunner, SignalSender};

use super::{short_name, KillSignal};

/// Total time a graceful kill waits for the process to exit.
pub const GRACEFUL_KILL_TIMEOUT: Duration = Duration::from_secs(3);

/// Interval between liveness probes while waiting.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// PIDs that may never be signalled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedPids(BTreeSet<u32>);

impl ProtectedPids {
    pub fn new(pids: impl IntoIterator<Item = u32>) -> Self {
        Self(pids.into_iter().collect())
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.0.contains(&pid)
    }
}

impl Default for ProtectedPids {
    /// The kernel scheduler and init.
    fn default() -> Self {
        Self::new([0, 1])
    }
}

/// State-free lifecycle controller keyed by PID.
///
/// Signals go through a [`SignalSender`]; identity lookups go through a
/// [`CommandRunner`].
pub struct ProcessManager<R, S> {
    runner: R,
    signals: S,
    protected: ProtectedPids,
}

impl<R: CommandRunner, S: SignalSender> ProcessManager<R, S> {
    pub fn new(runner: R, signals: S, protected: ProtectedPids) -> Self {
        Self {
            runner,
            signals,
            protected,
        }
    }

    /// Send `signal` to `pid`.
    ///
    /// Protected PIDs are refused before anything else is checked.
    pub fn kill(&self, pid: u32, signal: KillSignal) -> Result<()> {
        if self.is_protected(pid) {
            warn!(pid = pid, "Refusing to signal protected PID");
            return Err(Error::Protected { pid });
        }

        if !self.is_running(pid) {
            return Err(Error::NotFound(format!("process {} is not running", pid)));
        }

        debug!(pid = pid, signal = %signal, "Sending signal");
        self.signals
            .deliver(pid, Some(signal))
            .map_err(|source| Error::Signal { pid, signal, source })
    }

    /// Existence probe with the zero signal: true only when the probe is
    /// delivered.
    pub fn is_running(&self, pid: u32) -> bool {
        self.signals.deliver(pid, None).is_ok()
    }

    pub fn is_protected(&self, pid: u32) -> bool {
        self.protected.contains(pid)
    }

    /// Send SIGTERM and wait up to [`GRACEFUL_KILL_TIMEOUT`] for the process
    /// to exit, probing every [`POLL_INTERVAL`].
    ///
    /// Returns whether the process is gone. Never escalates on its own.
    pub async fn graceful_kill(&self, pid: u32) -> Result<bool> {
        self.kill(pid, KillSignal::Term)?;

        let deadline = Instant::now() + GRACEFUL_KILL_TIMEOUT;
        while Instant::now() < deadline {
            if !self.is_running(pid) {
                debug!(pid = pid, "Process exited after SIGTERM");
                return Ok(true);
            }
            sleep(POLL_INTERVAL).await;
        }

        let exited = !self.is_running(pid);
        if !exited {
            debug!(pid = pid, "Process still running after SIGTERM");
        }
        Ok(exited)
    }

    /// Send SIGKILL.
    pub fn force_kill(&self, pid: u32) -> Result<()> {
        self.kill(pid, KillSignal::Kill)
    }

    /// Current short command name of `pid`.
    pub async fn current_name(&self, pid: u32) -> Result<String> {
        let output = self
            .runner
            .run("ps", &["-p", &pid.to_string(), "-o", "comm="])
            .await?;
        let name = short_name(&String::from_utf8_lossy(&output)).to_string();
        if name.is_empty() {
            return Err(Error::NotFound(format!("process {} is not running", pid)));
        }
        Ok(name)
    }

    /// Check that `pid` still runs the command observed earlier as
    /// `expected`, case-insensitively.
    ///
    /// A mismatch means the PID was probably reused and is reported as
    /// [`Error::Stale`].
    pub async fn verify_process(&self, pid: u32, expected: &str) -> Result<()> {
        let actual = self.current_name(pid).await?;
        if actual.eq_ignore_ascii_case(expected.trim()) {
            return Ok(());
        }

        warn!(pid = pid, expected = expected, actual = %actual, "PID now belongs to a different process");
        Err(Error::Stale {
            pid,
            expected: expected.to_string(),
            actual,
        })
    }
}
