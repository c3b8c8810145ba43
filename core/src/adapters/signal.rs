//! Signal delivery adapters.

use std::collections::{HashMap, HashSet};
use std::io;

use parking_lot::Mutex;

use crate::ports::SignalSender;
use crate::process::KillSignal;

/// Delivers real signals with `kill(2)`.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct NixSignals;

#[cfg(unix)]
impl NixSignals {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
impl SignalSender for NixSignals {
    fn deliver(&self, pid: u32, signal: Option<KillSignal>) -> io::Result<()> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let raw = i32::try_from(pid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "PID out of range"))?;
        kill(Pid::from_raw(raw), signal.map(Signal::from)).map_err(io::Error::from)
    }
}

/// How a simulated process reacts to SIGTERM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermBehavior {
    /// Still present for this many further existence probes, then gone.
    ExitAfterProbes(u32),
    /// Keeps running until SIGKILL.
    Ignore,
}

#[derive(Debug)]
struct SimulatedProcess {
    on_term: TermBehavior,
    countdown: Option<u32>,
}

#[derive(Debug, Default)]
struct ProcessTable {
    processes: HashMap<u32, SimulatedProcess>,
    denied: HashSet<u32>,
    unreachable: HashSet<u32>,
    delivered: Vec<(u32, KillSignal)>,
}

/// Signal sender backed by a simulated process table, for tests and demos.
#[derive(Debug, Default)]
pub struct ScriptedSignals {
    table: Mutex<ProcessTable>,
}

impl ScriptedSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a live process with the given SIGTERM behavior.
    pub fn with_process(self, pid: u32, on_term: TermBehavior) -> Self {
        self.table.lock().processes.insert(
            pid,
            SimulatedProcess {
                on_term,
                countdown: None,
            },
        );
        self
    }

    /// Make every real signal to `pid` fail with permission denied.
    pub fn deny(self, pid: u32) -> Self {
        self.table.lock().denied.insert(pid);
        self
    }

    /// Make every signal to `pid`, the existence probe included, fail with
    /// permission denied, as for a process owned by another user.
    pub fn deny_all(self, pid: u32) -> Self {
        {
            let mut table = self.table.lock();
            table.denied.insert(pid);
            table.unreachable.insert(pid);
        }
        self
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        self.table.lock().processes.contains_key(&pid)
    }

    /// Real signals delivered so far (probes excluded), in order.
    pub fn delivered(&self) -> Vec<(u32, KillSignal)> {
        self.table.lock().delivered.clone()
    }
}

fn no_such_process() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, "No such process")
}

fn permission_denied() -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, "Operation not permitted")
}

impl SignalSender for ScriptedSignals {
    fn deliver(&self, pid: u32, signal: Option<KillSignal>) -> io::Result<()> {
        let mut table = self.table.lock();

        let Some(signal) = signal else {
            if table.unreachable.contains(&pid) && table.processes.contains_key(&pid) {
                return Err(permission_denied());
            }
            let countdown = table
                .processes
                .get(&pid)
                .ok_or_else(no_such_process)?
                .countdown;
            match countdown {
                Some(0) => {
                    table.processes.remove(&pid);
                    return Err(no_such_process());
                }
                Some(n) => {
                    if let Some(process) = table.processes.get_mut(&pid) {
                        process.countdown = Some(n - 1);
                    }
                }
                None => {}
            }
            return Ok(());
        };

        if !table.processes.contains_key(&pid) {
            return Err(no_such_process());
        }
        if table.denied.contains(&pid) {
            return Err(permission_denied());
        }

        table.delivered.push((pid, signal));
        match signal {
            KillSignal::Kill => {
                table.processes.remove(&pid);
            }
            KillSignal::Term => {
                if let Some(process) = table.processes.get_mut(&pid) {
                    if let TermBehavior::ExitAfterProbes(n) = process.on_term {
                        process.countdown.get_or_insert(n);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}
