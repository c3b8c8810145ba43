//! Signal delivery port (interface).

use crate::process::KillSignal;

/// Port for delivering signals to processes.
pub trait SignalSender: Send + Sync {
    /// Deliver `signal` to `pid`.
    ///
    /// `None` is the zero signal: nothing is delivered, but the call still
    /// fails if the process does not exist.
    fn deliver(&self, pid: u32, signal: Option<KillSignal>) -> std::io::Result<()>;
}

impl<T: SignalSender> SignalSender for std::sync::Arc<T> {
    fn deliver(&self, pid: u32, signal: Option<KillSignal>) -> std::io::Result<()> {
        (**self).deliver(pid, signal)
    }
}
