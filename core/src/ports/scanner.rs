//! Listener scanner port (interface).

use crate::domain::ListenerEntry;
use crate::error::Result;

/// Port for discovering which processes own which sockets.
///
/// Implementations handle the details of the external utility (lsof).
pub trait ListenerSource: Send + Sync {
    /// Sockets in listen state, both protocols.
    fn list_ports(&self) -> impl std::future::Future<Output = Result<Vec<ListenerEntry>>> + Send;

    /// Listening sockets plus established connections.
    fn list_all_ports(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ListenerEntry>>> + Send;

    /// Entries whose local port is exactly `port`, in any state.
    fn find_by_port(
        &self,
        port: u16,
    ) -> impl std::future::Future<Output = Result<Vec<ListenerEntry>>> + Send;

    /// Listening entries whose process name or command contains `name`,
    /// case-insensitively.
    fn find_by_process(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ListenerEntry>>> + Send;
}
