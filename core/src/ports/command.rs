//! Command execution port (interface).

use crate::error::Result;

/// Port for running external inspection utilities.
///
/// Implementations capture stdout and return it; a failure to run the
/// program at all is an error. Scanners and fetchers never spawn processes
/// directly, which keeps them testable with canned output.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and return its captured stdout.
    fn run(
        &self,
        program: &str,
        args: &[&str],
    ) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

impl<T: CommandRunner> CommandRunner for std::sync::Arc<T> {
    fn run(
        &self,
        program: &str,
        args: &[&str],
    ) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send {
        (**self).run(program, args)
    }
}
