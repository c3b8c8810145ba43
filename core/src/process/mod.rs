//! Process lifecycle control and inspection.
//!
//! - [`ProcessManager`]: signal delivery, existence probes, identity checks,
//!   and the graceful kill protocol
//! - [`InfoFetcher`]: detailed point-in-time process profiles
//! - [`KillSignal`]: the signal names an operator may use

mod info;
mod manager;
mod signal;

pub use info::InfoFetcher;
pub use manager::{ProcessManager, ProtectedPids, GRACEFUL_KILL_TIMEOUT, POLL_INTERVAL};
pub use signal::KillSignal;

/// Name of the user this process runs as, or "unknown".
pub fn current_username() -> String {
    #[cfg(unix)]
    {
        use nix::unistd::{geteuid, User};
        if let Ok(Some(user)) = User::from_uid(geteuid()) {
            return user.name;
        }
    }
    std::env::var("USER").unwrap_or_else(|_| "unknown".to_string())
}

/// Last path segment of a command name, e.g. "/usr/sbin/nginx" -> "nginx".
pub(crate) fn short_name(command: &str) -> &str {
    let trimmed = command.trim();
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("/usr/sbin/nginx\n"), "nginx");
        assert_eq!(short_name("postgres"), "postgres");
        assert_eq!(short_name(""), "");
    }

    #[test]
    fn test_current_username_is_not_empty() {
        assert!(!current_username().is_empty());
    }
}
