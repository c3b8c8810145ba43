//! Command runner adapters.

use std::collections::HashMap;
use std::process::Stdio;

use parking_lot::Mutex;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ports::CommandRunner;

/// Runs real programs through `tokio::process`.
///
/// Stderr is discarded so utilities cannot scribble over the dashboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    /// Exit code 1 with no output is how lsof, ps and pgrep report "nothing
    /// matched", so it yields an empty result. Any other non-zero exit without
    /// output is a failure. Output produced alongside a non-zero exit (lsof
    /// lacking permission for some sockets) is still returned.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Vec<u8>> {
        debug!(program = program, args = ?args, "Running command");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run {}: {}", program, e)))?;

        if output.status.success() {
            return Ok(output.stdout);
        }

        match output.status.code() {
            _ if !output.stdout.is_empty() => {
                warn!(program = program, status = %output.status, "Command exited unsuccessfully but produced output");
                Ok(output.stdout)
            }
            Some(1) => {
                debug!(program = program, "Command matched nothing");
                Ok(Vec::new())
            }
            _ => Err(Error::CommandFailed(format!(
                "{} {} exited with {}",
                program,
                args.join(" "),
                output.status
            ))),
        }
    }
}

/// Command runner returning canned responses, for tests and demos.
///
/// Responses are keyed by the full command line (`"ps -p 42 -o comm="`).
/// Unknown command lines produce empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: Mutex<HashMap<String, std::result::Result<Vec<u8>, String>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `command_line` with `output`.
    pub fn with_output(self, command_line: &str, output: impl Into<String>) -> Self {
        self.set_output(command_line, output);
        self
    }

    /// Fail `command_line` with `reason`.
    pub fn with_failure(self, command_line: &str, reason: impl Into<String>) -> Self {
        self.set_failure(command_line, reason);
        self
    }

    /// Replace the response for `command_line`.
    pub fn set_output(&self, command_line: &str, output: impl Into<String>) {
        self.responses
            .lock()
            .insert(command_line.to_string(), Ok(output.into().into_bytes()));
    }

    pub fn set_failure(&self, command_line: &str, reason: impl Into<String>) {
        self.responses
            .lock()
            .insert(command_line.to_string(), Err(reason.into()));
    }

    /// Command lines run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Vec<u8>> {
        let key = if args.is_empty() {
            program.to_string()
        } else {
            format!("{} {}", program, args.join(" "))
        };
        self.calls.lock().push(key.clone());

        match self.responses.lock().get(&key) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(reason)) => Err(Error::CommandFailed(reason.clone())),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_runner_responses() {
        let runner = ScriptedRunner::new()
            .with_output("ps -p 1 -o comm=", "launchd\n")
            .with_failure("lsof -i:80 -P -n", "boom");

        let out = runner.run("ps", &["-p", "1", "-o", "comm="]).await.unwrap();
        assert_eq!(out, b"launchd\n");

        let err = runner.run("lsof", &["-i:80", "-P", "-n"]).await.unwrap_err();
        assert!(matches!(err, Error::CommandFailed(_)));

        let empty = runner.run("pgrep", &["-P", "1"]).await.unwrap();
        assert!(empty.is_empty());

        assert_eq!(
            runner.calls(),
            vec!["ps -p 1 -o comm=", "lsof -i:80 -P -n", "pgrep -P 1"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_captures_stdout() {
        let out = SystemRunner::new().run("echo", &["hello"]).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&out).trim(), "hello");
    }

    #[tokio::test]
    async fn test_system_runner_missing_program() {
        let result = SystemRunner::new()
            .run("/definitely/not/a/real/program", &[])
            .await;
        assert!(matches!(result, Err(Error::CommandFailed(_))));
    }
}
