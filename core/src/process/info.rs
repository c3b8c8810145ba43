//! Detailed process profiles from ps and pgrep.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use tracing::{debug, warn};

use crate::domain::ProcessProfile;
use crate::error::{Error, Result};
use crate::ports::CommandRunner;

use super::short_name;

/// Columns requested from ps. `lstart` expands to five tokens.
const DETAIL_FORMAT: &str = "pid=,ppid=,user=,%cpu=,rss=,lstart=,command=";

/// pid, ppid, user, cpu, rss, five start tokens, at least one command token.
const MIN_DETAIL_FIELDS: usize = 11;

/// Layout of ps's `lstart` column once whitespace is collapsed,
/// e.g. "Mon Jan 2 15:04:05 2006".
const LSTART_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Fetches a [`ProcessProfile`] through a [`CommandRunner`].
pub struct InfoFetcher<R> {
    runner: R,
}

impl<R: CommandRunner> InfoFetcher<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Profile of `pid`.
    ///
    /// Fails only when the detail query fails or has no row for `pid`. The
    /// short name and child list are best-effort.
    pub async fn get_info(&self, pid: u32) -> Result<ProcessProfile> {
        let pid_arg = pid.to_string();

        let output = self
            .runner
            .run("ps", &["-p", &pid_arg, "-o", DETAIL_FORMAT])
            .await?;
        let stdout = String::from_utf8_lossy(&output);
        let line = stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .ok_or_else(|| Error::NotFound(format!("process {} is not running", pid)))?;

        let mut profile = parse_detail_line(line, pid)?;

        match self.runner.run("ps", &["-p", &pid_arg, "-o", "comm="]).await {
            Ok(output) => {
                profile.name = short_name(&String::from_utf8_lossy(&output)).to_string();
            }
            Err(e) => warn!(pid = pid, error = %e, "Could not read process name"),
        }

        match self.runner.run("pgrep", &["-P", &pid_arg]).await {
            Ok(output) => profile.children = parse_child_pids(&String::from_utf8_lossy(&output)),
            Err(e) => warn!(pid = pid, error = %e, "Could not list child processes"),
        }

        debug!(pid = pid, children = profile.children.len(), "Fetched process info");
        Ok(profile)
    }
}

/// Parse one `ps -o pid=,ppid=,user=,%cpu=,rss=,lstart=,command=` row.
///
/// Numeric fields that do not parse become zero (the PID falls back to
/// `requested`), an unparseable start time becomes `None`.
pub fn parse_detail_line(line: &str, requested: u32) -> Result<ProcessProfile> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MIN_DETAIL_FIELDS {
        return Err(Error::ParseError(format!(
            "expected at least {} ps fields, got {}: {:?}",
            MIN_DETAIL_FIELDS,
            fields.len(),
            line
        )));
    }

    let lstart = fields[5..10].join(" ");
    let started_at = parse_lstart(&lstart);
    if started_at.is_none() {
        warn!(pid = requested, lstart = %lstart, "Unparseable process start time");
    }

    Ok(ProcessProfile {
        pid: fields[0].parse().unwrap_or(requested),
        ppid: fields[1].parse().unwrap_or(0),
        name: String::new(),
        user: fields[2].to_string(),
        command: fields[10..].join(" "),
        started_at,
        cpu_percent: fields[3].parse().unwrap_or(0.0),
        rss_bytes: fields[4].parse::<u64>().unwrap_or(0).saturating_mul(1024),
        children: Vec::new(),
    })
}

fn parse_lstart(value: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(value, LSTART_FORMAT).ok()?;
    Local.from_local_datetime(&naive).earliest()
}

/// Parse newline-separated PIDs, skipping anything non-numeric.
pub fn parse_child_pids(output: &str) -> Vec<u32> {
    output
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect()
}
