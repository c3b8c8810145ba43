//! Info command - details about the process on a port.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use whport_core::{ListenerEntry, ProcessProfile};

use crate::format::{format_bytes, format_duration};
use crate::services::Services;

/// The LISTEN entry on `port`, or any entry on it.
pub fn pick_entry(entries: &[ListenerEntry], port: u16) -> Option<&ListenerEntry> {
    entries
        .iter()
        .find(|e| e.port == port && e.is_listening())
        .or_else(|| entries.iter().find(|e| e.port == port))
}

#[derive(Serialize)]
struct InfoJson<'a> {
    port: u16,
    protocol: String,
    state: &'a str,
    pid: u32,
    process: &'a str,
    user: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<DateTime<Local>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cpu_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    memory_rss_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ppid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<&'a [u32]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn run(services: &Services, port: u16, json: bool) -> Result<()> {
    let entries = services
        .scans
        .find_by_port(port)
        .await
        .with_context(|| format!("Failed to find processes on port {}", port))?;

    let Some(entry) = pick_entry(&entries, port) else {
        bail!("No process found on port {}", port);
    };

    let profile = services.info.get_info(entry.pid).await;

    if json {
        println!("{}", info_json(entry, &profile)?);
        return Ok(());
    }

    print!("{}", info_text(entry, &profile, Local::now()));
    Ok(())
}

fn info_json(entry: &ListenerEntry, profile: &whport_core::Result<ProcessProfile>) -> Result<String> {
    let loaded = profile.as_ref().ok();
    let out = InfoJson {
        port: entry.port,
        protocol: entry.protocol.to_string(),
        state: &entry.state,
        pid: entry.pid,
        process: &entry.process,
        user: loaded.map_or(entry.user.as_str(), |p| p.user.as_str()),
        command: loaded.map(|p| p.command.as_str()),
        start_time: loaded.and_then(|p| p.started_at),
        cpu_percent: loaded.map(|p| p.cpu_percent),
        memory_rss_bytes: loaded.map(|p| p.rss_bytes),
        ppid: loaded.map(|p| p.ppid).filter(|&ppid| ppid > 0),
        children: loaded
            .map(|p| p.children.as_slice())
            .filter(|c| !c.is_empty()),
        error: profile.as_ref().err().map(|e| e.to_string()),
    };
    Ok(serde_json::to_string_pretty(&out)?)
}

fn info_text(
    entry: &ListenerEntry,
    profile: &whport_core::Result<ProcessProfile>,
    now: DateTime<Local>,
) -> String {
    let mut out = String::new();
    let mut line = |label: &str, value: String| {
        out.push_str(&format!("{:<13}{}\n", format!("{}:", label), value));
    };

    line("Port", format!("{}/{}", entry.port, entry.protocol));
    line("State", entry.state.clone());
    line("Process", format!("{} (PID {})", entry.process, entry.pid));

    match profile {
        Ok(p) => {
            line("Command", p.command.clone());
            line("User", p.user.clone());
            if let (Some(started), Some(uptime)) = (p.started_at, p.uptime(now)) {
                line(
                    "Started",
                    format!(
                        "{} ago ({})",
                        format_duration(uptime),
                        started.format("%Y-%m-%d %H:%M:%S")
                    ),
                );
            }
            line("CPU", format!("{:.1}%", p.cpu_percent));
            line("Memory", format!("{} (RSS)", format_bytes(p.rss_bytes)));
            if p.ppid > 0 {
                line("Parent PID", p.ppid.to_string());
            }
            if !p.children.is_empty() {
                let children: Vec<String> = p.children.iter().map(u32::to_string).collect();
                line("Children", children.join(", "));
            }
        }
        Err(e) => {
            line("User", entry.user.clone());
            line("Details", format!("(unavailable: {})", e));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use whport_core::domain::{STATE_ESTABLISHED, STATE_LISTEN};
    use whport_core::{Error, Protocol};

    fn entry() -> ListenerEntry {
        ListenerEntry::new(5432, Protocol::Tcp, 88, "postgres", "_postgres", STATE_LISTEN, "7u")
    }

    fn profile(now: DateTime<Local>) -> ProcessProfile {
        ProcessProfile {
            pid: 88,
            ppid: 1,
            name: "postgres".to_string(),
            user: "_postgres".to_string(),
            command: "/usr/local/bin/postgres -D /var/db".to_string(),
            started_at: Some(now - chrono::Duration::minutes(90)),
            cpu_percent: 0.25,
            rss_bytes: 3 * 1024 * 1024,
            children: vec![90, 91],
        }
    }

    #[test]
    fn test_pick_entry_prefers_listen() {
        let conn = ListenerEntry::new(5432, Protocol::Tcp, 99, "psql", "dev", STATE_ESTABLISHED, "3u");
        let entries = vec![conn.clone(), entry()];
        assert_eq!(pick_entry(&entries, 5432).unwrap().pid, 88);

        let only_conn = vec![conn];
        assert_eq!(pick_entry(&only_conn, 5432).unwrap().pid, 99);
        assert!(pick_entry(&only_conn, 80).is_none());
    }

    #[test]
    fn test_info_text() {
        let now = Local.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let text = info_text(&entry(), &Ok(profile(now)), now);

        assert!(text.contains("Port:        5432/TCP\n"));
        assert!(text.contains("Process:     postgres (PID 88)\n"));
        assert!(text.contains("Started:     1h 30m ago (2024-06-01 10:30:00)\n"));
        assert!(text.contains("CPU:         0.2%") || text.contains("CPU:         0.3%"));
        assert!(text.contains("Memory:      3.0 MB (RSS)\n"));
        assert!(text.contains("Parent PID:  1\n"));
        assert!(text.contains("Children:    90, 91\n"));
    }

    #[test]
    fn test_info_text_without_details() {
        let now = Local::now();
        let text = info_text(&entry(), &Err(Error::NotFound("process 88 is not running".into())), now);
        assert!(text.contains("User:        _postgres\n"));
        assert!(text.contains("(unavailable: Not found: process 88 is not running)"));
    }

    #[test]
    fn test_info_json() {
        let now = Local::now();
        let json = info_json(&entry(), &Ok(profile(now))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["port"], 5432);
        assert_eq!(value["protocol"], "TCP");
        assert_eq!(value["ppid"], 1);
        assert_eq!(value["children"], serde_json::json!([90, 91]));
        assert!(value.get("error").is_none());

        let json = info_json(&entry(), &Err(Error::NotFound("gone".into()))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("command").is_none());
        assert!(value.get("children").is_none());
        assert!(value["error"].as_str().unwrap().contains("gone"));
    }
}
