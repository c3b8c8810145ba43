//! History command - show, record and clear listener events.

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use whport_core::{Event, EventKind, HistoryStore, ScanScope};

use crate::format::render_table;
use crate::services::Services;

fn store() -> Result<HistoryStore> {
    HistoryStore::new().context("Failed to locate history file")
}

/// Newest first, at most `limit` events when given.
pub fn newest_first(mut events: Vec<Event>, limit: Option<usize>) -> Vec<Event> {
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    if let Some(limit) = limit.filter(|&n| n > 0) {
        events.truncate(limit);
    }
    events
}

pub async fn show(limit: Option<usize>, json: bool) -> Result<()> {
    let data = store()?.load().await.context("Failed to load history")?;

    if data.events.is_empty() && !json {
        println!("No history events recorded.");
        println!("Run 'whport history record' to start tracking port changes.");
        return Ok(());
    }

    let events = newest_first(data.events, limit);
    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
    } else {
        print!("{}", events_table(&events));
    }
    Ok(())
}

pub async fn record(services: &Services, json: bool) -> Result<()> {
    let entries = services
        .scans
        .scan(ScanScope::Listen)
        .await
        .context("Failed to scan ports")?;

    let now = Utc::now();
    let events = store()?
        .record(&entries, now)
        .await
        .context("Failed to record history")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    let at = now.with_timezone(&Local).format("%H:%M:%S");
    if events.is_empty() {
        println!("Snapshot recorded at {}. No changes detected.", at);
    } else {
        println!("Snapshot recorded at {}. {} change(s):\n", at, events.len());
        print!("{}", events_table(&events));
    }
    Ok(())
}

pub async fn clear() -> Result<()> {
    store()?.clear().await.context("Failed to clear history")?;
    println!("History cleared.");
    Ok(())
}

fn events_table(events: &[Event]) -> String {
    let rows: Vec<Vec<String>> = events
        .iter()
        .map(|e| {
            vec![
                e.timestamp
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
                match e.kind {
                    EventKind::Open => "OPEN".to_string(),
                    EventKind::Close => "CLOSE".to_string(),
                },
                e.port.to_string(),
                e.protocol.to_string(),
                e.pid.to_string(),
                e.process.clone(),
                e.user.clone(),
            ]
        })
        .collect();
    render_table(&["TIME", "EVENT", "PORT", "PROTO", "PID", "PROCESS", "USER"], &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use whport_core::Protocol;

    fn event(secs: i64, kind: EventKind, port: u16) -> Event {
        Event {
            timestamp: DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap(),
            kind,
            port,
            protocol: Protocol::Tcp,
            pid: 1,
            process: "svc".to_string(),
            user: "dev".to_string(),
        }
    }

    #[test]
    fn test_newest_first() {
        let events = vec![
            event(0, EventKind::Open, 80),
            event(20, EventKind::Close, 80),
            event(10, EventKind::Open, 3000),
        ];

        let all = newest_first(events.clone(), None);
        let ports: Vec<u16> = all.iter().map(|e| e.port).collect();
        assert_eq!(ports, vec![80, 3000, 80]);
        assert_eq!(all[0].kind, EventKind::Close);

        assert_eq!(newest_first(events.clone(), Some(2)).len(), 2);
        assert_eq!(newest_first(events.clone(), Some(0)).len(), 3);
        assert_eq!(newest_first(events, Some(10)).len(), 3);
    }

    #[test]
    fn test_events_table() {
        let out = events_table(&[event(0, EventKind::Close, 5432)]);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("TIME"));
        assert!(lines[1].contains("CLOSE"));
        assert!(lines[1].contains("5432"));
    }
}
