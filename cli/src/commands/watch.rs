//! Watch command - periodically redraw the port table, or alert on new
//! listeners.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Local;
use serde::Serialize;
use whport_core::history::new_listeners;
use whport_core::{ListenerEntry, ListenerKey};

use super::entries_table;
use super::list::ListFilters;
use crate::services::Services;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub async fn run(
    services: &Services,
    filters: &ListFilters,
    interval: Option<u64>,
    alert: bool,
    json: bool,
) -> Result<()> {
    let every = interval
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| services.config().refresh_every());

    if alert {
        return run_alert(services, filters, every, json).await;
    }

    let mut ticker = tokio::time::interval(every);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                println!("\nStopped watching.");
                return Ok(());
            }
            _ = ticker.tick() => {
                match filters.scan(services).await {
                    Ok(entries) => print!("{}", frame(&entries, filters)),
                    Err(e) => eprintln!("Error: {:#}", e),
                }
            }
        }
    }
}

async fn run_alert(
    services: &Services,
    filters: &ListFilters,
    every: Duration,
    json: bool,
) -> Result<()> {
    let baseline = filters.scan(services).await?;
    let baseline_keys: HashSet<ListenerKey> = baseline.iter().map(ListenerEntry::key).collect();

    if !json {
        println!(
            "Monitoring {} port(s) for new listeners... (interval: {}s)",
            baseline.len(),
            every.as_secs()
        );
    }

    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                if !json {
                    println!("\nStopped watching.");
                }
                return Ok(());
            }
            _ = ticker.tick() => {
                let current = match filters.scan(services).await {
                    Ok(current) => current,
                    Err(e) => {
                        eprintln!("Error: {:#}", e);
                        continue;
                    }
                };

                let fresh = new_listeners(&baseline_keys, &current);
                if !fresh.is_empty() {
                    if json {
                        println!("{}", alert_json(&fresh)?);
                    } else {
                        println!("\nALERT: {} new port listener(s) detected!\n", fresh.len());
                        print!("{}", entries_table(&fresh, None));
                    }
                    bail!("alert: {} new port listener(s) detected", fresh.len());
                }
            }
        }
    }
}

#[derive(Serialize)]
struct AlertJson<'a> {
    alert: &'static str,
    count: usize,
    entries: &'a [ListenerEntry],
}

fn alert_json(entries: &[ListenerEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&AlertJson {
        alert: "new_port_listeners",
        count: entries.len(),
        entries,
    })?)
}

fn frame(entries: &[ListenerEntry], filters: &ListFilters) -> String {
    let listening = entries.iter().filter(|e| e.is_listening()).count();
    let mut out = String::from(CLEAR_SCREEN);
    out.push_str(&format!(
        "whport watch | Listening: {}  Total: {} | {} | Ctrl+C to stop\n\n",
        listening,
        entries.len(),
        Local::now().format("%H:%M:%S")
    ));

    if entries.is_empty() {
        out.push_str("No ports found matching filter.\n");
    } else {
        out.push_str(&entries_table(entries, Some(40)));
    }

    let active = filters.describe();
    if !active.is_empty() {
        out.push_str(&format!("\nFilter: {}\n", active));
    }
    out
}
