//! Example: scan listening ports and diff them against the last recorded
//! snapshot without saving anything.

use std::sync::Arc;

use chrono::Utc;
use whport_core::adapters::SystemRunner;
use whport_core::history::diff;
use whport_core::{Config, HistoryStore, LsofScanner, ScanScope, ScanService};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("Scanning ports...\n");

    let scanner = LsofScanner::new(Arc::new(SystemRunner::new()));
    let service = ScanService::new(scanner, Config::default());

    let entries = match service.scan(ScanScope::Listen).await {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error scanning ports: {}", e);
            return;
        }
    };

    if entries.is_empty() {
        println!("No listening ports found.");
        return;
    }

    println!(
        "{:<6} {:<6} {:<8} {:<20} {:<12} {}",
        "PORT", "PROTO", "PID", "PROCESS", "USER", "COMMAND"
    );
    println!("{}", "-".repeat(90));
    for e in &entries {
        println!(
            "{:<6} {:<6} {:<8} {:<20} {:<12} {}",
            e.port, e.protocol.as_str(), e.pid, e.process, e.user, e.command
        );
    }

    let previous = match HistoryStore::new() {
        Ok(store) => store.load().await.ok().and_then(|data| data.last_snapshot),
        Err(_) => None,
    };
    let events = diff(previous.as_ref(), &entries, Utc::now());
    println!("\n{} change(s) since the last recorded snapshot", events.len());
    for event in events {
        println!("  {:<5} {}", event.kind.to_string(), event.key());
    }
}
