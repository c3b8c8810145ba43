//! Change detection between listener sets.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};

use crate::domain::{ListenerEntry, ListenerKey};

use super::{Event, EventKind, Snapshot, SnapshotEntry};

/// Events turning `previous` into `current`.
///
/// Keys present only in `current` open, keys present only in `previous`
/// close. A PID change under the same key produces nothing. An absent
/// previous snapshot means nothing existed before. Sorted by port, opens
/// before closes.
pub fn diff(
    previous: Option<&Snapshot>,
    current: &[ListenerEntry],
    timestamp: DateTime<Utc>,
) -> Vec<Event> {
    let previous_map: BTreeMap<ListenerKey, &SnapshotEntry> = previous
        .map(|s| s.entries.iter().map(|e| (e.key(), e)).collect())
        .unwrap_or_default();

    let current_map: BTreeMap<ListenerKey, SnapshotEntry> = current
        .iter()
        .map(|e| (e.key(), SnapshotEntry::from(e)))
        .collect();

    let mut events: Vec<Event> = current_map
        .iter()
        .filter(|(key, _)| !previous_map.contains_key(key))
        .map(|(_, entry)| Event::new(EventKind::Open, entry, timestamp))
        .chain(
            previous_map
                .iter()
                .filter(|(key, _)| !current_map.contains_key(key))
                .map(|(_, entry)| Event::new(EventKind::Close, entry, timestamp)),
        )
        .collect();

    events.sort_by_key(|e| (e.port, e.kind, e.protocol));
    events
}

/// Snapshot of `entries` taken at `timestamp`.
pub fn snapshot_from_entries(entries: &[ListenerEntry], timestamp: DateTime<Utc>) -> Snapshot {
    Snapshot {
        timestamp,
        entries: entries.iter().map(SnapshotEntry::from).collect(),
    }
}

/// Entries of `current` whose key is missing from `baseline`.
pub fn new_listeners(baseline: &HashSet<ListenerKey>, current: &[ListenerEntry]) -> Vec<ListenerEntry> {
    current
        .iter()
        .filter(|e| !baseline.contains(&e.key()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Protocol, STATE_LISTEN};

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn entry(port: u16, protocol: Protocol, pid: u32, process: &str) -> ListenerEntry {
        ListenerEntry::new(port, protocol, pid, process, "dev", STATE_LISTEN, "3u")
    }

    fn keys(events: &[Event], kind: EventKind) -> Vec<ListenerKey> {
        events.iter().filter(|e| e.kind == kind).map(Event::key).collect()
    }

    #[test]
    fn test_absent_previous_opens_every_key() {
        let current = vec![
            entry(8080, Protocol::Tcp, 3, "java"),
            entry(53, Protocol::Udp, 2, "dnsmasq"),
            entry(53, Protocol::Tcp, 2, "dnsmasq"),
            entry(8080, Protocol::Tcp, 4, "java"),
        ];

        let events = diff(None, &current, ts(0));

        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.kind == EventKind::Open));
        let ports: Vec<u16> = events.iter().map(|e| e.port).collect();
        assert_eq!(ports, vec![53, 53, 8080]);
    }

    #[test]
    fn test_same_keys_yield_no_events() {
        let entries = vec![entry(80, Protocol::Tcp, 1, "nginx"), entry(53, Protocol::Udp, 2, "dns")];
        let snapshot = snapshot_from_entries(&entries, ts(0));
        assert!(diff(Some(&snapshot), &entries, ts(1)).is_empty());
    }

    #[test]
    fn test_pid_change_under_same_key_is_silent() {
        let before = vec![entry(5432, Protocol::Tcp, 100, "postgres")];
        let after = vec![entry(5432, Protocol::Tcp, 200, "postgres")];
        let snapshot = snapshot_from_entries(&before, ts(0));
        assert!(diff(Some(&snapshot), &after, ts(1)).is_empty());
    }

    #[test]
    fn test_open_and_close_example() {
        let previous = snapshot_from_entries(
            &[entry(80, Protocol::Tcp, 1, "nginx"), entry(5432, Protocol::Tcp, 2, "postgres")],
            ts(0),
        );
        let current = vec![entry(80, Protocol::Tcp, 1, "nginx"), entry(3000, Protocol::Tcp, 3, "node")];

        let events = diff(Some(&previous), &current, ts(5));

        assert_eq!(events.len(), 2);
        assert_eq!((events[0].kind, events[0].port), (EventKind::Open, 3000));
        assert_eq!(events[0].process, "node");
        assert_eq!((events[1].kind, events[1].port), (EventKind::Close, 5432));
        assert_eq!(events[1].process, "postgres");
        assert!(events.iter().all(|e| e.timestamp == ts(5)));
    }

    #[test]
    fn test_set_complement_law() {
        let previous = snapshot_from_entries(
            &[
                entry(22, Protocol::Tcp, 1, "sshd"),
                entry(53, Protocol::Udp, 2, "dns"),
                entry(631, Protocol::Tcp, 3, "cupsd"),
            ],
            ts(0),
        );
        let current = vec![
            entry(22, Protocol::Tcp, 1, "sshd"),
            entry(53, Protocol::Tcp, 2, "dns"),
            entry(8000, Protocol::Tcp, 4, "python"),
        ];

        let events = diff(Some(&previous), &current, ts(1));

        let prev_keys: HashSet<ListenerKey> = previous.entries.iter().map(|e| e.key()).collect();
        let cur_keys: HashSet<ListenerKey> = current.iter().map(|e| e.key()).collect();

        let opens: HashSet<_> = keys(&events, EventKind::Open).into_iter().collect();
        let closes: HashSet<_> = keys(&events, EventKind::Close).into_iter().collect();
        assert_eq!(opens, &cur_keys - &prev_keys);
        assert_eq!(closes, &prev_keys - &cur_keys);
        assert_eq!(events.len(), cur_keys.symmetric_difference(&prev_keys).count());
    }

    #[test]
    fn test_same_port_orders_open_before_close() {
        let previous = snapshot_from_entries(&[entry(53, Protocol::Udp, 1, "dns")], ts(0));
        let current = vec![entry(53, Protocol::Tcp, 1, "dns")];

        let events = diff(Some(&previous), &current, ts(1));
        assert_eq!(events[0].kind, EventKind::Open);
        assert_eq!(events[0].protocol, Protocol::Tcp);
        assert_eq!(events[1].kind, EventKind::Close);
        assert_eq!(events[1].protocol, Protocol::Udp);
    }

    #[test]
    fn test_new_listeners() {
        let baseline: HashSet<ListenerKey> = [ListenerKey::new(80, Protocol::Tcp)].into_iter().collect();
        let current = vec![entry(80, Protocol::Tcp, 1, "nginx"), entry(80, Protocol::Udp, 9, "quic")];

        let fresh = new_listeners(&baseline, &current);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].key(), ListenerKey::new(80, Protocol::Udp));
    }
}
