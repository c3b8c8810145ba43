//! Dashboard state machine.
//!
//! [`Dashboard`] owns all interactive state. It is driven by [`Message`]s
//! (operator actions, timer ticks and completions of background work) and
//! answers each with the [`Effect`]s the caller should start. It never runs
//! anything itself.

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::application::{KillMode, KillStatus};
use crate::config::ScanScope;
use crate::domain::{ListenerEntry, ProcessProfile};
use crate::error::Error;

/// Lines the table view needs besides the rows: header, column titles,
/// separator, two status lines and help.
pub const RESERVED_ROWS: usize = 7;

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Table,
    Info,
    KillConfirm,
    KillResult,
    Filter,
}

/// Table ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Port,
    Pid,
    /// Case-insensitive process name.
    Process,
}

impl SortKey {
    pub fn next(self) -> Self {
        match self {
            SortKey::Port => SortKey::Pid,
            SortKey::Pid => SortKey::Process,
            SortKey::Process => SortKey::Port,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Port => "port",
            SortKey::Pid => "pid",
            SortKey::Process => "process",
        }
    }

    fn sort(self, entries: &mut [ListenerEntry]) {
        match self {
            SortKey::Port => entries.sort_by_key(|e| e.port),
            SortKey::Pid => entries.sort_by_key(|e| e.pid),
            SortKey::Process => entries.sort_by_cached_key(|e| e.process.to_lowercase()),
        }
    }
}

/// Operator intents, already resolved from raw keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveUp,
    MoveDown,
    Inspect,
    Kill,
    Refresh,
    CycleSort,
    TogglePause,
    Search,
    /// Drop an applied filter from the table.
    ClearFilter,
    ConfirmGraceful,
    ConfirmForce,
    /// Leave the current screen without acting.
    Back,
    /// Append a character to the filter being typed.
    Type(char),
    /// Remove the last filter character.
    Erase,
    /// Accept the typed filter.
    Apply,
    Quit,
}

/// Inputs to [`Dashboard::update`].
#[derive(Debug)]
pub enum Message {
    Action(Action),
    /// Periodic refresh timer fired.
    Tick,
    /// Terminal height changed.
    Resize { height: u16 },
    ScanCompleted {
        at: DateTime<Local>,
        result: Result<Vec<ListenerEntry>, Error>,
    },
    InfoCompleted {
        pid: u32,
        result: Result<ProcessProfile, Error>,
    },
    KillCompleted {
        entry: ListenerEntry,
        result: Result<KillStatus, Error>,
    },
}

/// Background work the dashboard asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Scan(ScanScope),
    FetchInfo(u32),
    Kill { entry: ListenerEntry, mode: KillMode },
    Quit,
}

/// Detail view contents.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoState {
    Loading,
    Loaded(ProcessProfile),
    Failed(String),
}

/// Kill result view contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillState {
    Pending(KillMode),
    Finished { success: bool, message: String },
}

/// Interactive dashboard state.
#[derive(Debug)]
pub struct Dashboard {
    screen: Screen,
    scope: ScanScope,
    entries: Vec<ListenerEntry>,
    /// Indices into `entries` that pass the filter, in display order.
    filtered: Vec<usize>,
    cursor: usize,
    scroll: usize,
    viewport_rows: usize,
    sort: SortKey,
    filter: String,
    paused: bool,
    scanning: bool,
    last_scan: Option<DateTime<Local>>,
    scan_error: Option<String>,
    /// Entry the Info, KillConfirm and KillResult screens act on.
    target: Option<ListenerEntry>,
    info: Option<InfoState>,
    kill: Option<KillState>,
    running: bool,
}

impl Dashboard {
    pub fn new(scope: ScanScope) -> Self {
        Self {
            screen: Screen::Table,
            scope,
            entries: Vec::new(),
            filtered: Vec::new(),
            cursor: 0,
            scroll: 0,
            viewport_rows: 1,
            sort: SortKey::default(),
            filter: String::new(),
            paused: false,
            scanning: false,
            last_scan: None,
            scan_error: None,
            target: None,
            info: None,
            kill: None,
            running: true,
        }
    }

    /// Effects to run at startup.
    pub fn start(&mut self) -> Vec<Effect> {
        vec![self.request_scan()]
    }

    /// Apply one message and return the work it triggers.
    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        if !self.running {
            return Vec::new();
        }

        match message {
            Message::Action(Action::Quit) => {
                self.running = false;
                vec![Effect::Quit]
            }
            Message::Action(action) => self.handle_action(action),
            Message::Tick => {
                if self.screen == Screen::Table && !self.paused {
                    vec![self.request_scan()]
                } else {
                    Vec::new()
                }
            }
            Message::Resize { height } => {
                self.viewport_rows = (height as usize).saturating_sub(RESERVED_ROWS).max(1);
                self.clamp();
                Vec::new()
            }
            Message::ScanCompleted { at, result } => {
                self.on_scan(at, result);
                Vec::new()
            }
            Message::InfoCompleted { pid, result } => {
                self.on_info(pid, result);
                Vec::new()
            }
            Message::KillCompleted { entry, result } => {
                self.on_kill(entry, result);
                Vec::new()
            }
        }
    }

    fn handle_action(&mut self, action: Action) -> Vec<Effect> {
        match self.screen {
            Screen::Table => self.table_action(action),
            Screen::Info => self.info_action(action),
            Screen::KillConfirm => self.confirm_action(action),
            Screen::KillResult => self.result_action(action),
            Screen::Filter => self.filter_action(action),
        }
    }

    fn table_action(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::MoveDown => {
                if self.cursor + 1 < self.filtered.len() {
                    self.cursor += 1;
                    self.ensure_cursor_visible();
                }
            }
            Action::MoveUp => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.ensure_cursor_visible();
                }
            }
            Action::Inspect => {
                if let Some(entry) = self.selected().cloned() {
                    let pid = entry.pid;
                    self.target = Some(entry);
                    self.info = Some(InfoState::Loading);
                    self.screen = Screen::Info;
                    return vec![Effect::FetchInfo(pid)];
                }
            }
            Action::Kill => {
                if let Some(entry) = self.selected().cloned() {
                    self.target = Some(entry);
                    self.screen = Screen::KillConfirm;
                }
            }
            Action::Refresh => return vec![self.request_scan()],
            Action::CycleSort => {
                self.sort = self.sort.next();
                self.sort.sort(&mut self.entries);
                self.rebuild_filtered();
            }
            Action::TogglePause => self.paused = !self.paused,
            Action::Search => {
                self.filter.clear();
                self.rebuild_filtered();
                self.screen = Screen::Filter;
            }
            Action::ClearFilter => {
                if !self.filter.is_empty() {
                    self.filter.clear();
                    self.rebuild_filtered();
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn info_action(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Kill if self.target.is_some() => self.screen = Screen::KillConfirm,
            Action::Back => self.return_to_table(),
            _ => {}
        }
        Vec::new()
    }

    fn confirm_action(&mut self, action: Action) -> Vec<Effect> {
        let mode = match action {
            Action::ConfirmGraceful => KillMode::Graceful,
            Action::ConfirmForce => KillMode::Force,
            Action::Back => {
                self.return_to_table();
                return Vec::new();
            }
            _ => return Vec::new(),
        };

        let Some(entry) = self.target.clone() else {
            self.return_to_table();
            return Vec::new();
        };

        self.kill = Some(KillState::Pending(mode));
        self.screen = Screen::KillResult;
        vec![Effect::Kill { entry, mode }]
    }

    fn result_action(&mut self, action: Action) -> Vec<Effect> {
        if action != Action::Back || matches!(self.kill, Some(KillState::Pending(_))) {
            return Vec::new();
        }
        self.return_to_table();
        vec![self.request_scan()]
    }

    fn filter_action(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Type(c) => {
                self.filter.push(c);
                self.rebuild_filtered();
            }
            Action::Erase => {
                if self.filter.pop().is_some() {
                    self.rebuild_filtered();
                }
            }
            Action::Apply => {
                self.screen = Screen::Table;
                self.rebuild_filtered();
            }
            Action::Back => {
                self.screen = Screen::Table;
                self.filter.clear();
                self.rebuild_filtered();
            }
            _ => {}
        }
        Vec::new()
    }

    fn return_to_table(&mut self) {
        self.screen = Screen::Table;
        self.target = None;
        self.info = None;
        self.kill = None;
    }

    fn request_scan(&mut self) -> Effect {
        self.scanning = true;
        Effect::Scan(self.scope)
    }

    fn on_scan(&mut self, at: DateTime<Local>, result: Result<Vec<ListenerEntry>, Error>) {
        self.scanning = false;
        match result {
            Ok(mut entries) => {
                debug!(count = entries.len(), "Scan completed");
                self.sort.sort(&mut entries);
                self.entries = entries;
                self.scan_error = None;
                self.last_scan = Some(at);
                self.rebuild_filtered();
            }
            Err(e) => {
                warn!(error = %e, "Scan failed");
                self.scan_error = Some(e.to_string());
            }
        }
    }

    fn on_info(&mut self, pid: u32, result: Result<ProcessProfile, Error>) {
        if self.target.as_ref().map(|t| t.pid) != Some(pid) {
            debug!(pid = pid, "Dropping info for a process no longer selected");
            return;
        }
        self.info = Some(match result {
            Ok(profile) => InfoState::Loaded(profile),
            Err(e) => InfoState::Failed(e.to_string()),
        });
    }

    fn on_kill(&mut self, entry: ListenerEntry, result: Result<KillStatus, Error>) {
        let state = match result {
            Ok(status) => KillState::Finished {
                success: status.is_success(),
                message: status.describe(&entry),
            },
            Err(e) => KillState::Finished {
                success: false,
                message: e.to_string(),
            },
        };

        if self.screen == Screen::KillResult {
            self.kill = Some(state);
        } else {
            debug!(pid = entry.pid, "Kill finished after its result screen was left");
        }
    }

    /// Recompute the filtered index list and clamp cursor and scroll.
    fn rebuild_filtered(&mut self) {
        self.filtered = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.matches_search(&self.filter))
            .map(|(i, _)| i)
            .collect();
        self.clamp();
    }

    fn clamp(&mut self) {
        if self.cursor >= self.filtered.len() {
            self.cursor = self.filtered.len().saturating_sub(1);
        }
        self.ensure_cursor_visible();
        let max_scroll = self.filtered.len().saturating_sub(self.viewport_rows);
        self.scroll = self.scroll.min(max_scroll);
    }

    fn ensure_cursor_visible(&mut self) {
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        }
        if self.cursor >= self.scroll + self.viewport_rows {
            self.scroll = self.cursor + 1 - self.viewport_rows;
        }
    }

    // ------------------------------------------------------------------
    // Read access for rendering
    // ------------------------------------------------------------------

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn scope(&self) -> ScanScope {
        self.scope
    }

    pub fn entries(&self) -> &[ListenerEntry] {
        &self.entries
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    /// Entries in the scroll window as (display index, entry).
    pub fn visible_rows(&self) -> impl Iterator<Item = (usize, &ListenerEntry)> {
        self.filtered
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(self.viewport_rows)
            .map(|(row, &i)| (row, &self.entries[i]))
    }

    /// Entry under the cursor.
    pub fn selected(&self) -> Option<&ListenerEntry> {
        self.filtered.get(self.cursor).map(|&i| &self.entries[i])
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn viewport_rows(&self) -> usize {
        self.viewport_rows
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn last_scan(&self) -> Option<DateTime<Local>> {
        self.last_scan
    }

    pub fn scan_error(&self) -> Option<&str> {
        self.scan_error.as_deref()
    }

    pub fn listening_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_listening()).count()
    }

    pub fn target(&self) -> Option<&ListenerEntry> {
        self.target.as_ref()
    }

    pub fn info(&self) -> Option<&InfoState> {
        self.info.as_ref()
    }

    pub fn kill_state(&self) -> Option<&KillState> {
        self.kill.as_ref()
    }
}
