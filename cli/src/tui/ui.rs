//! Dashboard rendering.

use chrono::Local;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
};
use whport_core::dashboard::{Dashboard, InfoState, KillState, Screen};
use whport_core::{KillMode, ListenerEntry, ProcessProfile};

use super::theme::Theme;
use crate::format::{format_bytes, format_duration, truncate};

/// Session values resolved once when the dashboard starts.
pub struct RenderContext {
    pub theme: Theme,
    /// Login of the operator, for the ownership warning on KillConfirm.
    pub current_user: String,
}

pub fn draw(f: &mut Frame, dashboard: &Dashboard, ctx: &RenderContext) {
    let theme = &ctx.theme;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Min(0),    // Table
            Constraint::Length(2), // Status
            Constraint::Length(1), // Help
        ])
        .split(f.area());

    draw_header(f, dashboard, theme, chunks[0]);
    draw_table(f, dashboard, theme, chunks[1]);
    draw_status(f, dashboard, theme, chunks[2]);
    draw_help(f, dashboard, theme, chunks[3]);

    match dashboard.screen() {
        Screen::Info => draw_info(f, dashboard, theme),
        Screen::KillConfirm => draw_confirm(f, dashboard, theme, &ctx.current_user),
        Screen::KillResult => draw_result(f, dashboard, theme),
        Screen::Table | Screen::Filter => {}
    }
}

fn draw_header(f: &mut Frame, dashboard: &Dashboard, theme: &Theme, area: Rect) {
    let mut title = vec![
        Span::styled("whport", theme.title()),
        Span::raw(format!(
            " | Listening: {}  Total: {}",
            dashboard.listening_count(),
            dashboard.entries().len()
        )),
    ];
    if dashboard.is_paused() {
        title.push(Span::styled(" [PAUSED]", theme.warning()));
    }
    if dashboard.is_scanning() {
        title.push(Span::styled(" scanning...", theme.muted()));
    }

    let updated = match dashboard.last_scan() {
        Some(at) => format!("Updated {}", at.format("%H:%M:%S")),
        None => "Waiting for first scan".to_string(),
    };

    let header = Paragraph::new(vec![Line::from(title), Line::styled(updated, theme.muted())]);
    f.render_widget(header, area);
}

fn draw_table(f: &mut Frame, dashboard: &Dashboard, theme: &Theme, area: Rect) {
    let sort = dashboard.sort_key().label();
    let header_cells = ["PORT", "PROTO", "PID", "PROCESS", "USER", "STATE", "COMMAND"]
        .iter()
        .map(|h| {
            let marked = h.eq_ignore_ascii_case(sort);
            let text = if marked {
                format!("{} ^", h)
            } else {
                h.to_string()
            };
            Cell::from(text).style(theme.heading())
        });
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let cursor = dashboard.cursor();
    let command_width = usize::from(area.width).saturating_sub(62).max(10);
    let rows = dashboard.visible_rows().map(|(i, entry)| {
        let cells = vec![
            Cell::from(entry.port.to_string()),
            Cell::from(entry.protocol.as_str()),
            Cell::from(entry.pid.to_string()),
            Cell::from(truncate(&entry.process, 16)),
            Cell::from(truncate(&entry.user, 12)).style(theme.user(&entry.user)),
            Cell::from(entry.state.clone()),
            Cell::from(truncate(&entry.command, command_width)),
        ];

        let style = if i == cursor {
            Style::default().bg(Color::DarkGray).fg(Color::White).bold()
        } else {
            Style::default()
        };

        Row::new(cells).style(style)
    });

    let widths = [
        Constraint::Length(7),
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Length(16),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Min(10),
    ];

    let table = Table::new(rows, widths).header(header);
    f.render_widget(table, area);
}

fn draw_status(f: &mut Frame, dashboard: &Dashboard, theme: &Theme, area: Rect) {
    let total = dashboard.filtered_len();
    let position = if total == 0 {
        "[0 of 0]".to_string()
    } else {
        let first = dashboard.scroll() + 1;
        let last = (dashboard.scroll() + dashboard.viewport_rows()).min(total);
        format!("[{}-{} of {}]", first, last, total)
    };

    let filter_line = match dashboard.screen() {
        Screen::Filter => Line::from(vec![
            Span::styled("Search: ", theme.heading()),
            Span::raw(format!("{}_", dashboard.filter())),
        ]),
        _ if !dashboard.filter().is_empty() => {
            Line::styled(format!("Filter: {}", dashboard.filter()), theme.warning())
        }
        _ => Line::raw(""),
    };

    let mut first = vec![Span::raw(format!(
        "{}  sort: {}",
        position,
        dashboard.sort_key().label()
    ))];
    if let Some(error) = dashboard.scan_error() {
        first.push(Span::styled(format!("  scan failed: {}", error), theme.error()));
    }

    let status = Paragraph::new(vec![Line::from(first), filter_line]);
    f.render_widget(status, area);
}

fn draw_help(f: &mut Frame, dashboard: &Dashboard, theme: &Theme, area: Rect) {
    let help = match dashboard.screen() {
        Screen::Table => {
            "j/k: move | i: inspect | K: kill | r: refresh | s: sort | p: pause | /: search | q: quit"
        }
        Screen::Filter => "Type to search | Enter: apply | Esc: cancel",
        Screen::Info => "K: kill | Enter/Esc: back | q: quit",
        Screen::KillConfirm => "y: terminate | f: force kill | n/Esc: cancel",
        Screen::KillResult => "Enter/Esc: back",
    };

    f.render_widget(Paragraph::new(help).style(theme.muted()), area);
}

/// Centered rectangle of the given size, clipped to `area`.
fn popup(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_popup(f: &mut Frame, title: &str, lines: Vec<Line>, theme: &Theme) {
    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(2);
    let area = popup(f.area(), 72, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.muted())
        .title(format!(" {} ", title));

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<12}", label), Style::default().bold()),
        Span::raw(value),
    ])
}

fn profile_lines(profile: &ProcessProfile) -> Vec<Line<'static>> {
    let started = match profile.started_at {
        Some(started) => format!(
            "{} ago ({})",
            format_duration(Local::now() - started),
            started.format("%Y-%m-%d %H:%M:%S")
        ),
        None => "unknown".to_string(),
    };
    let children = if profile.children.is_empty() {
        "none".to_string()
    } else {
        profile
            .children
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };

    vec![
        field("Command", profile.command.clone()),
        field("User", profile.user.clone()),
        field("Started", started),
        field("CPU", format!("{:.1}%", profile.cpu_percent)),
        field("Memory", format!("{} (RSS)", format_bytes(profile.rss_bytes))),
        field("Parent PID", profile.ppid.to_string()),
        field("Children", children),
    ]
}

fn target_lines(entry: &ListenerEntry) -> Vec<Line<'static>> {
    vec![
        field("Process", format!("{} (PID {})", entry.process, entry.pid)),
        field("Port", format!("{}/{}", entry.port, entry.protocol)),
        field("State", entry.state.clone()),
    ]
}

fn draw_info(f: &mut Frame, dashboard: &Dashboard, theme: &Theme) {
    let Some(entry) = dashboard.target() else {
        return;
    };

    let mut lines = target_lines(entry);
    match dashboard.info() {
        Some(InfoState::Loaded(profile)) => lines.extend(profile_lines(profile)),
        Some(InfoState::Failed(reason)) => lines.push(Line::styled(
            format!("Details unavailable: {}", reason),
            theme.error(),
        )),
        Some(InfoState::Loading) | None => {
            lines.push(Line::styled("Loading process details...", theme.muted()))
        }
    }

    draw_popup(f, "Process Info", lines, theme);
}

fn draw_confirm(f: &mut Frame, dashboard: &Dashboard, theme: &Theme, current_user: &str) {
    let Some(entry) = dashboard.target() else {
        return;
    };

    let mut lines = target_lines(entry);
    lines.push(field("User", entry.user.clone()));
    lines.push(field("Command", entry.command.clone()));
    lines.push(Line::raw(""));

    if entry.user == "root" {
        lines.push(Line::styled(
            "Warning: this process is owned by root.",
            theme.warning(),
        ));
    } else if entry.user != current_user {
        lines.push(Line::styled(
            format!("Warning: this process is owned by {}.", entry.user),
            theme.warning(),
        ));
    }

    lines.push(Line::from(vec![
        Span::raw("Send SIGTERM? "),
        Span::styled("[y]es  [f]orce  [n]o", theme.heading()),
    ]));

    draw_popup(f, "Kill Process", lines, theme);
}

fn draw_result(f: &mut Frame, dashboard: &Dashboard, theme: &Theme) {
    let line = match dashboard.kill_state() {
        Some(KillState::Pending(mode)) => {
            let what = match mode {
                KillMode::Graceful => "Waiting for the process to exit...".to_string(),
                KillMode::Force => "Sending SIGKILL...".to_string(),
                KillMode::Signal(signal) => format!("Sending {}...", signal),
            };
            Line::styled(what, theme.muted())
        }
        Some(KillState::Finished { success, message }) => {
            let style = if *success {
                theme.success()
            } else {
                theme.error()
            };
            Line::styled(message.clone(), style)
        }
        None => return,
    };

    draw_popup(f, "Kill Result", vec![line], theme);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use whport_core::dashboard::{Action, Message};
    use whport_core::domain::STATE_LISTEN;
    use whport_core::{Protocol, ScanScope};

    fn scanned(result: whport_core::Result<Vec<ListenerEntry>>) -> Message {
        Message::ScanCompleted {
            at: Local::now(),
            result,
        }
    }

    fn render_as(dashboard: &Dashboard, current_user: &str) -> String {
        let ctx = RenderContext {
            theme: Theme::new(false),
            current_user: current_user.to_string(),
        };
        let backend = TestBackend::new(100, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(f, dashboard, &ctx)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn render(dashboard: &Dashboard) -> String {
        render_as(dashboard, "dev")
    }

    fn loaded() -> Dashboard {
        let mut dashboard = Dashboard::new(ScanScope::Listen);
        dashboard.start();
        dashboard.update(Message::Resize { height: 20 });
        dashboard.update(scanned(Ok(vec![
            ListenerEntry::new(80, Protocol::Tcp, 1, "nginx", "root", STATE_LISTEN, "6u"),
            ListenerEntry::new(3000, Protocol::Tcp, 42, "node", "dev", STATE_LISTEN, "19u"),
        ])));
        dashboard
    }

    #[test]
    fn test_table_screen() {
        let mut dashboard = loaded();
        dashboard.update(Message::Action(Action::TogglePause));

        let out = render(&dashboard);
        assert!(out.contains("Listening: 2  Total: 2"));
        assert!(out.contains("[PAUSED]"));
        assert!(out.contains("PORT ^"));
        assert!(out.contains("[1-2 of 2]"));
        assert!(out.contains("nginx"));
    }

    #[test]
    fn test_confirm_warns_for_root() {
        let mut dashboard = loaded();
        dashboard.update(Message::Action(Action::Kill));
        assert_eq!(dashboard.screen(), Screen::KillConfirm);

        let out = render(&dashboard);
        assert!(out.contains("Kill Process"));
        assert!(out.contains("owned by root"));
    }

    #[test]
    fn test_filter_line() {
        let mut dashboard = loaded();
        dashboard.update(Message::Action(Action::Search));
        dashboard.update(Message::Action(Action::Type('n')));
        dashboard.update(Message::Action(Action::Type('o')));

        let out = render(&dashboard);
        assert!(out.contains("Search: no_"));
        assert!(out.contains("[1-1 of 1]"));
    }

    #[test]
    fn test_confirm_warns_for_other_owner_only() {
        let mut dashboard = loaded();
        dashboard.update(Message::Action(Action::MoveDown));
        dashboard.update(Message::Action(Action::Kill));
        assert_eq!(dashboard.target().unwrap().user, "dev");

        assert!(!render_as(&dashboard, "dev").contains("Warning"));
        assert!(render_as(&dashboard, "alice").contains("owned by dev"));
    }
}
