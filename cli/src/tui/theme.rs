//! Row colours by process owner.

use ratatui::style::{Color, Style, Stylize};

/// Service accounts shown dimmed.
const SYSTEM_USERS: &[&str] = &[
    "_postgres",
    "_mysql",
    "_www",
    "daemon",
    "nobody",
    "_windowserver",
    "_spotlight",
    "_mdnsresponder",
    "_netbios",
    "_locationd",
];

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    enabled: bool,
}

impl Theme {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn fg(&self, color: Color) -> Style {
        if self.enabled {
            Style::default().fg(color)
        } else {
            Style::default()
        }
    }

    pub fn user(&self, user: &str) -> Style {
        if user == "root" {
            self.fg(Color::Red)
        } else if SYSTEM_USERS.contains(&user) {
            self.fg(Color::DarkGray)
        } else {
            self.fg(Color::Green)
        }
    }

    pub fn title(&self) -> Style {
        self.fg(Color::Cyan).bold()
    }

    pub fn heading(&self) -> Style {
        self.fg(Color::Yellow).bold()
    }

    pub fn muted(&self) -> Style {
        self.fg(Color::DarkGray)
    }

    pub fn warning(&self) -> Style {
        self.fg(Color::Yellow)
    }

    pub fn error(&self) -> Style {
        self.fg(Color::Red)
    }

    pub fn success(&self) -> Style {
        self.fg(Color::Green)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_colours() {
        let theme = Theme::new(true);
        assert_eq!(theme.user("root").fg, Some(Color::Red));
        assert_eq!(theme.user("_postgres").fg, Some(Color::DarkGray));
        assert_eq!(theme.user("nobody").fg, Some(Color::DarkGray));
        assert_eq!(theme.user("alice").fg, Some(Color::Green));
    }

    #[test]
    fn test_disabled() {
        let theme = Theme::new(false);
        assert_eq!(theme.user("root"), Style::default());
        assert_eq!(theme.error().fg, None);
    }
}
