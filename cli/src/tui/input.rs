//! Key bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use whport_core::dashboard::{Action, Screen};

/// Resolve a key press on `screen` to a dashboard action.
pub fn action_for(screen: Screen, key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }

    match screen {
        Screen::Table => match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::MoveDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::MoveUp),
            KeyCode::Char('i') | KeyCode::Enter => Some(Action::Inspect),
            KeyCode::Char('K') => Some(Action::Kill),
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Char('s') => Some(Action::CycleSort),
            KeyCode::Char('p') => Some(Action::TogglePause),
            KeyCode::Char('/') => Some(Action::Search),
            KeyCode::Esc => Some(Action::ClearFilter),
            _ => None,
        },
        Screen::Info => match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('K') => Some(Action::Kill),
            KeyCode::Enter | KeyCode::Esc | KeyCode::Backspace => Some(Action::Back),
            _ => None,
        },
        Screen::KillConfirm => match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::ConfirmGraceful),
            KeyCode::Char('f') | KeyCode::Char('F') => Some(Action::ConfirmForce),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Action::Back),
            _ => None,
        },
        Screen::KillResult => match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Enter | KeyCode::Esc | KeyCode::Backspace => Some(Action::Back),
            _ => None,
        },
        Screen::Filter => match key.code {
            KeyCode::Enter => Some(Action::Apply),
            KeyCode::Esc => Some(Action::Back),
            KeyCode::Backspace => Some(Action::Erase),
            KeyCode::Char(c) => Some(Action::Type(c)),
            _ => None,
        },
    }
}
