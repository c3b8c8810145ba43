//! Interactive dashboard.

mod input;
mod theme;
mod ui;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};
use whport_core::dashboard::{Dashboard, Executor, Message};
use whport_core::process::current_username;

use crate::services::Services;
use theme::Theme;
use ui::RenderContext;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

pub async fn run(services: Services) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, services).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

async fn event_loop(terminal: &mut Term, services: Services) -> Result<()> {
    let config = services.config().clone();
    let ctx = RenderContext {
        theme: Theme::new(config.color_enabled),
        current_user: current_username(),
    };
    let every = config.refresh_every();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let Services { scans, kills, info } = services;
    let executor = Executor::new(Arc::new(scans), Arc::new(kills), Arc::new(info), tx);

    let mut dashboard = Dashboard::new(config.default_view);
    dashboard.update(Message::Resize {
        height: terminal.size()?.height,
    });
    for effect in dashboard.start() {
        executor.execute(effect);
    }
    info!(scope = ?config.default_view, "Dashboard started");

    let mut events = EventStream::new();
    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while dashboard.is_running() {
        terminal.draw(|f| ui::draw(f, &dashboard, &ctx))?;

        let message = tokio::select! {
            _ = ticker.tick() => Message::Tick,
            Some(message) = rx.recv() => message,
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) => match input::action_for(dashboard.screen(), key) {
                    Some(action) => Message::Action(action),
                    None => continue,
                },
                Some(Ok(Event::Resize(_, height))) => Message::Resize { height },
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        };

        for effect in dashboard.update(message) {
            if !executor.execute(effect) {
                debug!("Leaving dashboard");
            }
        }
    }

    Ok(())
}
