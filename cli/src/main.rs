//! whport - see which processes own which ports.
//!
//! Lists listening sockets, kills their owners, watches for new listeners
//! and keeps a history of listener changes. Without a subcommand on a
//! terminal it opens the interactive dashboard.

mod commands;
mod format;
mod logging;
mod services;
mod tui;

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use whport_core::KillSignal;

use commands::list::ListFilters;
use services::{load_config, Services};

#[derive(Parser)]
#[command(name = "whport")]
#[command(author, version, about = "See which processes own which ports")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Disable interactive TUI mode
    #[arg(long, global = true)]
    no_tui: bool,

    /// Use this config file instead of ~/.config/whport/config.json
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print a completion script for bash, zsh or fish and exit
    #[arg(long, hide = true, value_name = "SHELL", value_parser = parse_shell)]
    generate_completion: Option<Shell>,
}

#[derive(Subcommand)]
enum Commands {
    /// List listening ports
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        filters: ListFilters,
    },

    /// Kill the process listening on a port
    Kill {
        /// Port number to kill
        port: u16,

        /// Force kill (SIGKILL) without graceful shutdown
        #[arg(short, long)]
        force: bool,

        /// Signal to send instead of SIGTERM (e.g. HUP, INT, USR1)
        #[arg(short, long, value_parser = parse_signal)]
        signal: Option<KillSignal>,
    },

    /// Show details about the process on a port
    Info {
        /// Port number to inspect
        port: u16,
    },

    /// Redraw the port table periodically
    Watch {
        #[command(flatten)]
        filters: ListFilters,

        /// Refresh interval in seconds (defaults to the configured interval)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Exit with status 1 as soon as a new listener appears
        #[arg(long)]
        alert: bool,
    },

    /// Show or record listener history
    History {
        /// Show only the N most recent events
        #[arg(short = 'n', long = "last", value_name = "N")]
        last: Option<usize>,

        #[command(subcommand)]
        action: Option<HistoryAction>,
    },

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Scan now and record changes since the last snapshot
    Record,
    /// Delete all recorded history
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn parse_signal(value: &str) -> Result<KillSignal, String> {
    value.parse::<KillSignal>().map_err(|e| e.to_string())
}

fn parse_shell(value: &str) -> Result<Shell, String> {
    match value {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        other => Err(format!(
            "unsupported shell {:?} (expected bash, zsh or fish)",
            other
        )),
    }
}

fn write_completion(shell: Shell, out: &mut dyn Write) {
    clap_complete::generate(shell, &mut Cli::command(), "whport", out);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.generate_completion {
        write_completion(shell, &mut io::stdout());
        return Ok(());
    }

    let interactive = cli.command.is_none() && !cli.no_tui && atty::is(atty::Stream::Stdout);
    if interactive {
        logging::init_file();
    } else {
        logging::init_stderr();
    }

    match cli.command {
        Some(Commands::Config { action }) => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config::show(cli.config, cli.json).await?,
            ConfigAction::Init { force } => commands::config::init(cli.config, force).await?,
        },
        Some(Commands::History {
            action: Some(HistoryAction::Clear),
            ..
        }) => commands::history::clear().await?,
        Some(Commands::History { action: None, last }) => {
            commands::history::show(last, cli.json).await?
        }
        command => {
            let services = Services::new(load_config(cli.config).await?);
            match command {
                Some(Commands::List { filters }) => {
                    commands::list::run(&services, &filters, cli.json).await?;
                }
                Some(Commands::Kill {
                    port,
                    force,
                    signal,
                }) => {
                    commands::kill::run(&services, port, force, signal).await?;
                }
                Some(Commands::Info { port }) => {
                    commands::info::run(&services, port, cli.json).await?;
                }
                Some(Commands::Watch {
                    filters,
                    interval,
                    alert,
                }) => {
                    commands::watch::run(&services, &filters, interval, alert, cli.json).await?;
                }
                Some(Commands::History {
                    action: Some(HistoryAction::Record),
                    ..
                }) => {
                    commands::history::record(&services, cli.json).await?;
                }
                Some(Commands::History { .. }) | Some(Commands::Config { .. }) => {}
                None if interactive => tui::run(services).await?,
                None => {
                    commands::list::run(&services, &ListFilters::default(), cli.json).await?;
                }
            }
        }
    }

    Ok(())
}
