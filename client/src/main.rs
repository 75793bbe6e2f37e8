mod config;
mod terminal;

use clap::{Parser, Subcommand};
use config::{Config, Overrides, Settings};
use noughts::{AdminChannel, ClientSession, NoMoves, SessionEnd};
use std::io;
use terminal::{ConsoleMoves, ConsolePresenter};

/// Networked noughts and crosses client
#[derive(Parser, Debug)]
#[command(name = "noughts-client")]
struct Args {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join the lobby and play one game
    Play {
        /// Only watch: leave as soon as a move is required
        #[arg(long)]
        watch: bool,
    },
    /// Send a command to the server
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum AdminAction {
    /// Open matchmaking on a server started with --await-start
    Start,
    /// Stop accepting connections
    Shutdown,
}

/// The terminal belongs to the game, so logs go to the cache directory.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    const LOG_ENV: &str = "RUST_LOG";
    use std::str::FromStr;
    use tracing::Level;

    let level = match std::env::var(LOG_ENV) {
        Ok(env) => Level::from_str(env.to_uppercase().as_str())
            .map_err(|err| format!("invalid `{}` environment variable {}", LOG_ENV, err))?,
        Err(_) => Level::INFO,
    };

    let log_file_path =
        xdg::BaseDirectories::with_prefix(config::PREFIX)?.place_cache_file("client.log")?;
    tracing_subscriber::fmt()
        .with_writer(move || -> Box<dyn io::Write> {
            let file = std::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(&log_file_path);
            match file {
                Ok(file) => Box::new(file),
                Err(_) => Box::new(io::sink()),
            }
        })
        .with_ansi(false)
        .with_max_level(level)
        .init();
    Ok(())
}

fn play(config: &Config, watch: bool) -> Result<(), Box<dyn std::error::Error>> {
    let term = console::Term::stdout();
    let mut session = ClientSession::connect(config.address(), &config.username)?;
    term.write_line(&format!(
        "Connected to {}:{} as {}, waiting for an opponent",
        config.host, config.port, config.username
    ))?;

    let mut presenter = ConsolePresenter::new(term.clone());
    let end = if watch {
        session.run(&mut NoMoves, &mut presenter)?
    } else {
        session.run(&mut ConsoleMoves::new(term.clone()), &mut presenter)?
    };
    tracing::info!(?end, "Session ended");

    match end {
        SessionEnd::Finished(_) => {}
        SessionEnd::Closed => term.write_line("Server closed the connection.")?,
        SessionEnd::OutOfMoves => term.write_line("Left the game.")?,
    }
    Ok(())
}

fn admin(config: &Config, action: AdminAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut channel = AdminChannel::connect(config.address())?;
    match action {
        AdminAction::Start => channel.request_start()?,
        AdminAction::Shutdown => channel.request_shutdown()?,
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging()?;

    let settings = Settings::load()?;
    let config = Config::resolve(settings, args.overrides, std::env::var("USER").ok())?;
    tracing::debug!(?config, "Resolved configuration");

    match args.command {
        Command::Play { watch } => play(&config, watch),
        Command::Admin { action } => admin(&config, action),
    }
}
