use std::{fs::OpenOptions, io, sync::Arc, sync::Mutex};

use clap::Parser;
use crossterm::{
    cursor::Show,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use taskboard::{
    app::{App, Intent},
    config::{Cli, Command, Config},
    gateway::LocalBackend,
    kanban_board::KanbanBoard,
    local_store::LocalTaskStore,
    storage::FileStorage,
    ui,
};

fn init_logging(config: &Config) -> taskboard::Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;
    let filter = EnvFilter::try_new(&config.log_filter)
        .map_err(|err| taskboard::Error::Config(format!("invalid log filter: {err}")))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(log_file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}

/// Raw mode and the alternate screen, undone on drop whichever way `main`
/// leaves.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(err) = disable_raw_mode() {
            warn!(error = %err, "could not leave raw mode");
        }
        if let Err(err) = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture, Show) {
            warn!(error = %err, "could not restore the screen");
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_cli(&cli)?;
    init_logging(&config)?;
    info!(data_dir = %config.data_dir.display(), "starting taskboard");

    let storage = Arc::new(FileStorage::open(&config.storage_file));
    info!(storage = %storage.path().display(), "local storage ready");

    let guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let result = match cli.command {
        Some(Command::Board { column }) => KanbanBoard::new(LocalTaskStore::new(storage))
            .and_then(|mut board| {
                if let Some(status) = column {
                    board.focus_column(status);
                }
                ui::run_board(&mut terminal, &mut board)
            }),
        None => LocalBackend::open(&config.backend_file).and_then(|backend| {
            let backend = Arc::new(backend);
            let mut app = App::new(backend.clone(), backend, storage);
            app.dispatch(Intent::Navigate(config.start_path.clone()))?;
            ui::run_app(&mut terminal, &mut app)
        }),
    };
    drop(guard);

    if let Err(err) = &result {
        tracing::error!(error = %err, "taskboard stopped");
    }
    info!("taskboard closed");
    Ok(result?)
}
