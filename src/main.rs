//! horse-id - terminal front ends for horse identification submissions
//!
//! `horse-id portal` runs the applicant portal, `horse-id admin` the
//! administrator console. Both talk to the same backend.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing_subscriber::EnvFilter;

use horse_id::application::{AdminApp, AdminMode, PortalApp, PortalMode};
use horse_id::infrastructure::{
    ApiError, ApplicationService, ClientConfig, HttpApplicationService, JsonFileSideStore, LoggingConfig,
    MemorySideStore, SideStore,
};
use horse_id::presentation::{render_admin, render_portal, InputHandler};

#[derive(Parser)]
#[command(name = "horse-id", version, about = "Horse identification submissions in the terminal")]
struct Cli {
    /// Configuration file layered over config/default and config/local
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Search, fill in and submit applications
    Portal,
    /// Review submitted files and complete applications
    Admin,
}

fn init_logging(logging: &LoggingConfig) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(&logging.file)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn open_side_store(config: &ClientConfig) -> Box<dyn SideStore> {
    match JsonFileSideStore::open(&config.storage.side_store_path) {
        Ok(store) => {
            tracing::debug!(path = %store.path().display(), "side store opened");
            Box::new(store)
        }
        Err(e) => {
            tracing::warn!(
                path = %config.storage.side_store_path.display(),
                error = %e,
                "side store unavailable, selections will not be remembered"
            );
            Box::new(MemorySideStore::default())
        }
    }
}

/// Entry point. Loads configuration, then runs the chosen front end until
/// the user presses 'q' in normal mode.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the admin console has no
/// token, or the terminal cannot be set up.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = ClientConfig::load(cli.config.as_deref())?;
    init_logging(&config.logging)?;
    tracing::info!(command = ?cli.command, base_url = %config.api.base_url, "starting");

    match cli.command {
        Command::Portal => {
            let service = HttpApplicationService::new(&config.api.base_url, None)?;
            let mut app = PortalApp::new(service, open_side_store(&config));
            if let Err(e) = app.search() {
                app.status_message = Some(e.to_string());
            }
            with_terminal(|terminal| run_portal(terminal, &mut app))?;
        }
        Command::Admin => {
            let token = config.api.admin_token.clone().ok_or(ApiError::MissingAdminToken)?;
            let service = HttpApplicationService::new(&config.api.base_url, Some(token))?;
            let mut app = AdminApp::new(service);
            if let Err(e) = app.load_list() {
                app.status_message = Some(e.to_string());
            }
            with_terminal(|terminal| run_admin(terminal, &mut app))?;
        }
    }

    tracing::info!("exiting");
    Ok(())
}

/// Sets the terminal up, runs `f`, and restores the terminal whatever `f` returned.
fn with_terminal<F>(f: F) -> io::Result<()>
where
    F: FnOnce(&mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()>,
{
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = f(&mut terminal);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!(error = %err, "terminal loop failed");
        println!("{err:?}");
    }
    Ok(())
}

fn run_portal<B: Backend, S: ApplicationService>(terminal: &mut Terminal<B>, app: &mut PortalApp<S>) -> io::Result<()> {
    loop {
        terminal.draw(|f| render_portal(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                match key.code {
                    KeyCode::Char('q') if app.mode == PortalMode::Normal => return Ok(()),
                    _ => InputHandler::handle_portal_key(app, key.code, key.modifiers),
                }
            }
        }
    }
}

fn run_admin<B: Backend, S: ApplicationService>(terminal: &mut Terminal<B>, app: &mut AdminApp<S>) -> io::Result<()> {
    loop {
        terminal.draw(|f| render_admin(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                match key.code {
                    KeyCode::Char('q') if app.mode == AdminMode::Normal => return Ok(()),
                    _ => InputHandler::handle_admin_key(app, key.code, key.modifiers),
                }
            }
        }
    }
}
