use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use aphator_chat::app::{App, Preferences};
use aphator_chat::tui::{self, EventHandler};
use aphator_chat::{handler, ui};
use aphator_chat::{
    Config, ExchangeController, FileStore, HttpChatClient, MemoryStore, ThemeToggle,
};

#[derive(Parser, Debug)]
#[command(name = "aphator")]
#[command(about = "Chat with the Aphator Tech support assistant")]
struct Args {
    /// Chat endpoint URL (overrides config and APHATOR_ENDPOINT)
    #[arg(long)]
    endpoint: Option<String>,
    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Where to write diagnostics (the terminal belongs to the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_path = match args.log_file {
        Some(path) => path,
        None => Config::config_dir()?.join("aphator.log"),
    };
    init_logging(&log_path)?;

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?.with_env_overrides(),
        None => Config::load()?,
    };
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    info!(endpoint = %config.endpoint, "starting chat client");

    let backend = HttpChatClient::new(&config.endpoint, config.request_timeout())?;
    let (view_tx, view_rx) = mpsc::unbounded_channel();
    let controller = ExchangeController::new(backend, view_tx)
        .with_reply_delay(config.reply_delay())
        .with_request_timeout(config.request_timeout());

    let store: Preferences = match FileStore::open_default() {
        Ok(store) => Box::new(store),
        Err(err) => {
            warn!(error = %err, "theme preference will not persist this session");
            Box::new(MemoryStore::default())
        }
    };
    let theme = ThemeToggle::load_on_startup(store, config.default_theme);

    let mut app = App::new(controller, theme, config.endpoint.clone());
    if let Some(greeting) = config.greeting.clone() {
        app.greet_after(greeting, config.reply_delay());
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(view_rx);

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}

fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("could not open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
