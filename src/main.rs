mod app;
mod config;
mod controller;
mod inventory;
mod theme;
mod ui;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, TerminalSurface};
use config::AppConfig;
use controller::{ImageRef, InventoryController};
use inventory::sheets::SheetsClient;

#[derive(Parser, Debug)]
#[command(name = "sheetstock")]
#[command(version)]
#[command(about = "Browse and search an inventory kept in a Google Sheet")]
struct Args {
    /// Config file (defaults to ~/.config/sheetstock/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial search term (SKU or name)
    #[arg(short, long)]
    search: Option<String>,

    /// Print the inventory as a table and exit
    #[arg(short, long)]
    list: bool,

    /// Print the inventory as JSON and exit
    #[arg(short, long, conflicts_with = "list")]
    json: bool,

    /// Write a default config file and exit
    #[arg(long)]
    init_config: bool,

    /// Append logs to this file (the TUI otherwise discards them)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let tui = !(args.list || args.json || args.init_config);

    // Initialize logging
    match &args.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            init_logging(Mutex::new(file));
        }
        None if tui => init_logging(io::sink),
        None => init_logging(io::stderr),
    }

    if args.init_config {
        return init_config(args.config);
    }

    let config = AppConfig::load(args.config.as_deref())?;

    if args.list || args.json {
        return print_inventory(config, args.search.as_deref(), args.json).await;
    }

    run_tui(config, args.search).await
}

fn init_logging<W>(writer: W)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

fn init_config(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(p) => p,
        None => AppConfig::default_path()?,
    };

    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }

    AppConfig::default().save(&path)?;
    println!("Wrote {}", path.display());
    println!(
        "Set sheet.spreadsheet_id and export {} before running",
        config::API_KEY_ENV
    );
    Ok(())
}

async fn print_inventory(config: AppConfig, search: Option<&str>, as_json: bool) -> Result<()> {
    let client = SheetsClient::new(&config.sheet)?;
    let mut inventory = InventoryController::new(config, TerminalSurface::default());
    if let Some(term) = search {
        inventory.search(term);
    }
    if let Err(e) = inventory.load_catalog(&client).await {
        if e.is_fetch_error() {
            anyhow::bail!("{} (check the spreadsheet id, API key and sharing settings)", e);
        }
        return Err(e.into());
    }

    let surface = inventory.surface();

    if as_json {
        let output = serde_json::json!({
            "products": surface.cards,
            "stats": surface.stats,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if surface.cards.is_empty() {
        println!("No products found matching your search.");
    } else {
        println!(
            "{:<14} {:<32} {:>8} {:<7} {:>9} {:>7}  {}",
            "SKU", "NAME", "CURRENT", "LEVEL", "INCOMING", "TOTAL", "IMAGE"
        );
        for card in &surface.cards {
            let image = match &card.image {
                ImageRef::Url(url) => url.clone(),
                ImageRef::Placeholder(label) => format!("[{}]", label),
            };
            println!(
                "{:<14} {:<32} {:>8} {:<7} {:>9} {:>7}  {}",
                truncate(&card.sku, 14),
                truncate(&card.name, 32),
                card.current_stock,
                card.stock_level.as_str(),
                card.incoming_stock,
                card.total_available,
                image
            );
        }
    }

    println!();
    println!("Total Products: {}", surface.stats.total);
    println!("Low Stock Items: {}", surface.stats.low_stock);
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

async fn run_tui(config: AppConfig, search: Option<String>) -> Result<()> {
    ui::init_theme(&config.theme);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state and start the one fetch
    let mut app = App::new(config, search);
    app.start_load();

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.grid_columns = ui::grid_columns(terminal.size()?.width.saturating_sub(2));
        terminal.draw(|f| ui::draw(f, app))?;

        // Poll on a blocking thread so the fetch task keeps running on the runtime
        let input = tokio::task::spawn_blocking(|| -> io::Result<Option<Event>> {
            if event::poll(std::time::Duration::from_millis(100))? {
                event::read().map(Some)
            } else {
                Ok(None)
            }
        })
        .await??;

        if let Some(Event::Key(key)) = input {
            if key.kind == KeyEventKind::Press {
                // Handle key and catch any errors to prevent crashes
                if let Err(e) = app.handle_key(key) {
                    tracing::warn!("Key handling failed: {}", e);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }

        app.tick();
    }
}
