mod action;
mod api;
mod app;
mod catalog;
mod config;
mod error;
mod event;
mod export;
mod state;
mod tui;
mod types;
mod ui;

use std::panic;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::api::SimpsonsApi;
use crate::app::App;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::event::Event;
use crate::tui::EventHandler;
use crate::types::ResourceKind;

/// Browse Simpsons characters, episodes, and locations from the terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Override the API base URL
    #[arg(long)]
    api_base: Option<String>,

    /// Override the CDN base URL
    #[arg(long)]
    cdn_base: Option<String>,

    /// Directory image archives are written to
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Tab to open at startup
    #[arg(long, value_enum, default_value = "characters")]
    tab: ResourceKind,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = Config::load();
    if let Some(api_base) = args.api_base {
        config.api_base = api_base;
    }
    if let Some(cdn_base) = args.cdn_base {
        config.cdn_base = cdn_base;
    }
    if let Some(export_dir) = args.export_dir {
        config.export_dir = Some(export_dir);
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let api = SimpsonsApi::new(&config.api_base, &config.cdn_base)?;

    // Run the application
    let result = run(Arc::new(api), config.export_dir(), args.tab).await;

    // Restore terminal
    tui::restore()?;

    result
}

async fn run(
    catalog: Arc<dyn Catalog>,
    export_dir: PathBuf,
    start_tab: ResourceKind,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize terminal
    let mut terminal = tui::init()?;

    // Create action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    // Create app state
    let mut app = App::new(catalog, export_dir, start_tab, action_tx.clone());

    // Create event handler
    let tick_rate = Duration::from_millis(250);
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(tick_rate, render_rate);

    // Main loop
    loop {
        tokio::select! {
            Some(event) = events.next() => {
                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
