mod api;
mod config;
mod controller;
mod format;
mod models;
mod poll;
mod tui;
mod view;
mod widget;

use anyhow::{bail, Context, Result};
use chrono::Local;
use crossterm::{
    event::{Event, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use api::{BackendClient, Endpoint};
use config::Config;
use controller::ViewMode;
use tui::App;
use widget::Widget;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--init") {
        let path = Config::generate_default()?;
        println!("Generated config file at: {}", path.display());
        println!("Edit backendUrl to point at your assignments backend, then run uni-mirror.");
        return Ok(());
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("uni-mirror — assignment and module progress for your smart mirror");
        println!();
        println!("USAGE:");
        println!("  uni-mirror                    Start the dashboard");
        println!("  uni-mirror --html week        Print the week view as HTML");
        println!("  uni-mirror --html module [ID] Print the module grid as HTML");
        println!("  uni-mirror --init             Generate a default config file");
        println!();
        println!("CONFIG:");
        println!("  File: ~/.config/uni-mirror/config.toml");
        println!("  Env overrides: UNI_BACKEND_URL, UNI_UPDATE_INTERVAL, RUST_LOG");
        println!();
        println!("KEYBINDINGS:");
        println!("  w                 Show this week's assignments (UNI_SHOW_WEEK)");
        println!("  m                 Show module progress, cycling modules (UNI_SHOW_MODULE)");
        println!("  h / Esc           Hide (HIDE_ALL_MODULES)");
        println!("  r                 Refresh now");
        println!("  s                 Ask the backend to resync");
        println!("  p                 Suspend / resume polling");
        println!("  q / Ctrl+C        Quit");
        return Ok(());
    }

    let config = Config::load().with_context(|| {
        "Failed to load configuration.\n\
         Run `uni-mirror --init` to generate a config file."
    })?;

    let client = BackendClient::new(&config.backend_url)?;

    if let Some(pos) = args.iter().position(|a| a == "--html") {
        init_logging(true);
        return print_html(&config, &client, &args[pos + 1..]).await;
    }

    init_logging(false);

    let mut status = None;
    match client.health().await {
        Ok(health) => tracing::info!(
            status = %health.status,
            service = ?health.service,
            timestamp = ?health.timestamp,
            "backend reachable"
        ),
        Err(e) => {
            tracing::warn!(error = %e, backend = %client.base_url(), "backend health check failed");
            status = Some(format!("Backend unreachable: {e}"));
        }
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let widget = Widget::new(config, client.clone());
    let mut app = App::new(widget, client);
    if let Some(status) = status {
        app.status_message = status;
    }

    let result = run_app(&mut terminal, app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
) -> Result<()> {
    app.widget.start();

    loop {
        app.frame_count = app.frame_count.wrapping_add(1);
        app.tick();
        terminal.draw(|f| tui::ui::render(f, &mut app))?;

        if let Some(Event::Key(KeyEvent {
            code, modifiers, ..
        })) = tui::event::poll_event(Duration::from_millis(100))?
        {
            tui::event::handle_key(&mut app, code, modifiers);
        }

        if !app.running {
            break;
        }
    }

    app.widget.suspend();
    Ok(())
}

/// One-shot fetch and HTML dump, for embedding in a web-based mirror.
async fn print_html(config: &Config, client: &BackendClient, rest: &[String]) -> Result<()> {
    let (mode, endpoint) = match rest.first().map(String::as_str) {
        Some("week") | None => (ViewMode::Week, Endpoint::Week),
        Some("module") => (
            ViewMode::Module {
                selected: rest.get(1).cloned(),
            },
            Endpoint::All,
        ),
        Some(other) => bail!("Unknown view '{other}', expected 'week' or 'module'"),
    };

    let snapshot = client
        .fetch_assignments(endpoint)
        .await
        .with_context(|| format!("Fetching {} from {}", endpoint.path(), client.base_url()))?;

    let tree = view::render(&mode, &snapshot, config, Local::now());
    println!("{}", view::html::to_html(&tree));
    Ok(())
}

/// Log to stderr for one-shot commands; to a file while the dashboard owns
/// the terminal.
fn init_logging(to_stderr: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("uni_mirror=info"));

    if to_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
        return;
    }

    let file = dirs::cache_dir()
        .map(|d| d.join("uni-mirror"))
        .and_then(|dir| {
            std::fs::create_dir_all(&dir).ok()?;
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("uni-mirror.log"))
                .ok()
        });

    match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .init(),
    }
}
