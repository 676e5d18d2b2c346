//! stackx - search Stack Exchange sites from your terminal
//!
//! Prints the top question and its accepted answer, dumps all results as
//! JSON, or opens an interactive browser over them.

use std::error::Error;
use std::io;
use std::panic;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, info, warn};

use stackx::app::App;
use stackx::cache::{self, Cache};
use stackx::cli::{Action, Cli, SearchOptions};
use stackx::commands::{self, CommandError};
use stackx::config::{self, Config, LoggingConfig};
use stackx::logging;
use stackx::render;
use stackx::search::{CachedStackExchange, Searchable, StackExchange};
use stackx::ui;

type BoxError = Box<dyn Error>;

/// Sets up a panic hook that restores the terminal before printing the panic message.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

/// Opens the configured cache for a command that cannot work without one
async fn require_cache(config: &Config, command: &'static str) -> Result<Arc<dyn Cache>, BoxError> {
    match cache::open(&config.cache).await? {
        Some(cache) => Ok(cache),
        None => Err(CommandError::CacheDisabled(command).into()),
    }
}

/// Builds the search service, wrapped in the cache proxy when a cache is available
fn search_service(
    config: &Config,
    cache: Option<Arc<dyn Cache>>,
    overwrite_cache: bool,
) -> Box<dyn Searchable> {
    let service = StackExchange::new()
        .with_base_url(config.api.base_url())
        .with_api_key(config.api.key.clone());

    match cache {
        Some(cache) => {
            info!("Using cached stack exchange service");
            Box::new(CachedStackExchange::new(service, cache).with_overwrite(overwrite_cache))
        }
        None => Box::new(service),
    }
}

async fn search(config: &Config, options: SearchOptions) -> Result<(), BoxError> {
    let request = options.to_request(&config.api.default_site)?;

    let cache = match cache::open(&config.cache).await {
        Ok(cache) => cache,
        Err(e) => {
            warn!(error = %e, "cache unavailable; searching without it");
            None
        }
    };
    let service = search_service(config, cache.clone(), options.overwrite_cache);

    let results = service.search(&request).await?;
    debug!(count = results.len(), "search finished");

    if results.is_empty() {
        if options.json {
            println!("{}", render::format_json(&results)?);
        } else {
            println!("{}", render::NO_RESULTS_MESSAGE);
        }
        return Ok(());
    }

    if options.interactive {
        let app = App::new(options.query, results).with_alias_saving(cache.is_some());
        return run_interactive(app, cache).await;
    }

    if options.json {
        println!("{}", render::format_json(&results)?);
    } else {
        info!("Using fast-search...");
        print!("{}", render::format_result(&results[0], render::terminal_width()));
    }
    Ok(())
}

/// Runs the result browser until the user quits
async fn run_interactive(mut app: App, cache: Option<Arc<dyn Cache>>) -> Result<(), BoxError> {
    setup_panic_hook();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = event_loop(&mut terminal, &mut app, cache.as_deref()).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    outcome
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    cache: Option<&dyn Cache>,
) -> Result<(), BoxError> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if let Some(pending) = app.take_pending_alias() {
            let saved = match (cache, app.results.get(pending.index)) {
                (Some(cache), Some(result)) => {
                    commands::save_alias(cache, &pending.alias, result).await
                }
                _ => Err(CommandError::CacheDisabled("aliases")),
            };
            match saved {
                Ok(alias) => app.set_status(format!("Saved search result under alias: {}", alias)),
                Err(e) => app.set_status(e.to_string()),
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

async fn run(cli: Cli) -> Result<(), BoxError> {
    let action = Action::from_cli(&cli)?;

    // The config file may not exist yet; set-key creates it
    if let Action::SetKey(ref key) = action {
        logging::init(&LoggingConfig::default(), cli.verbose)?;
        let path = config::set_api_key(cli.config.as_deref(), key)?;
        println!("Saved API key to {}", path.display());
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    logging::init(&config.logging, cli.verbose)?;
    debug!(config = ?cli.config, "configuration loaded");

    if let Some(ref key) = cli.key {
        config.api.key = Some(key.clone());
    }

    match action {
        Action::FlushCache { confirmed } => {
            let cache = require_cache(&config, "--flush-cache").await?;
            let confirmed = confirmed || {
                let stdin = io::stdin();
                commands::confirm_flush(&mut stdin.lock(), &mut io::stdout())?
            };
            if confirmed {
                commands::flush_cache(cache.as_ref()).await?;
                println!("Cache has been flushed!");
            }
        }
        Action::ViewAlias(alias) => {
            let cache = require_cache(&config, "--alias").await?;
            let result = commands::view_alias(cache.as_ref(), &alias).await?;
            print!("{}", render::format_result(&result, render::terminal_width()));
        }
        // handled before the config is loaded
        Action::SetKey(_) => {}
        Action::Search(options) => search(&config, options).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Search Failed");
            eprintln!("Error Reason: {}", e);
            ExitCode::FAILURE
        }
    }
}
