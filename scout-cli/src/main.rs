//! OSINT Scout command-line shell.
//!
//! Thin wrapper over the `scout-*` crates: loads configuration, wires the
//! fetcher, cache and scanner together and writes the report.

mod commands;

use anyhow::Context;
use commands::{CacheAction, CommandLine, Commands, ScanArgs};
use scout_cache::Cache;
use scout_core::{AppConfig, SettingsStore};
use scout_modules::ModuleRegistry;
use scout_net::Fetcher;
use scout_scanner::{export, ExportOptions, Report, ScanState, Scanner};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Initialize tracing subscriber for logging
///
/// Logs go to stderr so a report written to stdout stays clean.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,scout=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::load().context("loading config")?,
    };
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

/// The on-disk cache, or an in-memory one when caching is off or the file
/// cannot be opened.
async fn open_cache(config: &AppConfig) -> anyhow::Result<Cache> {
    if config.cache.enabled {
        match config.cache_db_path() {
            Ok(path) => match Cache::open(&path).await {
                Ok(cache) => return Ok(cache),
                Err(e) => warn!(path = %path.display(), "Falling back to in-memory cache: {e}"),
            },
            Err(e) => warn!("No cache location, falling back to in-memory cache: {e}"),
        }
    }
    Cache::in_memory().await.context("opening in-memory cache")
}

async fn scan(args: ScanArgs, mut config: AppConfig) -> anyhow::Result<()> {
    if args.allow_paid {
        config.sources.free_sources_only = false;
    }
    if args.no_cache {
        config.cache.enabled = false;
    }

    let cache = open_cache(&config).await?;
    let settings = SettingsStore::new(config);
    let fetcher = Fetcher::new(settings.clone()).context("building HTTP client")?;
    let scanner = Arc::new(Scanner::new(
        Arc::new(ModuleRegistry::with_defaults()),
        Arc::new(fetcher),
        Arc::new(cache),
        settings,
    ));

    let interrupt = tokio::spawn({
        let scanner = Arc::clone(&scanner);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling scan");
                scanner.cancel();
            }
        }
    });
    let progress = tokio::spawn({
        let mut states = scanner.subscribe();
        async move {
            while states.changed().await.is_ok() {
                if let ScanState::Running { progress } = *states.borrow_and_update() {
                    info!("Progress: {:.0}%", progress * 100.0);
                }
            }
        }
    });

    let outcome = scanner.scan_input(&args.target, args.kind).await;
    interrupt.abort();
    progress.abort();
    let outcome = outcome.context("scan failed")?;

    let mut report = Report::new(outcome.entity.value());
    report.ingest(outcome.entity.value(), &outcome.results);

    let options = ExportOptions {
        include_sensitive: args.include_sensitive,
    };
    match args.output {
        Some(path) => export::write_to(&report, args.format, options, &path)
            .with_context(|| format!("writing report to {}", path.display()))?,
        None => println!("{}", export::render(&report, args.format, options)?),
    }
    Ok(())
}

fn list_modules() {
    let registry = ModuleRegistry::with_defaults();
    for module in registry.all() {
        println!(
            "{:<22} {:<14} {:<20} {}{}",
            module.id(),
            module.category().display_name(),
            module.name(),
            module.description(),
            if module.is_free_tier() { "" } else { " (paid)" }
        );
    }
}

async fn clear_cache(config: &AppConfig) -> anyhow::Result<()> {
    let path = config.cache_db_path().context("resolving cache location")?;
    if !path.exists() {
        println!("Cache is empty");
        return Ok(());
    }
    let cache = Cache::open(&path)
        .await
        .with_context(|| format!("opening cache at {}", path.display()))?;
    let removed = cache.clear().await.context("clearing cache")?;
    println!("Removed {removed} cached responses");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLine::parse_args();
    init_tracing();

    info!("Starting OSINT Scout v{}", env!("CARGO_PKG_VERSION"));
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan(args) => scan(args, config).await,
        Commands::Modules => {
            list_modules();
            Ok(())
        }
        Commands::Cache {
            action: CacheAction::Clear,
        } => clear_cache(&config).await,
    }
}
