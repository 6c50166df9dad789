//! Tracing setup: console layer plus optional rotating JSON-lines file.

use std::path::Path;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::FILE_GUARD;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber. `RUST_LOG` overrides `console_level`.
pub fn init(console_level: &str, json: bool, file: &jarline_config::Logging) -> eyre::Result<()> {
    let console_filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::new(v),
        _ => EnvFilter::try_new(console_level)
            .map_err(|e| eyre::eyre!("invalid --log-level '{console_level}': {e}"))?,
    };

    let console: BoxedLayer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    };

    let mut layers = vec![console];
    if let Some(path) = file.file.as_deref() {
        layers.push(file_layer(path, file)?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| eyre::eyre!("install tracing subscriber: {e}"))
}

fn file_layer(path: &str, cfg: &jarline_config::Logging) -> eyre::Result<BoxedLayer> {
    let path = Path::new(path);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| eyre::eyre!("logging.file has no file name: {}", path.display()))?;

    let appender = match cfg.rotation.as_deref().unwrap_or("never") {
        "never" => tracing_appender::rolling::never(dir, name),
        "daily" => tracing_appender::rolling::daily(dir, name),
        "hourly" => tracing_appender::rolling::hourly(dir, name),
        other => eyre::bail!("logging.rotation must be never|daily|hourly, got '{other}'"),
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);

    let level = match cfg.level.as_deref() {
        Some(l) => l
            .parse::<LevelFilter>()
            .map_err(|e| eyre::eyre!("logging.level '{l}': {e}"))?,
        None => LevelFilter::INFO,
    };
    Ok(tracing_subscriber::fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(level)
        .boxed())
}
