//! Logger Module
//!
//! `tracing-subscriber` setup with:
//! - Console output on stderr with color control
//! - File output in Full, Compact or JSON format

pub mod config;
pub mod error;

#[cfg(test)]
mod tests;

pub use config::*;
pub use error::LoggerError;

use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::sync::Mutex;

use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber described by `config`.
///
/// `RUST_LOG`, when set, takes precedence over `config.level`.
pub fn init_logger(config: LoggerConfig) -> Result<(), LoggerError> {
    config
        .validate()
        .map_err(|e| LoggerError::config(format!("{:#}", e)))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| LoggerError::config(e.to_string()))?;

    // File layer goes first so console ANSI settings do not leak into span fields
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);
    if config.file.enabled {
        layers.push(file_layer(&config.file)?);
    }
    layers.extend(console_layer(&config.console));

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    Ok(())
}

fn console_layer(config: &ConsoleConfig) -> Option<BoxedLayer> {
    if !config.enabled {
        return None;
    }

    let use_ansi = config.colored && std::io::stderr().is_terminal();
    Some(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(use_ansi)
            .with_target(true)
            .with_level(true)
            .boxed(),
    )
}

fn file_layer(config: &FileConfig) -> Result<BoxedLayer, LoggerError> {
    let writer = Mutex::new(open_log_file(config)?);
    let base = fmt::layer().with_ansi(false).with_target(true);

    Ok(match config.format {
        LogFormat::Full => base.with_writer(writer).boxed(),
        LogFormat::Compact => base.compact().with_writer(writer).boxed(),
        LogFormat::Json => base.json().with_writer(writer).boxed(),
    })
}

pub(crate) fn open_log_file(config: &FileConfig) -> Result<File, LoggerError> {
    if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| LoggerError::open_file(parent, e))?;
    }

    let mut options = OpenOptions::new();
    options.create(true);
    if config.append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }

    options
        .open(&config.path)
        .map_err(|e| LoggerError::open_file(&config.path, e))
}
