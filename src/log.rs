// src/log.rs
//
// tracing setup plus the short logging macros used across the crate.
// Stderr always gets a compact layer; a file layer is added when a log
// path is given (the CLI defaults it to `.store/debug.log`).

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Error, Result};

/// Keeps the non-blocking file writer alive until process exit.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn env_filter(verbose: bool) -> EnvFilter {
    // RUST_LOG wins, e.g. RUST_LOG=awo_locate=trace,reqwest=debug
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("awo_locate={level},reqwest=warn,hyper=warn"))
    })
}

/// Install the global subscriber. Calling it twice is harmless; the second
/// call only reports that logging was already set up.
pub fn init(log_file: Option<&Path>, verbose: bool) -> Result<()> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(fmt::time::Uptime::default())
        .boxed();

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
                }
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| Error::io(path, e))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_timer(fmt::time::Uptime::default())
                    .boxed(),
            )
        }
        None => None,
    };

    let installed = Registry::default()
        .with(env_filter(verbose))
        .with(console)
        .with(file_layer)
        .try_init();

    if installed.is_err() {
        tracing::debug!("logging already initialised");
    }
    Ok(())
}

/// Info-level logging
#[macro_export]
macro_rules! logf {
    ($($arg:tt)*) => {
        ::tracing::info!($($arg)*)
    };
}

/// Debug-level logging
#[macro_export]
macro_rules! logd {
    ($($arg:tt)*) => {
        ::tracing::debug!($($arg)*)
    };
}

/// Warn-level logging
#[macro_export]
macro_rules! logw {
    ($($arg:tt)*) => {
        ::tracing::warn!($($arg)*)
    };
}

/// Error-level logging
#[macro_export]
macro_rules! loge {
    ($($arg:tt)*) => {
        ::tracing::error!($($arg)*)
    };
}
