//! Logging setup: a console sink always, plus a size-rotating file sink when
//! enabled and the file can be opened.
//!
//! Nothing here touches global state until [`LoggingContext::init_global`] is
//! called, so tests can build a context and install it for a scope only.

mod rolling;

pub use rolling::RollingFileWriter;

use crate::config::LoggingConfig;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::dispatcher::{self, DefaultGuard, Dispatch, SetGlobalDefaultError};
use tracing::warn;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;

/// `[2024-01-31 13:05:09]` in local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "[{}]", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// A fully built logging pipeline that has not necessarily been installed.
pub struct LoggingContext {
    dispatch: Dispatch,
    file_sink: Option<PathBuf>,
}

impl LoggingContext {
    /// Console output goes to stdout.
    pub fn new(config: &LoggingConfig) -> Self {
        Self::with_console(config, io::stdout)
    }

    pub fn with_console<W>(config: &LoggingConfig, console: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_timer(LocalTimer)
            .with_writer(console);

        let (file_layer, file_sink, file_error) = if config.file_logging_enabled() {
            match RollingFileWriter::open(
                config.file_path(),
                config.file_limit_bytes(),
                config.file_count(),
            ) {
                Ok(writer) => {
                    let layer = tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_timer(LocalTimer)
                        .with_writer(move || writer.clone());
                    (Some(layer), Some(config.file_path().to_path_buf()), None)
                }
                Err(e) => (None, None, Some(e)),
            }
        } else {
            (None, None, None)
        };

        let subscriber = tracing_subscriber::registry()
            .with(level_filter(config))
            .with(console_layer)
            .with(file_layer);
        let dispatch = Dispatch::new(subscriber);

        if let Some(e) = file_error {
            dispatcher::with_default(&dispatch, || {
                warn!(
                    "Failed to configure logger to output to file {}: {}",
                    config.file_path().display(),
                    e
                );
            });
        }

        Self {
            dispatch,
            file_sink,
        }
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Path of the active file sink, `None` when logging to console only.
    pub fn file_sink(&self) -> Option<&Path> {
        self.file_sink.as_deref()
    }

    /// Installs this context for the current thread until the guard drops.
    pub fn set_default(&self) -> DefaultGuard {
        dispatcher::set_default(&self.dispatch)
    }

    /// Installs this context process-wide. Can only succeed once per process.
    pub fn init_global(self) -> Result<(), SetGlobalDefaultError> {
        dispatcher::set_global_default(self.dispatch)
    }
}

fn level_filter(config: &LoggingConfig) -> EnvFilter {
    match config.level() {
        Some(level) => EnvFilter::default().add_directive(LevelFilter::from(level).into()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    }
}
