//! Tracing initialization from the logging config section.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use crate::config::LoggingConfig;

/// Initialize the global tracing subscriber: a compact console layer at the
/// configured level (an explicit `RUST_LOG` still wins) plus an optional
/// daily-rolling file layer.
///
/// The returned guard must stay alive for the process lifetime, or buffered
/// file output is lost.
pub fn init(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let console_layer = fmt::layer()
        .compact()
        .with_filter(console_filter(&config.console_level));

    let (file_layer, guard) = match config.file.as_deref() {
        Some(path) if !path.is_empty() => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "orgdir.log".to_string());
            let appender = tracing_appender::rolling::daily(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let level = if config.file_level.is_empty() {
                "debug"
            } else {
                config.file_level.as_str()
            };
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(level));
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init tracing: {e}"))?;

    Ok(guard)
}

fn console_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()))
}
