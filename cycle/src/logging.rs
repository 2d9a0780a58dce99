use anyhow::{anyhow, Result};
use chrono::Local;
use std::path::PathBuf;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// `~/.config/cycle/logs`
pub fn logs_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or(anyhow!("Could not find config directory"))?;
    Ok(config_dir.join("cycle").join("logs"))
}

/// Full log to `cycle-YYYY-MM-DD-HH-MM-SS.log`, plus warnings on stderr.
///
/// `RUST_LOG` overrides the file filter (default `info`). With `verbose`,
/// stderr gets the same events as the file.
pub fn init_logging(verbose: bool) -> Result<PathBuf> {
    let logs_dir = logs_dir()?;
    std::fs::create_dir_all(&logs_dir)?;

    let log_filename = format!("cycle-{}.log", Local::now().format("%Y-%m-%d-%H-%M-%S"));
    let log_path = logs_dir.join(&log_filename);

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&logs_dir, &log_filename));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    // stdout carries command output, so diagnostics go to stderr
    let stderr_level = if verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::WARN
    };
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(stderr_level);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    // Flush on exit rather than on drop
    std::mem::forget(guard);

    Ok(log_path)
}
