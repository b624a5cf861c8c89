use std::fs;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const FILTER_ENV: &str = "CODELYFT_LOG";

/// Logs go to a file: the terminal belongs to the UI. Returns `None` when
/// there is no data directory to write into. Keep the guard alive until exit
/// so buffered lines are flushed.
pub fn init() -> Result<Option<WorkerGuard>> {
    let Some(base) = BaseDirs::new() else {
        return Ok(None);
    };
    let dir = base.data_dir().join("codelyft").join("logs");
    fs::create_dir_all(&dir).with_context(|| format!("create log dir: {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(&dir, "codelyft.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!("init tracing: {}", e))?;
    Ok(Some(guard))
}
