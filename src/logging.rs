/// File-based tracing setup. The TUI owns the terminal, so nothing is
/// written to stdout or stderr.
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_ENV: &str = "DAYPLAN_LOG";

/// Installs the global subscriber. `DAYPLAN_LOG` takes precedence over
/// `default_level`.
pub fn init_logging(default_level: &str, log_path: &Path) -> Result<()> {
    let filter = build_filter(default_level)?;

    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .context("logging already initialized")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log = %log_path.display(),
        "dayplan starting"
    );
    Ok(())
}

fn build_filter(default_level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(format!("dayplan={default_level},warn"))
            .with_context(|| format!("invalid log level `{default_level}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_log_file_once() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("dayplan.log");

        init_logging("debug", &path).expect("first init succeeds");
        assert!(path.exists());
        assert!(init_logging("debug", &path).is_err());
    }
}
