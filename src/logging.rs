//! File-only tracing setup.
//!
//! Completion output goes to stdout and is read by the calling shell, so logs
//! never go to a terminal stream. `CMDGRAPH_LOG=<path>` turns logging on;
//! `RUST_LOG` filters it (default `info`).

use std::fs::File;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_ENV: &str = "CMDGRAPH_LOG";

/// Per-process log file derived from `base`: `{base}.{unix_secs}.{pid}`.
///
/// Completion fires once per keystroke, so concurrent runs are the norm.
pub fn log_file_path(base: &str) -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    PathBuf::from(format!("{}.{}.{}", base, secs, std::process::id()))
}

/// Install the file subscriber if `CMDGRAPH_LOG` is set. Returns the file in use.
pub fn init_tracing() -> Option<PathBuf> {
    let base = std::env::var(LOG_ENV).ok().filter(|v| !v.is_empty())?;
    let path = log_file_path(&base);

    let file = match File::create(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("cmdgraph: cannot open log file {}: {}", path.display(), e);
            return None;
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_timer(UtcTime::rfc_3339()),
        )
        .init();

    tracing::info!(path = %path.display(), pid = std::process::id(), "logging started");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path_is_unique_per_process() {
        let path = log_file_path("/tmp/cmdgraph.log");
        let name = path.to_string_lossy().into_owned();
        assert!(name.starts_with("/tmp/cmdgraph.log."));
        assert!(name.ends_with(&format!(".{}", std::process::id())));
    }
}
