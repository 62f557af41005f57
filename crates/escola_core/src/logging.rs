use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes console logging, plus a daily rolling file when `log_dir` is
/// set. `RUST_LOG` takes precedence over `level`.
///
/// Returns the file writer guard, which must be kept alive for the duration
/// of the process.
pub fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "escola");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_ansi(false)
                        .with_writer(non_blocking),
                )
                .with(fmt::layer().with_target(false).compact())
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(false).compact())
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

            Ok(None)
        }
    }
}

/// Service crates log at `level`; everything else (actix, hyper internals)
/// stays at `warn` unless the level is more verbose than that.
fn default_filter(level: &str) -> String {
    let level = level.trim();
    let level = if level.is_empty() { "info" } else { level };
    format!(
        "warn,actix_web={level},escola_core={level},escola_docs={level},escola_api={level}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_uses_level_for_service_crates() {
        let filter = default_filter("debug");
        assert!(filter.starts_with("warn,"));
        assert!(filter.contains("escola_docs=debug"));
        assert!(filter.contains("escola_api=debug"));
    }

    #[test]
    fn test_default_filter_blank_level_falls_back_to_info() {
        assert!(default_filter("  ").contains("escola_core=info"));
    }

    #[test]
    fn test_init_logging_console_only_returns_no_guard() {
        // Only one global subscriber per process; a second install errors.
        match init_logging("warn", None) {
            Ok(guard) => assert!(guard.is_none()),
            Err(e) => assert!(e.to_string().contains("Failed to initialize logging")),
        }
    }

    #[test]
    fn test_init_logging_with_dir_creates_directory() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let logs_dir = tmp.path().join("service_logs");

        let result = init_logging("info", Some(&logs_dir));
        assert!(logs_dir.exists());
        drop(result);
    }
}
