//! Console and file logging.
//!
//! Console output goes to stderr so stdout carries only command results.
//! `RUST_LOG` overrides the level from `--log-level` / `logging.level`.
//! When `logging.file` is set, JSON lines are also written there through a
//! non-blocking appender whose guard lives in `FILE_GUARD`.

use std::ffi::OsStr;
use std::path::Path;

use eyre::WrapErr;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::FILE_GUARD;

/// Directory and file name of the log sink; a bare name logs to the cwd.
fn log_location(path: &Path) -> eyre::Result<(&Path, &OsStr)> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| eyre::eyre!("logging.file has no file name: {}", path.display()))?;
    Ok((dir, name))
}

fn appender(path: &Path, rotation: Option<&str>) -> eyre::Result<tracing_appender::rolling::RollingFileAppender> {
    let (dir, name) = log_location(path)?;
    let rolling = match rotation.unwrap_or("never") {
        "never" => tracing_appender::rolling::never(dir, name),
        "daily" => tracing_appender::rolling::daily(dir, name),
        "hourly" => tracing_appender::rolling::hourly(dir, name),
        other => eyre::bail!("logging.rotation must be never, daily or hourly (got {other})"),
    };
    Ok(rolling)
}

pub fn init(json: bool, level: &str, logging: &tumbler_config::Logging) -> eyre::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(level).wrap_err_with(|| format!("invalid log level {level:?}"))?,
    };

    let console_json = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let console_text = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    let file_layer = match logging.file.as_deref() {
        Some(file) => {
            let rolling = appender(Path::new(file), logging.rotation.as_deref())?;
            let (writer, guard) = tracing_appender::non_blocking(rolling);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_json)
        .with(console_text)
        .with(file_layer)
        .try_init()
        .map_err(|e| eyre::eyre!("install tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_rotation_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = appender(&dir.path().join("t.log"), Some("weekly")).expect_err("weekly");
        assert!(err.to_string().contains("logging.rotation"));
    }

    #[test]
    fn known_rotations_open_in_target_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(appender(&dir.path().join("t.log"), None).is_ok());
        assert!(appender(&dir.path().join("t.log"), Some("hourly")).is_ok());
    }

    #[test]
    fn bare_file_name_logs_to_cwd() {
        let (dir, name) = log_location(Path::new("t.log")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "t.log");

        let (dir, name) = log_location(Path::new("logs/run/t.log")).unwrap();
        assert_eq!(dir, Path::new("logs/run"));
        assert_eq!(name, "t.log");
    }

    #[test]
    fn path_without_file_name_is_rejected() {
        assert!(log_location(Path::new("/")).is_err());
    }
}
