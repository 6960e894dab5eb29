use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sqlnav_core::settings::{config_dir, Settings};
use sqlnav_tui::TuiError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "sqlnav.log";

/// `RUST_LOG` wins over the configured filter.
fn log_filter(settings: &Settings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

fn open_log_file(dir: &Path) -> std::io::Result<File> {
    fs::create_dir_all(dir)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))
}

/// The terminal belongs to the UI, so logs go to a file. Without a writable
/// config directory logging stays off.
fn init_logging(settings: &Settings) -> Option<PathBuf> {
    let dir = config_dir().ok()?;
    let file = open_log_file(&dir).ok()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(log_filter(settings))
        .try_init()
        .ok()?;
    Some(dir.join(LOG_FILE_NAME))
}

fn load_settings() -> Settings {
    match Settings::load_default() {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("sqlnav: {error}; using default settings");
            Settings::default()
        }
    }
}

fn run_app(
    settings: Settings,
    run_tui: impl FnOnce(Settings) -> Result<(), TuiError>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        preview_limit = settings.preview_limit,
        default_kind = %settings.connection.kind,
        "starting sqlnav"
    );
    if let Err(error) = run_tui(settings) {
        warn!(%error, "ui exited with an error");
        return Err(error.into());
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_settings();
    if let Some(path) = init_logging(&settings) {
        info!(path = %path.display(), "logging to file");
    }
    run_app(settings, sqlnav_tui::run)
}

#[cfg(test)]
mod tests {
    use std::io;

    use sqlnav_core::settings::Settings;
    use tempfile::TempDir;

    use super::{open_log_file, run_app, LOG_FILE_NAME};

    #[test]
    fn run_app_hands_settings_to_the_ui() {
        let mut settings = Settings::default();
        settings.preview_limit = 25;

        let result = run_app(settings, |settings| {
            assert_eq!(settings.preview_limit, 25);
            Ok(())
        });
        assert!(result.is_ok());
    }

    #[test]
    fn run_app_propagates_tui_errors() {
        let result = run_app(Settings::default(), |_| {
            Err(sqlnav_tui::TuiError::Io(io::Error::other("boom")))
        });
        assert_eq!(
            result.map_err(|error| error.to_string()),
            Err("i/o error: boom".to_string())
        );
    }

    #[test]
    fn log_file_is_created_inside_missing_directory() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let dir = temp_dir.path().join("nested").join("sqlnav");

        open_log_file(&dir).expect("log file should open");

        assert!(dir.join(LOG_FILE_NAME).is_file());
    }
}
