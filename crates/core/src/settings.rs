use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog_navigator::SystemCatalogFilter;
use crate::connection_manager::DatabaseKind;
use crate::query_runner::DEFAULT_PREVIEW_LIMIT;

pub const DEFAULT_MESSAGE_LOG_CAPACITY: usize = 1_000;
pub const DEFAULT_LOG_FILTER: &str = "info";

const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Initial values of the connection form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ConnectionDefaults {
    pub kind: DatabaseKind,
    pub host: String,
    /// Falls back to the kind's default port when absent.
    pub port: Option<String>,
    pub user: String,
}

impl ConnectionDefaults {
    #[must_use]
    pub fn port_or_default(&self) -> String {
        self.port
            .clone()
            .unwrap_or_else(|| self.kind.default_port().unwrap_or_default().to_string())
    }
}

/// Per-kind replacement of the built-in system catalog denylist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SystemCatalogSettings {
    pub mysql: Option<Vec<String>>,
    pub postgresql: Option<Vec<String>>,
    pub sqlite: Option<Vec<String>>,
}

impl SystemCatalogSettings {
    #[must_use]
    pub fn filter_for(&self, kind: DatabaseKind) -> SystemCatalogFilter {
        let configured = match kind {
            DatabaseKind::MySql => self.mysql.as_ref(),
            DatabaseKind::PostgreSql => self.postgresql.as_ref(),
            DatabaseKind::Sqlite => self.sqlite.as_ref(),
        };
        configured.map_or_else(
            || SystemCatalogFilter::for_kind(kind),
            |names| SystemCatalogFilter::from_names(names.iter().cloned()),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub preview_limit: usize,
    pub message_log_capacity: usize,
    pub log_filter: String,
    pub connection: ConnectionDefaults,
    pub system_catalogs: SystemCatalogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            message_log_capacity: DEFAULT_MESSAGE_LOG_CAPACITY,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            connection: ConnectionDefaults::default(),
            system_catalogs: SystemCatalogSettings::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("config directory is unavailable for this platform")]
    ConfigDirUnavailable,
    #[error("failed to read settings file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Settings {
    pub fn load_default() -> Result<Self, SettingsError> {
        Self::load_from_path(default_settings_path()?)
    }

    /// A missing or blank file yields the defaults.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut settings: Self = toml::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.normalize();
        Ok(settings)
    }

    #[must_use]
    pub fn filter_for(&self, kind: DatabaseKind) -> SystemCatalogFilter {
        self.system_catalogs.filter_for(kind)
    }

    fn normalize(&mut self) {
        self.preview_limit = self.preview_limit.max(1);
        self.message_log_capacity = self.message_log_capacity.max(1);
        if self.log_filter.trim().is_empty() {
            self.log_filter = DEFAULT_LOG_FILTER.to_string();
        }
    }
}

/// `$SQLNAV_CONFIG_DIR` as given, otherwise `sqlnav/` under the platform config home.
pub fn config_dir() -> Result<PathBuf, SettingsError> {
    if let Some(custom) = env::var_os("SQLNAV_CONFIG_DIR") {
        return Ok(PathBuf::from(custom));
    }

    let base_dir = if cfg!(target_os = "windows") {
        env::var_os("APPDATA")
            .map(PathBuf::from)
            .ok_or(SettingsError::ConfigDirUnavailable)?
    } else if let Some(xdg_config_home) = env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config_home)
    } else {
        let home = env::var_os("HOME").ok_or(SettingsError::ConfigDirUnavailable)?;
        PathBuf::from(home).join(".config")
    };

    Ok(base_dir.join("sqlnav"))
}

pub fn default_settings_path() -> Result<PathBuf, SettingsError> {
    Ok(config_dir()?.join(SETTINGS_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{Settings, SettingsError, DEFAULT_MESSAGE_LOG_CAPACITY};
    use crate::connection_manager::DatabaseKind;

    #[test]
    fn missing_settings_file_loads_defaults() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let settings = Settings::load_from_path(temp_dir.path().join("settings.toml"))
            .expect("failed to load settings");

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.preview_limit, 100);
        assert_eq!(settings.message_log_capacity, DEFAULT_MESSAGE_LOG_CAPACITY);
        assert_eq!(settings.log_filter, "info");
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("settings.toml");
        fs::write(
            &path,
            r#"
preview_limit = 25

[connection]
kind = "postgres"
host = "db.internal"
user = "reporting"

[system_catalogs]
postgresql = ["template0", "template1", "postgres"]
"#,
        )
        .expect("failed to write settings");

        let settings = Settings::load_from_path(&path).expect("failed to load settings");
        assert_eq!(settings.preview_limit, 25);
        assert_eq!(settings.log_filter, "info");
        assert_eq!(settings.connection.kind, DatabaseKind::PostgreSql);
        assert_eq!(settings.connection.port_or_default(), "5432");
        assert!(settings.filter_for(DatabaseKind::PostgreSql).is_system("postgres"));
        assert!(settings.filter_for(DatabaseKind::MySql).is_system("sys"));
    }

    #[test]
    fn zero_limits_are_clamped() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "preview_limit = 0\nmessage_log_capacity = 0\nlog_filter = \"\"\n")
            .expect("failed to write settings");

        let settings = Settings::load_from_path(&path).expect("failed to load settings");
        assert_eq!(settings.preview_limit, 1);
        assert_eq!(settings.message_log_capacity, 1);
        assert_eq!(settings.log_filter, "info");
    }

    #[test]
    fn malformed_file_reports_path() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "preview_limit = \"lots\"").expect("failed to write settings");

        let err = Settings::load_from_path(&path).expect_err("parse should fail");
        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().contains("settings.toml"));
    }
}
