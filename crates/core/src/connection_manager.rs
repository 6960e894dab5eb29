use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog_navigator::CatalogBackend;
use crate::query_runner::QueryBackend;

/// Failure reported by a database driver. `Display` is the driver message, verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    message: String,
}

impl BackendError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum DatabaseKind {
    #[default]
    #[serde(rename = "mysql")]
    MySql,
    #[serde(rename = "postgresql", alias = "postgres")]
    PostgreSql,
    #[serde(rename = "sqlite")]
    Sqlite,
}

impl DatabaseKind {
    pub const ALL: [Self; 3] = [Self::MySql, Self::PostgreSql, Self::Sqlite];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::MySql => "MySQL",
            Self::PostgreSql => "PostgreSQL",
            Self::Sqlite => "SQLite",
        }
    }

    #[must_use]
    pub fn default_port(self) -> Option<&'static str> {
        match self {
            Self::MySql => Some("3306"),
            Self::PostgreSql => Some("5432"),
            Self::Sqlite => None,
        }
    }

    /// SQLite reads the host field as a file path.
    #[must_use]
    pub fn is_file_based(self) -> bool {
        matches!(self, Self::Sqlite)
    }

    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::MySql => Self::PostgreSql,
            Self::PostgreSql => Self::Sqlite,
            Self::Sqlite => Self::MySql,
        }
    }

    #[must_use]
    pub fn previous(self) -> Self {
        match self {
            Self::MySql => Self::Sqlite,
            Self::PostgreSql => Self::MySql,
            Self::Sqlite => Self::PostgreSql,
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the user typed into the connection form. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub kind: DatabaseKind,
    pub host: String,
    pub port: String,
    pub username: String,
    pub password: String,
}

impl ConnectionParams {
    #[must_use]
    pub fn new(kind: DatabaseKind, host: impl Into<String>) -> Self {
        Self {
            kind,
            host: host.into(),
            port: kind.default_port().unwrap_or_default().to_string(),
            username: String::new(),
            password: String::new(),
        }
    }

    #[must_use]
    pub fn locator(&self) -> String {
        connection_locator(self.kind, &self.host, &self.port)
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("kind", &self.kind)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Builds the driver locator for `kind`. The port is embedded as typed; an empty
/// port falls back to the kind's default.
#[must_use]
pub fn connection_locator(kind: DatabaseKind, host: &str, port: &str) -> String {
    let port = match port.trim() {
        "" => kind.default_port().unwrap_or_default(),
        typed => typed,
    };

    match kind {
        DatabaseKind::MySql => format!("mysql://{host}:{port}/"),
        DatabaseKind::PostgreSql => format!("postgresql://{host}:{port}/"),
        DatabaseKind::Sqlite => format!("sqlite:{host}"),
    }
}

#[async_trait]
pub trait ConnectionBackend: Send + Sync {
    type Connection: CatalogBackend + QueryBackend + fmt::Debug;

    async fn connect(&self, params: &ConnectionParams) -> Result<Self::Connection, BackendError>;
    async fn close(&self, connection: Self::Connection) -> Result<(), BackendError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    pub kind: Option<DatabaseKind>,
    pub locator: Option<String>,
    pub username: Option<String>,
    pub is_connected: bool,
    pub last_latency: Option<Duration>,
}

impl ConnectionStatus {
    #[must_use]
    pub fn disconnected() -> Self {
        Self::default()
    }
}

#[derive(Debug, Error)]
pub enum ConnectionManagerError {
    #[error("not connected to a database")]
    NotConnected,
    #[error(transparent)]
    Backend(BackendError),
}

#[derive(Debug)]
struct ActiveConnection<C> {
    kind: DatabaseKind,
    locator: String,
    username: String,
    handle: C,
}

/// Holds the one live connection of the application.
#[derive(Debug)]
pub struct ConnectionManager<B: ConnectionBackend> {
    backend: B,
    active: Option<ActiveConnection<B::Connection>>,
    last_latency: Option<Duration>,
}

impl<B: ConnectionBackend> ConnectionManager<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            active: None,
            last_latency: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        match &self.active {
            Some(active) => ConnectionStatus {
                kind: Some(active.kind),
                locator: Some(active.locator.clone()),
                username: Some(active.username.clone()),
                is_connected: true,
                last_latency: self.last_latency,
            },
            None => ConnectionStatus::disconnected(),
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn active_kind(&self) -> Option<DatabaseKind> {
        self.active.as_ref().map(|active| active.kind)
    }

    pub fn connection_mut(&mut self) -> Result<&mut B::Connection, ConnectionManagerError> {
        self.active
            .as_mut()
            .map(|active| &mut active.handle)
            .ok_or(ConnectionManagerError::NotConnected)
    }

    /// Opens a connection for `params`. On success it replaces the current one,
    /// which is closed best-effort; on failure the current one is left untouched.
    pub async fn connect(
        &mut self,
        params: &ConnectionParams,
    ) -> Result<Duration, ConnectionManagerError> {
        let locator = params.locator();
        let started_at = Instant::now();
        let handle = self
            .backend
            .connect(params)
            .await
            .map_err(ConnectionManagerError::Backend)?;
        let latency = started_at.elapsed();

        let previous = self.active.replace(ActiveConnection {
            kind: params.kind,
            locator: locator.clone(),
            username: params.username.clone(),
            handle,
        });
        if let Some(previous) = previous {
            if let Err(error) = self.backend.close(previous.handle).await {
                warn!(locator = %previous.locator, %error, "closing replaced connection failed");
            }
        }

        self.last_latency = Some(latency);
        info!(kind = %params.kind, %locator, ?latency, "connected");
        Ok(latency)
    }

    pub async fn disconnect(&mut self) -> Result<(), ConnectionManagerError> {
        let Some(active) = self.active.take() else {
            return Ok(());
        };

        self.last_latency = None;
        self.backend
            .close(active.handle)
            .await
            .map_err(ConnectionManagerError::Backend)?;
        info!(locator = %active.locator, "disconnected");
        Ok(())
    }
}
