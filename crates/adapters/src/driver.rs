use async_trait::async_trait;
use sqlnav_core::catalog_navigator::CatalogBackend;
use sqlnav_core::connection_manager::{
    BackendError, ConnectionBackend, ConnectionParams, DatabaseKind,
};
use sqlnav_core::query_runner::QueryBackend;
use sqlnav_core::results::ResultGrid;

use crate::mysql::{MysqlBackend, MysqlConnection};
use crate::postgres::{PostgresBackend, PostgresConnection};
use crate::sqlite::{SqliteBackend, SqliteConnection};

/// Picks the concrete driver from `ConnectionParams::kind`.
#[derive(Debug, Clone, Default)]
pub struct DriverBackend {
    mysql: MysqlBackend,
    postgres: PostgresBackend,
    sqlite: SqliteBackend,
}

#[derive(Debug)]
pub enum DriverConnection {
    MySql(MysqlConnection),
    PostgreSql(PostgresConnection),
    Sqlite(SqliteConnection),
}

impl DriverConnection {
    #[must_use]
    pub fn kind(&self) -> DatabaseKind {
        match self {
            Self::MySql(_) => DatabaseKind::MySql,
            Self::PostgreSql(_) => DatabaseKind::PostgreSql,
            Self::Sqlite(_) => DatabaseKind::Sqlite,
        }
    }
}

#[async_trait]
impl ConnectionBackend for DriverBackend {
    type Connection = DriverConnection;

    async fn connect(&self, params: &ConnectionParams) -> Result<Self::Connection, BackendError> {
        match params.kind {
            DatabaseKind::MySql => self.mysql.connect(params).await.map(DriverConnection::MySql),
            DatabaseKind::PostgreSql => self
                .postgres
                .connect(params)
                .await
                .map(DriverConnection::PostgreSql),
            DatabaseKind::Sqlite => self
                .sqlite
                .connect(params)
                .await
                .map(DriverConnection::Sqlite),
        }
    }

    async fn close(&self, connection: Self::Connection) -> Result<(), BackendError> {
        match connection {
            DriverConnection::MySql(connection) => self.mysql.close(connection).await,
            DriverConnection::PostgreSql(connection) => self.postgres.close(connection).await,
            DriverConnection::Sqlite(connection) => self.sqlite.close(connection).await,
        }
    }
}

#[async_trait]
impl CatalogBackend for DriverConnection {
    async fn list_catalogs(&mut self) -> Result<Vec<String>, BackendError> {
        match self {
            Self::MySql(connection) => connection.list_catalogs().await,
            Self::PostgreSql(connection) => connection.list_catalogs().await,
            Self::Sqlite(connection) => connection.list_catalogs().await,
        }
    }

    async fn list_tables(&mut self, catalog: &str) -> Result<Vec<String>, BackendError> {
        match self {
            Self::MySql(connection) => connection.list_tables(catalog).await,
            Self::PostgreSql(connection) => connection.list_tables(catalog).await,
            Self::Sqlite(connection) => connection.list_tables(catalog).await,
        }
    }

    async fn set_active_catalog(&mut self, catalog: &str) -> Result<(), BackendError> {
        match self {
            Self::MySql(connection) => connection.set_active_catalog(catalog).await,
            Self::PostgreSql(connection) => connection.set_active_catalog(catalog).await,
            Self::Sqlite(connection) => connection.set_active_catalog(catalog).await,
        }
    }
}

#[async_trait]
impl QueryBackend for DriverConnection {
    async fn query(&mut self, sql: &str) -> Result<ResultGrid, BackendError> {
        match self {
            Self::MySql(connection) => connection.query(sql).await,
            Self::PostgreSql(connection) => connection.query(sql).await,
            Self::Sqlite(connection) => connection.query(sql).await,
        }
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, BackendError> {
        match self {
            Self::MySql(connection) => connection.execute(sql).await,
            Self::PostgreSql(connection) => connection.execute(sql).await,
            Self::Sqlite(connection) => connection.execute(sql).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlnav_core::connection_manager::{ConnectionBackend, ConnectionParams, DatabaseKind};
    use tempfile::TempDir;

    use super::DriverBackend;

    #[tokio::test]
    async fn sqlite_kind_opens_a_sqlite_connection() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("dispatch.db");
        let backend = DriverBackend::default();

        let connection = backend
            .connect(&ConnectionParams::new(
                DatabaseKind::Sqlite,
                path.to_string_lossy(),
            ))
            .await
            .expect("sqlite connect should succeed");

        assert_eq!(connection.kind(), DatabaseKind::Sqlite);
        backend.close(connection).await.expect("close");
    }

    #[tokio::test]
    async fn malformed_mysql_locator_fails_before_dialing() {
        let mut params = ConnectionParams::new(DatabaseKind::MySql, "localhost");
        params.port = "not-a-port".to_string();

        let err = DriverBackend::default()
            .connect(&params)
            .await
            .expect_err("port is not numeric");
        assert!(!err.message().is_empty());
    }
}
