use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use sqlnav_core::catalog_navigator::CatalogBackend;
use sqlnav_core::connection_manager::{BackendError, ConnectionBackend, ConnectionParams};
use sqlnav_core::query_runner::{QueryBackend, RETURNED_ROWS_MESSAGE};
use sqlnav_core::results::{CellValue, ResultGrid};
use tracing::debug;

const LOCATOR_PREFIX: &str = "sqlite:";

#[derive(Debug, Clone, Default)]
pub struct SqliteBackend;

/// A SQLite file handle. Every call runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct SqliteConnection {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteConnection {
    pub fn open(path: &str) -> Result<Self, BackendError> {
        let conn = Connection::open(path).map_err(to_backend_error)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_connection<T, F>(&self, op: F) -> Result<T, BackendError>
    where
        F: FnOnce(&Connection) -> Result<T, BackendError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| BackendError::new("sqlite connection lock poisoned"))?;
            op(&guard)
        })
        .await
        .map_err(|error| BackendError::new(error.to_string()))?
    }
}

#[async_trait]
impl ConnectionBackend for SqliteBackend {
    type Connection = SqliteConnection;

    async fn connect(&self, params: &ConnectionParams) -> Result<Self::Connection, BackendError> {
        let locator = params.locator();
        let path = locator
            .strip_prefix(LOCATOR_PREFIX)
            .unwrap_or(locator.as_str())
            .to_string();
        tokio::task::spawn_blocking(move || SqliteConnection::open(&path))
            .await
            .map_err(|error| BackendError::new(error.to_string()))?
    }

    async fn close(&self, connection: Self::Connection) -> Result<(), BackendError> {
        drop(connection);
        Ok(())
    }
}

#[async_trait]
impl CatalogBackend for SqliteConnection {
    async fn list_catalogs(&mut self) -> Result<Vec<String>, BackendError> {
        self.with_connection(attached_databases).await
    }

    async fn list_tables(&mut self, catalog: &str) -> Result<Vec<String>, BackendError> {
        let sql = format!(
            "SELECT name FROM {}.sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
            quote_identifier(catalog)
        );
        self.with_connection(move |conn| {
            let mut statement = conn.prepare(&sql).map_err(to_backend_error)?;
            let names = statement
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(to_backend_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(to_backend_error)?;
            Ok(names)
        })
        .await
    }

    /// SQLite has no session-wide catalog switch; the name only has to exist.
    async fn set_active_catalog(&mut self, catalog: &str) -> Result<(), BackendError> {
        let catalog = catalog.to_string();
        self.with_connection(move |conn| {
            if attached_databases(conn)?.contains(&catalog) {
                Ok(())
            } else {
                Err(BackendError::new(format!("unknown database: {catalog}")))
            }
        })
        .await
    }
}

#[async_trait]
impl QueryBackend for SqliteConnection {
    async fn query(&mut self, sql: &str) -> Result<ResultGrid, BackendError> {
        let sql = sql.to_string();
        let grid = self
            .with_connection(move |conn| {
                let mut statement = conn.prepare(&sql).map_err(to_backend_error)?;
                let columns: Vec<String> = statement
                    .column_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                let column_count = columns.len();

                let mut grid = ResultGrid::new(columns);
                let mut rows = statement.query([]).map_err(to_backend_error)?;
                while let Some(row) = rows.next().map_err(to_backend_error)? {
                    let mut values = Vec::with_capacity(column_count);
                    for idx in 0..column_count {
                        values.push(sqlite_value_to_cell(
                            row.get_ref(idx).map_err(to_backend_error)?,
                        ));
                    }
                    grid.push_row(values);
                }
                Ok(grid)
            })
            .await?;
        debug!(rows = grid.row_count(), "sqlite result fetched");
        Ok(grid)
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, BackendError> {
        let sql = sql.to_string();
        self.with_connection(move |conn| {
            let mut statement = conn.prepare(&sql).map_err(to_backend_error)?;
            if statement.column_count() > 0 {
                return Err(BackendError::new(RETURNED_ROWS_MESSAGE));
            }
            let changed = statement.execute([]).map_err(to_backend_error)?;
            Ok(u64::try_from(changed).unwrap_or(u64::MAX))
        })
        .await
    }
}

fn attached_databases(conn: &Connection) -> Result<Vec<String>, BackendError> {
    let mut statement = conn
        .prepare("PRAGMA database_list")
        .map_err(to_backend_error)?;
    let names = statement
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(to_backend_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_backend_error)?;
    Ok(names)
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sqlite_value_to_cell(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(value) => CellValue::Integer(value),
        ValueRef::Real(value) => CellValue::Float(value),
        ValueRef::Text(text) => CellValue::Text(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => CellValue::Bytes(bytes.to_vec()),
    }
}

fn to_backend_error(error: rusqlite::Error) -> BackendError {
    BackendError::new(error.to_string())
}
