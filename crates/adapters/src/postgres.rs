use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlnav_core::catalog_navigator::CatalogBackend;
use sqlnav_core::connection_manager::{BackendError, ConnectionBackend, ConnectionParams};
use sqlnav_core::query_runner::{QueryBackend, RETURNED_ROWS_MESSAGE};
use sqlnav_core::results::{CellValue, ResultGrid};
use tokio::task::JoinHandle;
use tokio_postgres::types::Type;
use tokio_postgres::{Client, Config, NoTls, Row};
use tracing::{debug, info, warn};

const LIST_DATABASES_SQL: &str = "SELECT datname FROM pg_database \
     WHERE datallowconn AND NOT datistemplate \
     ORDER BY datname";

const LIST_TABLES_SQL: &str = "SELECT table_schema, table_name \
     FROM information_schema.tables \
     WHERE table_catalog = $1 \
       AND table_type = 'BASE TABLE' \
       AND table_schema NOT IN ('pg_catalog', 'information_schema') \
     ORDER BY table_schema, table_name";

#[derive(Debug, Clone, Default)]
pub struct PostgresBackend;

/// A PostgreSQL session bound to one database. Switching catalog reconnects
/// with the same credentials.
pub struct PostgresConnection {
    config: Config,
    client: Client,
    driver_task: JoinHandle<()>,
}

impl std::fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("dbname", &self.config.get_dbname())
            .finish_non_exhaustive()
    }
}

impl PostgresConnection {
    async fn open(config: Config) -> Result<Self, BackendError> {
        let (client, connection) = config.connect(NoTls).await.map_err(to_backend_error)?;
        let driver_task = tokio::spawn(async move {
            if let Err(error) = connection.await {
                warn!(%error, "postgres connection closed with error");
            }
        });

        Ok(Self {
            config,
            client,
            driver_task,
        })
    }

    pub fn close(self) {
        drop(self.client);
        self.driver_task.abort();
    }

    fn current_database(&self) -> Option<&str> {
        self.config.get_dbname()
    }
}

#[async_trait]
impl ConnectionBackend for PostgresBackend {
    type Connection = PostgresConnection;

    async fn connect(&self, params: &ConnectionParams) -> Result<Self::Connection, BackendError> {
        PostgresConnection::open(config_from_params(params)?).await
    }

    async fn close(&self, connection: Self::Connection) -> Result<(), BackendError> {
        connection.close();
        Ok(())
    }
}

#[async_trait]
impl CatalogBackend for PostgresConnection {
    async fn list_catalogs(&mut self) -> Result<Vec<String>, BackendError> {
        let rows = self
            .client
            .query(LIST_DATABASES_SQL, &[])
            .await
            .map_err(to_backend_error)?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(to_backend_error))
            .collect()
    }

    async fn list_tables(&mut self, catalog: &str) -> Result<Vec<String>, BackendError> {
        let rows = self
            .client
            .query(LIST_TABLES_SQL, &[&catalog])
            .await
            .map_err(to_backend_error)?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let schema: String = row.try_get(0).map_err(to_backend_error)?;
            let table: String = row.try_get(1).map_err(to_backend_error)?;
            tables.push(qualified_table_name(&schema, &table));
        }
        Ok(tables)
    }

    async fn set_active_catalog(&mut self, catalog: &str) -> Result<(), BackendError> {
        if self.current_database() == Some(catalog) {
            return Ok(());
        }

        let mut config = self.config.clone();
        config.dbname(catalog);
        let replacement = Self::open(config).await?;
        let previous = std::mem::replace(self, replacement);
        previous.close();
        info!(%catalog, "postgres session switched database");
        Ok(())
    }
}

#[async_trait]
impl QueryBackend for PostgresConnection {
    async fn query(&mut self, sql: &str) -> Result<ResultGrid, BackendError> {
        let statement = self.client.prepare(sql).await.map_err(to_backend_error)?;
        let rows = self
            .client
            .query(&statement, &[])
            .await
            .map_err(to_backend_error)?;

        let columns = statement.columns();
        let mut grid = ResultGrid::new(columns.iter().map(|c| c.name().to_string()).collect());
        for row in &rows {
            grid.push_row(
                columns
                    .iter()
                    .enumerate()
                    .map(|(idx, column)| extract_cell(row, idx, column.type_()))
                    .collect(),
            );
        }
        debug!(rows = grid.row_count(), "postgres result fetched");
        Ok(grid)
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, BackendError> {
        let statement = self.client.prepare(sql).await.map_err(to_backend_error)?;
        if !statement.columns().is_empty() {
            return Err(BackendError::new(RETURNED_ROWS_MESSAGE));
        }
        self.client
            .execute(&statement, &[])
            .await
            .map_err(to_backend_error)
    }
}

fn config_from_params(params: &ConnectionParams) -> Result<Config, BackendError> {
    let mut config: Config = params.locator().parse().map_err(to_backend_error)?;
    if !params.username.is_empty() {
        config.user(&params.username);
    }
    if !params.password.is_empty() {
        config.password(&params.password);
    }
    Ok(config)
}

fn qualified_table_name(schema: &str, table: &str) -> String {
    if schema == "public" {
        table.to_string()
    } else {
        format!("{schema}.{table}")
    }
}

fn extract_cell(row: &Row, idx: usize, ty: &Type) -> CellValue {
    let cell = match ty.name() {
        "bool" => row
            .try_get::<_, Option<bool>>(idx)
            .map(|v| v.map(CellValue::Boolean)),
        "int2" => row
            .try_get::<_, Option<i16>>(idx)
            .map(|v| v.map(|n| CellValue::Integer(i64::from(n)))),
        "int4" => row
            .try_get::<_, Option<i32>>(idx)
            .map(|v| v.map(|n| CellValue::Integer(i64::from(n)))),
        "int8" => row
            .try_get::<_, Option<i64>>(idx)
            .map(|v| v.map(CellValue::Integer)),
        "oid" => row
            .try_get::<_, Option<u32>>(idx)
            .map(|v| v.map(|n| CellValue::UnsignedInteger(u64::from(n)))),
        "float4" => row
            .try_get::<_, Option<f32>>(idx)
            .map(|v| v.map(|n| CellValue::Float(f64::from(n)))),
        "float8" => row
            .try_get::<_, Option<f64>>(idx)
            .map(|v| v.map(CellValue::Float)),
        "numeric" => row
            .try_get::<_, Option<Decimal>>(idx)
            .map(|v| v.map(|n| CellValue::Text(n.to_string()))),
        "bytea" => row
            .try_get::<_, Option<Vec<u8>>>(idx)
            .map(|v| v.map(CellValue::Bytes)),
        "timestamp" => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)
            .map(|v| v.map(|t| CellValue::Text(t.to_string()))),
        "timestamptz" => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
            .map(|v| v.map(|t| CellValue::Text(t.to_string()))),
        "date" => row
            .try_get::<_, Option<chrono::NaiveDate>>(idx)
            .map(|v| v.map(|t| CellValue::Text(t.to_string()))),
        "time" => row
            .try_get::<_, Option<chrono::NaiveTime>>(idx)
            .map(|v| v.map(|t| CellValue::Text(t.to_string()))),
        _ => return try_as_text(row, idx, ty),
    };

    match cell {
        Ok(Some(value)) => value,
        Ok(None) => CellValue::Null,
        Err(_) => try_as_text(row, idx, ty),
    }
}

fn try_as_text(row: &Row, idx: usize, ty: &Type) -> CellValue {
    match row.try_get::<_, Option<String>>(idx) {
        Ok(Some(text)) => CellValue::Text(text),
        Ok(None) => CellValue::Null,
        Err(_) => CellValue::Text(format!("<{}>", ty.name())),
    }
}

fn to_backend_error(error: tokio_postgres::Error) -> BackendError {
    BackendError::new(error.to_string())
}
