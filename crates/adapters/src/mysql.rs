use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts, OptsBuilder, Row, Value};
use sqlnav_core::catalog_navigator::CatalogBackend;
use sqlnav_core::connection_manager::{BackendError, ConnectionBackend, ConnectionParams};
use sqlnav_core::query_runner::{QueryBackend, RETURNED_ROWS_MESSAGE};
use sqlnav_core::results::{CellValue, ResultGrid};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct MysqlBackend;

/// One MySQL session; `USE` switches its default schema.
#[derive(Debug)]
pub struct MysqlConnection {
    conn: Conn,
}

impl MysqlConnection {
    pub async fn disconnect(self) -> Result<(), BackendError> {
        self.conn.disconnect().await.map_err(to_backend_error)
    }
}

#[async_trait]
impl ConnectionBackend for MysqlBackend {
    type Connection = MysqlConnection;

    async fn connect(&self, params: &ConnectionParams) -> Result<Self::Connection, BackendError> {
        let opts = opts_from_params(params)?;
        let conn = Conn::new(opts).await.map_err(to_backend_error)?;
        Ok(MysqlConnection { conn })
    }

    async fn close(&self, connection: Self::Connection) -> Result<(), BackendError> {
        connection.disconnect().await
    }
}

#[async_trait]
impl CatalogBackend for MysqlConnection {
    async fn list_catalogs(&mut self) -> Result<Vec<String>, BackendError> {
        self.conn
            .query_map("SHOW DATABASES", |database: String| database)
            .await
            .map_err(to_backend_error)
    }

    async fn list_tables(&mut self, catalog: &str) -> Result<Vec<String>, BackendError> {
        self.conn
            .exec_map(
                "SELECT TABLE_NAME \
                 FROM information_schema.TABLES \
                 WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE' \
                 ORDER BY TABLE_NAME",
                (catalog.to_string(),),
                |table_name: String| table_name,
            )
            .await
            .map_err(to_backend_error)
    }

    async fn set_active_catalog(&mut self, catalog: &str) -> Result<(), BackendError> {
        self.conn
            .query_drop(format!("USE {}", quote_identifier(catalog)))
            .await
            .map_err(to_backend_error)
    }
}

#[async_trait]
impl QueryBackend for MysqlConnection {
    async fn query(&mut self, sql: &str) -> Result<ResultGrid, BackendError> {
        let result = self.conn.query_iter(sql).await.map_err(to_backend_error)?;
        let columns = result
            .columns_ref()
            .iter()
            .map(|column| column.name_str().into_owned())
            .collect();
        let rows = result
            .collect_and_drop::<Row>()
            .await
            .map_err(to_backend_error)?;

        let mut grid = ResultGrid::new(columns);
        for row in rows {
            grid.push_row(row.unwrap().into_iter().map(mysql_value_to_cell).collect());
        }
        debug!(rows = grid.row_count(), "mysql result fetched");
        Ok(grid)
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, BackendError> {
        let result = self.conn.query_iter(sql).await.map_err(to_backend_error)?;
        let returned_rows = !result.columns_ref().is_empty();
        result.drop_result().await.map_err(to_backend_error)?;
        if returned_rows {
            return Err(BackendError::new(RETURNED_ROWS_MESSAGE));
        }
        Ok(self.conn.affected_rows())
    }
}

fn opts_from_params(params: &ConnectionParams) -> Result<OptsBuilder, BackendError> {
    let opts =
        Opts::from_url(&params.locator()).map_err(|error| BackendError::new(error.to_string()))?;
    let mut builder = OptsBuilder::from_opts(opts);

    if !params.username.is_empty() {
        builder = builder.user(Some(params.username.clone()));
    }
    if !params.password.is_empty() {
        builder = builder.pass(Some(params.password.clone()));
    }

    Ok(builder)
}

fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn mysql_value_to_cell(value: Value) -> CellValue {
    match value {
        Value::NULL => CellValue::Null,
        Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => CellValue::Text(text),
            Err(error) => CellValue::Bytes(error.into_bytes()),
        },
        Value::Int(value) => CellValue::Integer(value),
        Value::UInt(value) => CellValue::UnsignedInteger(value),
        Value::Float(value) => CellValue::Float(f64::from(value)),
        Value::Double(value) => CellValue::Float(value),
        Value::Date(year, month, day, hour, minute, second, micros) => CellValue::Text(format!(
            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{micros:06}"
        )),
        Value::Time(is_negative, days, hours, minutes, seconds, micros) => {
            let sign = if is_negative { "-" } else { "" };
            CellValue::Text(format!(
                "{sign}{days:03} {hours:02}:{minutes:02}:{seconds:02}.{micros:06}"
            ))
        }
    }
}

fn to_backend_error(error: mysql_async::Error) -> BackendError {
    BackendError::new(error.to_string())
}
