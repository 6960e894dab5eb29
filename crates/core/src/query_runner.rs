use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::connection_manager::BackendError;
use crate::results::ResultGrid;

/// Statement half of the driver boundary.
#[async_trait]
pub trait QueryBackend: Send {
    /// Runs a row-producing statement and drains its cursor completely.
    async fn query(&mut self, sql: &str) -> Result<ResultGrid, BackendError>;
    /// Runs a row-affecting statement and returns the affected-row count. A
    /// statement that yields a result set fails with [`RETURNED_ROWS_MESSAGE`].
    async fn execute(&mut self, sql: &str) -> Result<u64, BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    RowProducing,
    RowAffecting,
}

const SCHEMA_CHANGING_KEYWORDS: [&str; 3] = ["CREATE", "DROP", "ALTER"];

fn starts_with_keyword(sql: &str, keyword: &str) -> bool {
    let sql = sql.trim_start();
    sql.len() >= keyword.len()
        && sql.is_char_boundary(keyword.len())
        && sql[..keyword.len()].eq_ignore_ascii_case(keyword)
}

/// Leading-keyword sniffing only: text starting with `SELECT` produces rows,
/// anything else affects rows.
#[must_use]
pub fn classify(sql: &str) -> StatementKind {
    if starts_with_keyword(sql, "SELECT") {
        StatementKind::RowProducing
    } else {
        StatementKind::RowAffecting
    }
}

/// DDL that invalidates the catalog tree.
#[must_use]
pub fn is_schema_change(sql: &str) -> bool {
    SCHEMA_CHANGING_KEYWORDS
        .iter()
        .any(|keyword| starts_with_keyword(sql, keyword))
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows {
        grid: ResultGrid,
        elapsed: Duration,
    },
    Affected {
        rows: u64,
        schema_changed: bool,
        elapsed: Duration,
    },
}

#[derive(Debug, Error)]
pub enum QueryRunnerError {
    #[error("Please enter a query")]
    EmptyQuery,
    #[error(transparent)]
    Backend(BackendError),
}

pub const DEFAULT_PREVIEW_LIMIT: usize = 100;

/// Shared by every driver so `SHOW`, `PRAGMA` and friends fail the same way.
pub const RETURNED_ROWS_MESSAGE: &str =
    "statement returned rows; start it with SELECT to see them as a table";

#[derive(Debug, Clone)]
pub struct QueryRunner {
    preview_limit: usize,
}

impl Default for QueryRunner {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_LIMIT)
    }
}

impl QueryRunner {
    #[must_use]
    pub fn new(preview_limit: usize) -> Self {
        Self {
            preview_limit: preview_limit.max(1),
        }
    }

    #[must_use]
    pub fn preview_limit(&self) -> usize {
        self.preview_limit
    }

    /// The bounded query issued when a table node is selected.
    #[must_use]
    pub fn preview_sql(&self, table: &str) -> String {
        format!("SELECT * FROM {table} LIMIT {};", self.preview_limit)
    }

    pub async fn run<C>(
        &self,
        connection: &mut C,
        sql: &str,
    ) -> Result<QueryOutcome, QueryRunnerError>
    where
        C: QueryBackend + ?Sized,
    {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(QueryRunnerError::EmptyQuery);
        }

        let started_at = Instant::now();
        match classify(sql) {
            StatementKind::RowProducing => {
                debug!(%sql, "running row-producing statement");
                let grid = connection
                    .query(sql)
                    .await
                    .map_err(QueryRunnerError::Backend)?;
                Ok(QueryOutcome::Rows {
                    grid,
                    elapsed: started_at.elapsed(),
                })
            }
            StatementKind::RowAffecting => {
                debug!(%sql, "running row-affecting statement");
                let rows = connection
                    .execute(sql)
                    .await
                    .map_err(QueryRunnerError::Backend)?;
                Ok(QueryOutcome::Affected {
                    rows,
                    schema_changed: is_schema_change(sql),
                    elapsed: started_at.elapsed(),
                })
            }
        }
    }
}
