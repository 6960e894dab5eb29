//! In-memory driver used by the unit tests of this crate.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::catalog_navigator::CatalogBackend;
use crate::connection_manager::{BackendError, ConnectionBackend, ConnectionParams};
use crate::query_runner::QueryBackend;
use crate::results::{CellValue, ResultGrid};

#[derive(Debug, Default)]
pub(crate) struct DriverCalls {
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    pub list_catalogs: AtomicUsize,
    pub list_tables: AtomicUsize,
    pub set_active_catalog: AtomicUsize,
    pub queries: AtomicUsize,
    pub executes: AtomicUsize,
}

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub calls: DriverCalls,
    pub fail_connect: AtomicBool,
    pub fail_list_catalogs: AtomicBool,
    pub fail_list_tables: AtomicBool,
    pub fail_execute: AtomicBool,
    catalogs: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeState {
    pub fn with_catalogs(catalogs: &[(&str, &[&str])]) -> Arc<Self> {
        let state = Self::default();
        {
            let mut stored = state.catalogs.lock().expect("fake state lock");
            for (name, tables) in catalogs {
                stored.push((
                    (*name).to_string(),
                    tables.iter().map(|table| (*table).to_string()).collect(),
                ));
            }
        }
        Arc::new(state)
    }

    fn catalog_names(&self) -> Vec<String> {
        let stored = self.catalogs.lock().expect("fake state lock");
        stored.iter().map(|(name, _)| name.clone()).collect()
    }

    fn tables(&self, catalog: &str) -> Option<Vec<String>> {
        let stored = self.catalogs.lock().expect("fake state lock");
        stored
            .iter()
            .find(|(name, _)| name == catalog)
            .map(|(_, tables)| tables.clone())
    }

    /// Without an active catalog every catalog is searched.
    fn has_table(&self, catalog: Option<&str>, table: &str) -> bool {
        let stored = self.catalogs.lock().expect("fake state lock");
        stored
            .iter()
            .filter(|(name, _)| catalog.map_or(true, |active| name.as_str() == active))
            .any(|(_, tables)| tables.iter().any(|name| name == table))
    }

    fn add_table(&self, catalog: Option<&str>, table: &str) {
        let mut stored = self.catalogs.lock().expect("fake state lock");
        let target = match catalog {
            Some(catalog) => stored.iter_mut().find(|(name, _)| name == catalog),
            None => stored.first_mut(),
        };
        if let Some((_, tables)) = target {
            tables.push(table.to_string());
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeBackend {
    state: Arc<FakeState>,
}

impl FakeBackend {
    pub fn new(state: Arc<FakeState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> Arc<FakeState> {
        Arc::clone(&self.state)
    }
}

#[derive(Debug)]
pub(crate) struct FakeConnection {
    state: Arc<FakeState>,
    active: Option<String>,
}

impl FakeConnection {
    pub fn new(state: Arc<FakeState>) -> Self {
        Self {
            state,
            active: None,
        }
    }
}

fn word_after<'a>(sql: &'a str, keyword: &str) -> Option<&'a str> {
    let mut words = sql.split_whitespace();
    words.find(|word| word.eq_ignore_ascii_case(keyword))?;
    words
        .next()
        .map(|word| word.trim_end_matches(';').split('(').next().unwrap_or(word))
}

#[async_trait]
impl ConnectionBackend for FakeBackend {
    type Connection = FakeConnection;

    async fn connect(&self, _params: &ConnectionParams) -> Result<Self::Connection, BackendError> {
        self.state.calls.connects.fetch_add(1, Ordering::Relaxed);
        if self.state.fail_connect.load(Ordering::Relaxed) {
            return Err(BackendError::new("connection refused"));
        }
        Ok(FakeConnection::new(self.state()))
    }

    async fn close(&self, _connection: Self::Connection) -> Result<(), BackendError> {
        self.state.calls.closes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[async_trait]
impl CatalogBackend for FakeConnection {
    async fn list_catalogs(&mut self) -> Result<Vec<String>, BackendError> {
        self.state.calls.list_catalogs.fetch_add(1, Ordering::Relaxed);
        if self.state.fail_list_catalogs.load(Ordering::Relaxed) {
            return Err(BackendError::new("metadata unavailable"));
        }
        Ok(self.state.catalog_names())
    }

    async fn list_tables(&mut self, catalog: &str) -> Result<Vec<String>, BackendError> {
        self.state.calls.list_tables.fetch_add(1, Ordering::Relaxed);
        if self.state.fail_list_tables.load(Ordering::Relaxed) {
            return Err(BackendError::new("table listing failed"));
        }
        self.state
            .tables(catalog)
            .ok_or_else(|| BackendError::new(format!("Unknown database '{catalog}'")))
    }

    async fn set_active_catalog(&mut self, catalog: &str) -> Result<(), BackendError> {
        self.state
            .calls
            .set_active_catalog
            .fetch_add(1, Ordering::Relaxed);
        if self.state.tables(catalog).is_none() {
            return Err(BackendError::new(format!("Unknown database '{catalog}'")));
        }
        self.active = Some(catalog.to_string());
        Ok(())
    }
}

#[async_trait]
impl QueryBackend for FakeConnection {
    async fn query(&mut self, sql: &str) -> Result<ResultGrid, BackendError> {
        self.state.calls.queries.fetch_add(1, Ordering::Relaxed);
        let table = word_after(sql, "FROM").unwrap_or_default();
        if !self.state.has_table(self.active.as_deref(), table) {
            return Err(BackendError::new(format!("no such table: {table}")));
        }

        let mut grid = ResultGrid::new(vec!["id".to_string()]);
        grid.push_row(vec![CellValue::Integer(1)]);
        grid.push_row(vec![CellValue::Integer(2)]);
        Ok(grid)
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, BackendError> {
        self.state.calls.executes.fetch_add(1, Ordering::Relaxed);
        if self.state.fail_execute.load(Ordering::Relaxed) {
            return Err(BackendError::new("permission denied"));
        }
        let keyword = sql
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        match keyword.as_str() {
            "INSERT" | "UPDATE" | "DELETE" => Ok(1),
            "CREATE" => {
                if let Some(table) = word_after(sql, "TABLE") {
                    self.state.add_table(self.active.as_deref(), table);
                }
                Ok(0)
            }
            "DROP" | "ALTER" => Ok(0),
            "USE" => {
                let catalog = word_after(sql, "USE").unwrap_or_default().trim_matches('`');
                if self.state.tables(catalog).is_none() {
                    return Err(BackendError::new(format!("Unknown database '{catalog}'")));
                }
                self.active = Some(catalog.to_string());
                Ok(0)
            }
            _ => Err(BackendError::new(format!(
                "near \"{}\": syntax error",
                sql.split_whitespace().next().unwrap_or_default()
            ))),
        }
    }
}
