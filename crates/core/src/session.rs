use std::time::Duration;

use tracing::{info, warn};

use crate::catalog_navigator::{CatalogNavigator, ExpandOutcome, NodeId};
use crate::connection_manager::{
    ConnectionBackend, ConnectionManager, ConnectionManagerError, ConnectionParams,
    ConnectionStatus,
};
use crate::query_runner::{QueryOutcome, QueryRunner, QueryRunnerError};
use crate::results::ResultsView;
use crate::settings::{Settings, SystemCatalogSettings};

/// Everything the UI needs to redraw after a session action.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub connection: ConnectionStatus,
    pub navigator: CatalogNavigator,
    pub results: ResultsView,
    pub editor_text: String,
}

/// One connection, its catalog tree, the editor text and the results area.
///
/// Statement and metadata failures never escape a session action: they land in
/// the message log with an `ERROR: ` prefix. Only `connect` returns an error.
#[derive(Debug)]
pub struct Session<B: ConnectionBackend> {
    manager: ConnectionManager<B>,
    navigator: CatalogNavigator,
    runner: QueryRunner,
    results: ResultsView,
    editor_text: String,
    system_catalogs: SystemCatalogSettings,
}

impl<B: ConnectionBackend> Session<B> {
    #[must_use]
    pub fn new(backend: B, settings: &Settings) -> Self {
        Self {
            manager: ConnectionManager::new(backend),
            navigator: CatalogNavigator::default(),
            runner: QueryRunner::new(settings.preview_limit),
            results: ResultsView::new(settings.message_log_capacity.max(1)),
            editor_text: String::new(),
            system_catalogs: settings.system_catalogs.clone(),
        }
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.manager.status()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    #[must_use]
    pub fn navigator(&self) -> &CatalogNavigator {
        &self.navigator
    }

    #[must_use]
    pub fn results(&self) -> &ResultsView {
        &self.results
    }

    #[must_use]
    pub fn runner(&self) -> &QueryRunner {
        &self.runner
    }

    #[must_use]
    pub fn editor_text(&self) -> &str {
        &self.editor_text
    }

    pub fn set_editor_text(&mut self, text: impl Into<String>) {
        self.editor_text = text.into();
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            connection: self.manager.status(),
            navigator: self.navigator.clone(),
            results: self.results.clone(),
            editor_text: self.editor_text.clone(),
        }
    }

    /// Opens a connection and loads its catalogs. A failed catalog load is
    /// logged but still counts as a successful connect.
    pub async fn connect(
        &mut self,
        params: &ConnectionParams,
    ) -> Result<Duration, ConnectionManagerError> {
        let latency = match self.manager.connect(params).await {
            Ok(latency) => latency,
            Err(error) => {
                warn!(kind = %params.kind, locator = %params.locator(), %error, "connect failed");
                return Err(error);
            }
        };

        self.navigator
            .set_filter(self.system_catalogs.filter_for(params.kind));
        self.navigator.clear();
        self.results.log(format!(
            "Connected to {} at {} in {} ms",
            params.kind,
            params.locator(),
            latency.as_millis()
        ));
        self.reload_catalogs().await;
        Ok(latency)
    }

    pub async fn disconnect(&mut self) -> Result<(), ConnectionManagerError> {
        self.navigator.clear();
        self.manager.disconnect().await
    }

    /// Rebuilds the root level of the tree. Returns the number of catalogs
    /// shown, or `None` when the listing failed.
    pub async fn reload_catalogs(&mut self) -> Option<usize> {
        let result = match self.manager.connection_mut() {
            Ok(connection) => self
                .navigator
                .reload(connection)
                .await
                .map_err(|error| error.to_string()),
            Err(error) => Err(error.to_string()),
        };

        match result {
            Ok(count) => Some(count),
            Err(error) => {
                warn!(%error, "catalog listing failed");
                self.results
                    .show_error(format!("Failed to load databases: {error}"));
                None
            }
        }
    }

    /// Root reloads, a catalog expands, a table is a leaf.
    pub async fn expand_node(&mut self, id: &NodeId) {
        match id {
            NodeId::Root => {
                self.reload_catalogs().await;
            }
            NodeId::Catalog { catalog } => self.expand_catalog(catalog).await,
            NodeId::Table { .. } => {}
        }
    }

    async fn expand_catalog(&mut self, catalog: &str) {
        let result = match self.manager.connection_mut() {
            Ok(connection) => self
                .navigator
                .expand(connection, catalog)
                .await
                .map_err(|error| error.to_string()),
            Err(error) => Err(error.to_string()),
        };

        match result {
            Ok(ExpandOutcome::Expanded { tables }) => {
                info!(%catalog, tables, "tables loaded");
            }
            Ok(ExpandOutcome::AlreadyExpanded) => {}
            Err(error) => {
                warn!(%catalog, %error, "table listing failed");
                self.results
                    .show_error(format!("Failed to load tables: {error}"));
            }
        }
    }

    /// Activates a node the way the navigator's Enter key does: tables run a
    /// bounded preview, everything else expands.
    pub async fn select_node(&mut self, id: &NodeId) {
        let NodeId::Table { catalog, table } = id else {
            self.expand_node(id).await;
            return;
        };

        if let Ok(connection) = self.manager.connection_mut() {
            if let Err(error) = self.navigator.activate(connection, catalog).await {
                warn!(%catalog, %error, "switching catalog failed");
                self.results
                    .show_error(format!("Query execution failed: {error}"));
                return;
            }
        }

        self.editor_text = self.runner.preview_sql(table);
        self.run_editor().await;
    }

    /// Replaces the editor text with `sql` and runs it.
    pub async fn execute(&mut self, sql: impl Into<String>) {
        self.editor_text = sql.into();
        self.run_editor().await;
    }

    pub async fn run_editor(&mut self) {
        let sql = self.editor_text.clone();
        let outcome = match self.manager.connection_mut() {
            Ok(connection) => self.runner.run(connection, &sql).await,
            Err(error) => {
                self.results
                    .show_error(format!("Query execution failed: {error}"));
                return;
            }
        };

        match outcome {
            Ok(QueryOutcome::Rows { grid, elapsed }) => {
                let rows = grid.row_count();
                self.results.show_grid(grid);
                self.results
                    .log(format!("{rows} rows in {} ms", elapsed.as_millis()));
            }
            Ok(QueryOutcome::Affected {
                rows,
                schema_changed,
                ..
            }) => {
                self.results.show_message(format!(
                    "Query executed successfully. Rows affected: {rows}"
                ));
                if schema_changed {
                    self.reload_catalogs().await;
                }
            }
            Err(QueryRunnerError::EmptyQuery) => {
                self.results.show_error(QueryRunnerError::EmptyQuery);
            }
            Err(QueryRunnerError::Backend(error)) => {
                warn!(%error, "statement failed");
                self.results
                    .show_error(format!("Query execution failed: {error}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::Session;
    use crate::catalog_navigator::NodeId;
    use crate::connection_manager::{ConnectionParams, DatabaseKind};
    use crate::fake_driver::{FakeBackend, FakeState};
    use crate::results::{CellValue, ResultSurface};
    use crate::settings::Settings;

    fn mysql_params() -> ConnectionParams {
        let mut params = ConnectionParams::new(DatabaseKind::MySql, "localhost");
        params.username = "root".to_string();
        params
    }

    async fn connected_session(state: std::sync::Arc<FakeState>) -> Session<FakeBackend> {
        let mut session = Session::new(FakeBackend::new(state), &Settings::default());
        session
            .connect(&mysql_params())
            .await
            .expect("connect should succeed");
        session
    }

    fn shop_state() -> std::sync::Arc<FakeState> {
        FakeState::with_catalogs(&[
            ("mysql", &["user"]),
            ("shop", &["t", "orders"]),
            ("sys", &[]),
        ])
    }

    #[tokio::test]
    async fn connect_loads_filtered_catalogs() {
        let session = connected_session(shop_state()).await;

        assert!(session.is_connected());
        let names: Vec<_> = session
            .navigator()
            .catalogs()
            .iter()
            .map(|catalog| catalog.name.as_str())
            .collect();
        assert_eq!(names, vec!["shop"]);
        assert_eq!(session.results().active(), ResultSurface::Table);
    }

    #[tokio::test]
    async fn failed_connect_is_returned_not_logged() {
        let state = shop_state();
        state.fail_connect.store(true, Ordering::Relaxed);
        let mut session = Session::new(FakeBackend::new(state.clone()), &Settings::default());

        let err = session
            .connect(&mysql_params())
            .await
            .expect_err("connect should fail");

        assert_eq!(err.to_string(), "connection refused");
        assert!(session.results().messages().is_empty());
        assert_eq!(state.calls.list_catalogs.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn catalog_listing_failure_is_logged_after_connect() {
        let state = shop_state();
        state.fail_list_catalogs.store(true, Ordering::Relaxed);
        let session = connected_session(state).await;

        assert!(session.is_connected());
        assert!(session.navigator().catalogs().is_empty());
        assert_eq!(session.results().active(), ResultSurface::Messages);
        assert_eq!(
            session.results().messages().last(),
            Some("ERROR: Failed to load databases: metadata unavailable")
        );
    }

    #[tokio::test]
    async fn selecting_a_table_previews_it() {
        let mut session = connected_session(shop_state()).await;

        session.expand_node(&NodeId::catalog("shop")).await;
        session.select_node(&NodeId::table("shop", "t")).await;

        assert_eq!(session.editor_text(), "SELECT * FROM t LIMIT 100;");
        let results = session.results();
        assert_eq!(results.active(), ResultSurface::Table);
        assert_eq!(results.grid().columns(), ["id".to_string()]);
        assert_eq!(results.grid().cell(1, 0), Some(&CellValue::Integer(2)));
        assert!(results
            .messages()
            .last()
            .is_some_and(|line| line.starts_with("2 rows in ")));
    }

    #[tokio::test]
    async fn preview_switches_back_after_a_typed_use() {
        let state = shop_state();
        let mut session = connected_session(state.clone()).await;
        session.expand_node(&NodeId::catalog("shop")).await;

        session.execute("USE mysql").await;
        assert_eq!(
            session.results().messages().last(),
            Some("Query executed successfully. Rows affected: 0")
        );
        session.select_node(&NodeId::table("shop", "t")).await;

        assert_eq!(state.calls.set_active_catalog.load(Ordering::Relaxed), 2);
        let results = session.results();
        assert_eq!(results.active(), ResultSurface::Table);
        assert_eq!(results.grid().row_count(), 2);
    }

    #[test]
    fn debug_output_includes_the_connection_manager() {
        let session = Session::new(FakeBackend::default(), &Settings::default());

        let rendered = format!("{session:?}");

        assert!(rendered.starts_with("Session {"));
        assert!(rendered.contains("manager: ConnectionManager"));
    }

    #[tokio::test]
    async fn expanding_a_catalog_twice_lists_tables_once() {
        let state = shop_state();
        let mut session = connected_session(state.clone()).await;

        session.select_node(&NodeId::catalog("shop")).await;
        session.expand_node(&NodeId::catalog("shop")).await;

        assert_eq!(state.calls.list_tables.load(Ordering::Relaxed), 1);
        assert_eq!(session.navigator().visible_nodes().len(), 4);
    }

    #[tokio::test]
    async fn failed_expand_reports_to_message_log() {
        let state = shop_state();
        let mut session = connected_session(state.clone()).await;
        state.fail_list_tables.store(true, Ordering::Relaxed);

        session.expand_node(&NodeId::catalog("shop")).await;

        assert_eq!(
            session.results().messages().last(),
            Some("ERROR: Failed to load tables: table listing failed")
        );
        assert_eq!(
            session.navigator().catalog("shop").map(|c| c.expanded),
            Some(false)
        );
    }

    #[tokio::test]
    async fn update_reports_affected_rows() {
        let state = shop_state();
        let mut session = connected_session(state.clone()).await;

        session.execute("update t set x=1").await;

        assert_eq!(session.results().active(), ResultSurface::Messages);
        assert_eq!(
            session.results().messages().last(),
            Some("Query executed successfully. Rows affected: 1")
        );
        assert_eq!(state.calls.list_catalogs.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn create_reloads_catalogs_once_on_success() {
        let state = shop_state();
        let mut session = connected_session(state.clone()).await;

        session.execute("CREATE TABLE audit (id INT)").await;

        assert_eq!(state.calls.list_catalogs.load(Ordering::Relaxed), 2);
        assert_eq!(session.results().active(), ResultSurface::Messages);
    }

    #[tokio::test]
    async fn create_does_not_reload_on_failure() {
        let state = shop_state();
        let mut session = connected_session(state.clone()).await;
        state.fail_execute.store(true, Ordering::Relaxed);

        session.execute("CREATE TABLE audit (id INT)").await;

        assert_eq!(state.calls.list_catalogs.load(Ordering::Relaxed), 1);
        assert_eq!(
            session.results().messages().last(),
            Some("ERROR: Query execution failed: permission denied")
        );
    }

    #[tokio::test]
    async fn invalid_sql_keeps_previous_grid() {
        let mut session = connected_session(shop_state()).await;
        session.execute("select * from t").await;
        let grid_before = session.results().grid().clone();

        session.execute("not sql").await;

        let results = session.results();
        assert_eq!(results.active(), ResultSurface::Messages);
        assert_eq!(results.grid(), &grid_before);
        assert!(results
            .messages()
            .last()
            .is_some_and(|line| line.starts_with("ERROR: ")));
    }

    #[tokio::test]
    async fn blank_editor_asks_for_a_query() {
        let state = shop_state();
        let mut session = connected_session(state.clone()).await;

        session.execute("   ").await;

        assert_eq!(
            session.results().messages().last(),
            Some("ERROR: Please enter a query")
        );
        assert_eq!(state.calls.queries.load(Ordering::Relaxed), 0);
        assert_eq!(state.calls.executes.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn running_without_connection_reports_error() {
        let mut session = Session::new(FakeBackend::default(), &Settings::default());

        session.execute("select 1").await;

        assert_eq!(
            session.results().messages().last(),
            Some("ERROR: Query execution failed: not connected to a database")
        );
    }

    #[tokio::test]
    async fn configured_denylist_replaces_builtin_one() {
        let mut settings = Settings::default();
        settings.system_catalogs.mysql = Some(vec!["shop".to_string()]);
        let mut session = Session::new(FakeBackend::new(shop_state()), &settings);

        session.connect(&mysql_params()).await.expect("connect");

        let names: Vec<_> = session
            .navigator()
            .catalogs()
            .iter()
            .map(|catalog| catalog.name.clone())
            .collect();
        assert_eq!(names, vec!["mysql".to_string(), "sys".to_string()]);
    }
}
