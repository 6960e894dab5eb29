use sqlnav_adapters::postgres::PostgresBackend;
use sqlnav_core::catalog_navigator::CatalogBackend;
use sqlnav_core::connection_manager::{ConnectionBackend, ConnectionParams, DatabaseKind};
use sqlnav_core::query_runner::{QueryBackend, RETURNED_ROWS_MESSAGE};
use sqlnav_core::results::CellValue;

fn postgres_integration_enabled() -> bool {
    matches!(
        std::env::var("SQLNAV_RUN_POSTGRES_INTEGRATION").ok().as_deref(),
        Some("1")
    )
}

fn integration_params() -> ConnectionParams {
    let host =
        std::env::var("SQLNAV_TEST_POSTGRES_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let mut params = ConnectionParams::new(DatabaseKind::PostgreSql, host);
    if let Ok(port) = std::env::var("SQLNAV_TEST_POSTGRES_PORT") {
        params.port = port;
    }
    params.username =
        std::env::var("SQLNAV_TEST_POSTGRES_USER").unwrap_or_else(|_| "postgres".to_string());
    params.password = std::env::var("SQLNAV_TEST_POSTGRES_PASSWORD").unwrap_or_default();
    params
}

#[tokio::test(flavor = "current_thread")]
async fn postgres_backend_catalog_and_statement_paths() {
    if !postgres_integration_enabled() {
        return;
    }

    let backend = PostgresBackend;
    let mut connection = backend
        .connect(&integration_params())
        .await
        .expect("connect should succeed");

    let catalogs = connection.list_catalogs().await.expect("list catalogs");
    assert!(!catalogs.iter().any(|name| name == "template0"));
    assert!(catalogs.iter().any(|name| name == "postgres"));

    connection
        .set_active_catalog("postgres")
        .await
        .expect("switch database");
    connection
        .execute("DROP SCHEMA IF EXISTS sqlnav_it CASCADE")
        .await
        .expect("drop schema");
    connection
        .execute("CREATE SCHEMA sqlnav_it")
        .await
        .expect("create schema");
    connection
        .execute("CREATE TABLE sqlnav_it.users (id INT PRIMARY KEY, email TEXT, score NUMERIC)")
        .await
        .expect("create table");
    connection
        .execute("CREATE VIEW sqlnav_it.user_ids AS SELECT id FROM sqlnav_it.users")
        .await
        .expect("create view");
    let inserted = connection
        .execute("INSERT INTO sqlnav_it.users VALUES (1, 'a@example.com', 1.50), (2, NULL, NULL)")
        .await
        .expect("insert rows");
    assert_eq!(inserted, 2);

    let err = connection
        .execute("SHOW server_version")
        .await
        .expect_err("show returns rows");
    assert_eq!(err.message(), RETURNED_ROWS_MESSAGE);

    let tables = connection.list_tables("postgres").await.expect("list tables");
    assert!(tables.iter().any(|name| name == "sqlnav_it.users"));
    assert!(!tables.iter().any(|name| name == "sqlnav_it.user_ids"));

    let grid = connection
        .query("SELECT id, email, score FROM sqlnav_it.users ORDER BY id")
        .await
        .expect("query rows");
    assert_eq!(grid.cell(0, 0), Some(&CellValue::Integer(1)));
    assert_eq!(grid.cell(0, 2), Some(&CellValue::Text("1.50".to_string())));
    assert_eq!(grid.cell(1, 1), Some(&CellValue::Null));

    connection
        .execute("DROP SCHEMA sqlnav_it CASCADE")
        .await
        .expect("cleanup schema");
    backend.close(connection).await.expect("close");
}
