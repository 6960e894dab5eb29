pub mod catalog_navigator;
pub mod connection_manager;
pub mod query_runner;
pub mod results;
pub mod session;
pub mod settings;

#[cfg(test)]
mod fake_driver;

pub use catalog_navigator::{CatalogBackend, CatalogNavigator, NodeId, SystemCatalogFilter};
pub use connection_manager::{
    BackendError, ConnectionBackend, ConnectionManager, ConnectionParams, ConnectionStatus,
    DatabaseKind,
};
pub use query_runner::{QueryBackend, QueryRunner};
pub use results::{CellValue, ResultGrid, ResultSurface, ResultsView};
pub use session::{Session, SessionSnapshot};
pub use settings::Settings;
