use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::connection_manager::{BackendError, DatabaseKind};

/// Metadata half of the driver boundary.
#[async_trait]
pub trait CatalogBackend: Send {
    async fn list_catalogs(&mut self) -> Result<Vec<String>, BackendError>;
    /// Base tables only; views and synonyms are excluded.
    async fn list_tables(&mut self, catalog: &str) -> Result<Vec<String>, BackendError>;
    /// Switches the connection-wide active catalog.
    async fn set_active_catalog(&mut self, catalog: &str) -> Result<(), BackendError>;
}

const MYSQL_SYSTEM_CATALOGS: [&str; 4] =
    ["information_schema", "mysql", "performance_schema", "sys"];
const POSTGRES_SYSTEM_CATALOGS: [&str; 2] = ["template0", "template1"];
const SQLITE_SYSTEM_CATALOGS: [&str; 1] = ["temp"];

/// Catalog names hidden from the navigator, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemCatalogFilter {
    names: Vec<String>,
}

impl SystemCatalogFilter {
    #[must_use]
    pub fn for_kind(kind: DatabaseKind) -> Self {
        let names: &[&str] = match kind {
            DatabaseKind::MySql => &MYSQL_SYSTEM_CATALOGS,
            DatabaseKind::PostgreSql => &POSTGRES_SYSTEM_CATALOGS,
            DatabaseKind::Sqlite => &SQLITE_SYSTEM_CATALOGS,
        };
        Self::from_names(names.iter().copied())
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn is_system(&self, catalog: &str) -> bool {
        self.names
            .iter()
            .any(|name| name.eq_ignore_ascii_case(catalog))
    }
}

/// Addresses a tree node by kind, never by position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeId {
    Root,
    Catalog { catalog: String },
    Table { catalog: String, table: String },
}

impl NodeId {
    #[must_use]
    pub fn catalog(catalog: impl Into<String>) -> Self {
        Self::Catalog {
            catalog: catalog.into(),
        }
    }

    #[must_use]
    pub fn table(catalog: impl Into<String>, table: impl Into<String>) -> Self {
        Self::Table {
            catalog: catalog.into(),
            table: table.into(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Root => ROOT_LABEL,
            Self::Catalog { catalog } => catalog,
            Self::Table { table, .. } => table,
        }
    }
}

pub const ROOT_LABEL: &str = "Databases";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNode {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogNode {
    pub name: String,
    pub expanded: bool,
    pub tables: Vec<TableNode>,
}

impl CatalogNode {
    fn new(name: String) -> Self {
        Self {
            name,
            expanded: false,
            tables: Vec::new(),
        }
    }
}

/// One row of the flattened tree, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleNode {
    pub id: NodeId,
    pub depth: usize,
    /// `None` for leaves.
    pub expanded: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandOutcome {
    Expanded { tables: usize },
    AlreadyExpanded,
}

#[derive(Debug, Error)]
pub enum NavigatorError {
    #[error("unknown catalog `{0}`")]
    UnknownCatalog(String),
    #[error(transparent)]
    Backend(BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogNavigator {
    filter: SystemCatalogFilter,
    catalogs: Vec<CatalogNode>,
    active_catalog: Option<String>,
}

impl CatalogNavigator {
    #[must_use]
    pub fn new(filter: SystemCatalogFilter) -> Self {
        Self {
            filter,
            catalogs: Vec::new(),
            active_catalog: None,
        }
    }

    #[must_use]
    pub fn filter(&self) -> &SystemCatalogFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: SystemCatalogFilter) {
        self.filter = filter;
    }

    pub fn clear(&mut self) {
        self.catalogs.clear();
        self.active_catalog = None;
    }

    #[must_use]
    pub fn catalogs(&self) -> &[CatalogNode] {
        &self.catalogs
    }

    #[must_use]
    pub fn catalog(&self, name: &str) -> Option<&CatalogNode> {
        self.catalogs.iter().find(|node| node.name == name)
    }

    #[must_use]
    pub fn active_catalog(&self) -> Option<&str> {
        self.active_catalog.as_deref()
    }

    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        match id {
            NodeId::Root => true,
            NodeId::Catalog { catalog } => self.catalog(catalog).is_some(),
            NodeId::Table { catalog, table } => self
                .catalog(catalog)
                .is_some_and(|node| node.tables.iter().any(|t| &t.name == table)),
        }
    }

    /// Rebuilds the root level. The tree is cleared before the driver is asked,
    /// so a failed listing leaves it empty.
    pub async fn reload<C>(&mut self, connection: &mut C) -> Result<usize, NavigatorError>
    where
        C: CatalogBackend + ?Sized,
    {
        self.clear();
        let names = connection
            .list_catalogs()
            .await
            .map_err(NavigatorError::Backend)?;

        let mut seen = HashSet::new();
        for name in names {
            if self.filter.is_system(&name) {
                debug!(catalog = %name, "skipping system catalog");
                continue;
            }
            if seen.insert(name.clone()) {
                self.catalogs.push(CatalogNode::new(name));
            }
        }

        info!(catalogs = self.catalogs.len(), "catalogs loaded");
        Ok(self.catalogs.len())
    }

    /// Points the connection at `catalog`. The driver is always asked: typed
    /// statements such as `USE` can move the connection behind the tree's back.
    pub async fn activate<C>(
        &mut self,
        connection: &mut C,
        catalog: &str,
    ) -> Result<(), NavigatorError>
    where
        C: CatalogBackend + ?Sized,
    {
        if self.catalog(catalog).is_none() {
            return Err(NavigatorError::UnknownCatalog(catalog.to_string()));
        }

        connection
            .set_active_catalog(catalog)
            .await
            .map_err(NavigatorError::Backend)?;
        debug!(%catalog, "active catalog switched");
        self.active_catalog = Some(catalog.to_string());
        Ok(())
    }

    /// Fetches the tables of `catalog` once; later calls are no-ops.
    pub async fn expand<C>(
        &mut self,
        connection: &mut C,
        catalog: &str,
    ) -> Result<ExpandOutcome, NavigatorError>
    where
        C: CatalogBackend + ?Sized,
    {
        match self.catalog(catalog) {
            None => return Err(NavigatorError::UnknownCatalog(catalog.to_string())),
            Some(node) if node.expanded => return Ok(ExpandOutcome::AlreadyExpanded),
            Some(_) => {}
        }

        self.activate(connection, catalog).await?;
        let tables = connection
            .list_tables(catalog)
            .await
            .map_err(NavigatorError::Backend)?;

        let node = self
            .catalogs
            .iter_mut()
            .find(|node| node.name == catalog)
            .ok_or_else(|| NavigatorError::UnknownCatalog(catalog.to_string()))?;
        node.tables = tables.into_iter().map(|name| TableNode { name }).collect();
        node.expanded = true;

        info!(%catalog, tables = node.tables.len(), "catalog expanded");
        Ok(ExpandOutcome::Expanded {
            tables: node.tables.len(),
        })
    }

    #[must_use]
    pub fn visible_nodes(&self) -> Vec<VisibleNode> {
        let mut nodes = Vec::with_capacity(1 + self.catalogs.len());
        nodes.push(VisibleNode {
            id: NodeId::Root,
            depth: 0,
            expanded: Some(true),
        });

        for catalog in &self.catalogs {
            nodes.push(VisibleNode {
                id: NodeId::catalog(catalog.name.clone()),
                depth: 1,
                expanded: Some(catalog.expanded),
            });
            if catalog.expanded {
                nodes.extend(catalog.tables.iter().map(|table| VisibleNode {
                    id: NodeId::table(catalog.name.clone(), table.name.clone()),
                    depth: 2,
                    expanded: None,
                }));
            }
        }
        nodes
    }
}
