//! Graph storage backends
//!
//! The pipeline writes through the [`GraphStore`] trait. Two backends exist:
//! a Neo4j server reached over its HTTP transaction endpoint, and an
//! SQLite file that models the same labels and relationship types as tables.

pub mod error;
pub mod models;
pub mod neo4j;
pub mod sqlite;

pub use error::StoreError;
pub use neo4j::Neo4jStore;
pub use sqlite::SqliteStore;

use models::{ComponentRecord, FileRecord, GraphStats, ImportRecord};

/// A uniqueness constraint or lookup index the graph needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaItem {
    Unique {
        label: &'static str,
        property: &'static str,
    },
    Index {
        label: &'static str,
        property: &'static str,
    },
}

impl SchemaItem {
    /// Stable name used when creating the item
    pub fn name(&self) -> String {
        match self {
            SchemaItem::Unique { label, property } => {
                format!("{}_{}_unique", label.to_lowercase(), property.to_lowercase())
            }
            SchemaItem::Index { label, property } => {
                format!("{}_{}_index", label.to_lowercase(), property.to_lowercase())
            }
        }
    }
}

/// Constraints first, then lookup indexes
pub const SCHEMA: &[SchemaItem] = &[
    SchemaItem::Unique {
        label: "File",
        property: "path",
    },
    SchemaItem::Unique {
        label: "Component",
        property: "id",
    },
    SchemaItem::Index {
        label: "Component",
        property: "name",
    },
    SchemaItem::Index {
        label: "Component",
        property: "componentType",
    },
    SchemaItem::Index {
        label: "Component",
        property: "complexity",
    },
    SchemaItem::Index {
        label: "File",
        property: "extension",
    },
];

/// Sink for the component graph.
///
/// Node writes are upserts keyed on `File.path`, `Component.id` and
/// `Hook.name`. Relationship writes only happen when both endpoints
/// already exist and never duplicate an edge of the same type between the
/// same endpoints; they return `false` when an endpoint was missing.
#[allow(async_fn_in_trait)]
pub trait GraphStore {
    /// Human readable endpoint, for logs
    fn endpoint(&self) -> String;

    /// Fails with [`StoreError::Connection`] when the store is unreachable
    async fn verify_connectivity(&self) -> Result<(), StoreError>;

    /// Delete every node and relationship
    async fn clear(&self) -> Result<(), StoreError>;

    /// Create one constraint or index; [`StoreError::AlreadyExists`] when present
    async fn apply_schema(&self, item: &SchemaItem) -> Result<(), StoreError>;

    async fn upsert_file(&self, file: &FileRecord) -> Result<(), StoreError>;

    /// Upsert the component and the `CONTAINS` edge from its owning file
    async fn upsert_component(&self, component: &ComponentRecord) -> Result<(), StoreError>;

    async fn merge_import(
        &self,
        from: &str,
        to: &str,
        import: &ImportRecord,
    ) -> Result<bool, StoreError>;

    async fn merge_renders(&self, source_id: &str, target_id: &str) -> Result<bool, StoreError>;

    /// Merge the `Hook` node and the `USES_HOOK` edge to it
    async fn merge_hook_usage(&self, component_id: &str, hook: &str) -> Result<bool, StoreError>;

    async fn stats(&self) -> Result<GraphStats, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names_are_unique() {
        let mut names: Vec<String> = SCHEMA.iter().map(|s| s.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), SCHEMA.len());
        assert_eq!(SCHEMA[0].name(), "file_path_unique");
        assert_eq!(SCHEMA[3].name(), "component_componenttype_index");
    }
}
