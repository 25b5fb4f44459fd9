//! SQLite graph store
//!
//! Labels map to tables (`files`, `components`, `hooks`) and every
//! relationship lives in `edges`, keyed on `(kind, source, target)`.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::error::StoreError;
use super::models::{
    ComponentRecord, ComponentType, FileRecord, GraphStats, ImportRecord, RelationKind,
};
use super::{GraphStore, SchemaItem};

/// SQLite database wrapper
pub struct SqliteStore {
    conn: Connection,
    endpoint: String,
}

impl SqliteStore {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let endpoint = path.display().to_string();
        let conn = Connection::open(path).map_err(|e| StoreError::Connection {
            endpoint: endpoint.clone(),
            message: e.to_string(),
        })?;
        let store = Self { conn, endpoint };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn,
            endpoint: ":memory:".to_string(),
        };
        store.init_tables()?;
        Ok(store)
    }

    /// Tables only; constraints and indexes come from [`GraphStore::apply_schema`]
    fn init_tables(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS files (
                path TEXT NOT NULL,
                name TEXT NOT NULL,
                extension TEXT NOT NULL,
                language TEXT NOT NULL,
                size INTEGER NOT NULL,
                last_modified TEXT NOT NULL,
                content_hash TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS components (
                id TEXT NOT NULL,
                name TEXT NOT NULL,
                file TEXT NOT NULL,
                component_type TEXT NOT NULL,
                props TEXT NOT NULL,
                hooks TEXT NOT NULL,
                loc INTEGER NOT NULL,
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                complexity INTEGER NOT NULL,
                last_modified TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS hooks (
                name TEXT PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS edges (
                kind TEXT NOT NULL,
                source TEXT NOT NULL,
                target TEXT NOT NULL,
                attributes TEXT,
                PRIMARY KEY (kind, source, target)
            );
            "#,
        )?;
        Ok(())
    }

    /// All edges of one kind as `(source, target, attributes)`, sorted
    pub fn edges(
        &self,
        kind: RelationKind,
    ) -> Result<Vec<(String, String, Option<String>)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT source, target, attributes FROM edges WHERE kind = ?1 ORDER BY source, target",
        )?;
        let rows = stmt.query_map(params![kind.as_str()], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// All file paths, sorted
    pub fn file_paths(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT path FROM files ORDER BY path")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Look up a component by id
    pub fn component(&self, id: &str) -> Result<Option<ComponentRecord>, StoreError> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, name, file, component_type, props, hooks, loc,
                       start_line, end_line, complexity, last_modified
                FROM components WHERE id = ?1
                "#,
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, u32>(6)?,
                        row.get::<_, u32>(7)?,
                        row.get::<_, u32>(8)?,
                        row.get::<_, u32>(9)?,
                        row.get::<_, String>(10)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, name, file, ctype, props, hooks, loc, start, end, complexity, modified)) =
            row
        else {
            return Ok(None);
        };

        let component_type: ComponentType =
            serde_json::from_value(serde_json::Value::String(ctype))?;
        let last_modified = chrono::DateTime::parse_from_rfc3339(&modified)
            .map_err(|e| StoreError::Statement {
                code: "timestamp".to_string(),
                message: e.to_string(),
            })?
            .with_timezone(&chrono::Utc);

        Ok(Some(ComponentRecord {
            id,
            name,
            file,
            component_type,
            props: serde_json::from_str(&props)?,
            hooks: serde_json::from_str(&hooks)?,
            loc,
            start_line: start,
            end_line: end,
            complexity,
            last_modified,
        }))
    }

    fn count(&self, sql: &str) -> Result<u64, StoreError> {
        let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n as u64)
    }

    fn count_edges(&self, kind: RelationKind) -> Result<u64, StoreError> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM edges WHERE kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }
}

/// Map a graph label to its table
fn table_for(label: &str) -> &'static str {
    match label {
        "File" => "files",
        "Hook" => "hooks",
        _ => "components",
    }
}

/// Map a camelCase property to its column
fn column_for(property: &str) -> String {
    let mut column = String::with_capacity(property.len() + 4);
    for c in property.chars() {
        if c.is_ascii_uppercase() {
            column.push('_');
            column.push(c.to_ascii_lowercase());
        } else {
            column.push(c);
        }
    }
    column
}

/// SQL for one schema item. No `IF NOT EXISTS`: re-runs report the item as existing.
pub(crate) fn schema_sql(item: &SchemaItem) -> String {
    match item {
        SchemaItem::Unique { label, property } => format!(
            "CREATE UNIQUE INDEX {} ON {}({})",
            item.name(),
            table_for(label),
            column_for(property)
        ),
        SchemaItem::Index { label, property } => format!(
            "CREATE INDEX {} ON {}({})",
            item.name(),
            table_for(label),
            column_for(property)
        ),
    }
}

fn classify_error(err: rusqlite::Error, item: &SchemaItem) -> StoreError {
    if err.to_string().contains("already exists") {
        StoreError::AlreadyExists(item.name())
    } else {
        StoreError::Sqlite(err)
    }
}

impl GraphStore for SqliteStore {
    fn endpoint(&self) -> String {
        format!("sqlite://{}", self.endpoint)
    }

    async fn verify_connectivity(&self) -> Result<(), StoreError> {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| StoreError::Connection {
                endpoint: self.endpoint.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            DELETE FROM edges;
            DELETE FROM hooks;
            DELETE FROM components;
            DELETE FROM files;
            "#,
        )?;
        Ok(())
    }

    async fn apply_schema(&self, item: &SchemaItem) -> Result<(), StoreError> {
        self.conn
            .execute(&schema_sql(item), [])
            .map_err(|e| classify_error(e, item))?;
        Ok(())
    }

    async fn upsert_file(&self, file: &FileRecord) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO files (path, name, extension, language, size, last_modified, content_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(path) DO UPDATE SET
                name = excluded.name,
                extension = excluded.extension,
                language = excluded.language,
                size = excluded.size,
                last_modified = excluded.last_modified,
                content_hash = excluded.content_hash
            "#,
            params![
                file.path,
                file.name,
                file.extension,
                file.language,
                file.size as i64,
                file.last_modified.to_rfc3339(),
                file.content_hash
            ],
        )?;
        Ok(())
    }

    async fn upsert_component(&self, component: &ComponentRecord) -> Result<(), StoreError> {
        let props = serde_json::to_string(&component.props)?;
        let hooks = serde_json::to_string(&component.hooks)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r#"
            INSERT INTO components (id, name, file, component_type, props, hooks, loc,
                                    start_line, end_line, complexity, last_modified)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                file = excluded.file,
                component_type = excluded.component_type,
                props = excluded.props,
                hooks = excluded.hooks,
                loc = excluded.loc,
                start_line = excluded.start_line,
                end_line = excluded.end_line,
                complexity = excluded.complexity,
                last_modified = excluded.last_modified
            "#,
            params![
                component.id,
                component.name,
                component.file,
                component.component_type.as_str(),
                props,
                hooks,
                component.loc,
                component.start_line,
                component.end_line,
                component.complexity,
                component.last_modified.to_rfc3339()
            ],
        )?;
        tx.execute(
            r#"
            INSERT INTO edges (kind, source, target, attributes)
            SELECT ?1, ?2, ?3, NULL
            WHERE EXISTS (SELECT 1 FROM files WHERE path = ?2)
            ON CONFLICT(kind, source, target) DO NOTHING
            "#,
            params![RelationKind::Contains.as_str(), component.file, component.id],
        )?;
        tx.commit()?;
        Ok(())
    }

    async fn merge_import(
        &self,
        from: &str,
        to: &str,
        import: &ImportRecord,
    ) -> Result<bool, StoreError> {
        let attributes = serde_json::json!({
            "name": import.local,
            "type": import.kind.as_str(),
        })
        .to_string();

        let changed = self.conn.execute(
            r#"
            INSERT INTO edges (kind, source, target, attributes)
            SELECT ?1, ?2, ?3, ?4
            WHERE EXISTS (SELECT 1 FROM files WHERE path = ?2)
              AND EXISTS (SELECT 1 FROM files WHERE path = ?3)
            ON CONFLICT(kind, source, target) DO UPDATE SET attributes = excluded.attributes
            "#,
            params![RelationKind::Imports.as_str(), from, to, attributes],
        )?;
        Ok(changed > 0)
    }

    async fn merge_renders(&self, source_id: &str, target_id: &str) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            r#"
            INSERT INTO edges (kind, source, target, attributes)
            SELECT ?1, ?2, ?3, NULL
            WHERE EXISTS (SELECT 1 FROM components WHERE id = ?2)
              AND EXISTS (SELECT 1 FROM components WHERE id = ?3)
            ON CONFLICT(kind, source, target) DO NOTHING
            "#,
            params![RelationKind::Renders.as_str(), source_id, target_id],
        )?;
        if changed > 0 {
            return Ok(true);
        }
        self.edge_exists(RelationKind::Renders, source_id, target_id)
    }

    async fn merge_hook_usage(&self, component_id: &str, hook: &str) -> Result<bool, StoreError> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM components WHERE id = ?1",
                params![component_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Ok(false);
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO hooks (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            params![hook],
        )?;
        tx.execute(
            r#"
            INSERT INTO edges (kind, source, target, attributes)
            VALUES (?1, ?2, ?3, NULL)
            ON CONFLICT(kind, source, target) DO NOTHING
            "#,
            params![RelationKind::UsesHook.as_str(), component_id, hook],
        )?;
        tx.commit()?;
        Ok(true)
    }

    async fn stats(&self) -> Result<GraphStats, StoreError> {
        Ok(GraphStats {
            files: self.count("SELECT COUNT(*) FROM files")?,
            components: self.count("SELECT COUNT(*) FROM components")?,
            hooks: self.count("SELECT COUNT(*) FROM hooks")?,
            contains: self.count_edges(RelationKind::Contains)?,
            imports: self.count_edges(RelationKind::Imports)?,
            renders: self.count_edges(RelationKind::Renders)?,
            uses_hook: self.count_edges(RelationKind::UsesHook)?,
        })
    }
}

impl SqliteStore {
    fn edge_exists(
        &self,
        kind: RelationKind,
        source: &str,
        target: &str,
    ) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM edges WHERE kind = ?1 AND source = ?2 AND target = ?3",
                params![kind.as_str(), source, target],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::ImportKind;
    use crate::storage::SCHEMA;

    async fn ready_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        for item in SCHEMA {
            store.apply_schema(item).await.unwrap();
        }
        store
    }

    fn file(path: &str) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            name: path.rsplit('/').next().unwrap().to_string(),
            extension: "js".to_string(),
            language: "javascript".to_string(),
            size: 10,
            last_modified: chrono::Utc::now(),
            content_hash: "abc".to_string(),
        }
    }

    fn component(name: &str, path: &str) -> ComponentRecord {
        ComponentRecord {
            id: format!("{}_{}", name, path),
            name: name.to_string(),
            file: path.to_string(),
            component_type: ComponentType::Component,
            props: vec!["title".to_string()],
            hooks: vec!["useState".to_string()],
            loc: 3,
            start_line: 1,
            end_line: 4,
            complexity: 1,
            last_modified: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_column_for() {
        assert_eq!(column_for("componentType"), "component_type");
        assert_eq!(column_for("path"), "path");
    }

    #[test]
    fn test_schema_sql() {
        assert_eq!(
            schema_sql(&SCHEMA[0]),
            "CREATE UNIQUE INDEX file_path_unique ON files(path)"
        );
        assert_eq!(
            schema_sql(&SCHEMA[3]),
            "CREATE INDEX component_componenttype_index ON components(component_type)"
        );
    }

    #[tokio::test]
    async fn test_schema_reports_existing_items() {
        let store = ready_store().await;
        let err = store.apply_schema(&SCHEMA[0]).await.unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = ready_store().await;
        store.upsert_file(&file("src/Foo.js")).await.unwrap();
        store.upsert_file(&file("src/Foo.js")).await.unwrap();
        let c = component("Foo", "src/Foo.js");
        store.upsert_component(&c).await.unwrap();
        store.upsert_component(&c).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.components, 1);
        assert_eq!(stats.contains, 1);

        let loaded = store.component(&c.id).unwrap().unwrap();
        assert_eq!(loaded.props, vec!["title"]);
        assert_eq!(loaded.hooks, vec!["useState"]);
        assert_eq!(loaded.component_type, ComponentType::Component);
    }

    #[tokio::test]
    async fn test_edges_require_both_endpoints() {
        let store = ready_store().await;
        store.upsert_file(&file("src/a.js")).await.unwrap();
        let import = ImportRecord {
            local: "B".to_string(),
            imported: "default".to_string(),
            source: "./b".to_string(),
            resolved: "src/b.js".to_string(),
            kind: ImportKind::Default,
        };
        assert!(!store.merge_import("src/a.js", "src/b.js", &import).await.unwrap());

        store.upsert_file(&file("src/b.js")).await.unwrap();
        assert!(store.merge_import("src/a.js", "src/b.js", &import).await.unwrap());
        assert!(store.merge_import("src/a.js", "src/b.js", &import).await.unwrap());

        let edges = store.edges(RelationKind::Imports).unwrap();
        assert_eq!(edges.len(), 1);
        assert!(edges[0].2.as_deref().unwrap().contains("\"type\":\"default\""));

        assert!(!store.merge_hook_usage("Missing_src/a.js", "useState").await.unwrap());
        assert_eq!(store.stats().await.unwrap().hooks, 0);
    }

    #[tokio::test]
    async fn test_component_without_file_has_no_contains() {
        let store = ready_store().await;
        store.upsert_component(&component("Orphan", "src/gone.js")).await.unwrap();

        assert!(store.component("Orphan_src/gone.js").unwrap().is_some());
        assert!(store.edges(RelationKind::Contains).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let store = ready_store().await;
        store.upsert_file(&file("src/Foo.js")).await.unwrap();
        store.upsert_component(&component("Foo", "src/Foo.js")).await.unwrap();
        store.merge_hook_usage("Foo_src/Foo.js", "useState").await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.stats().await.unwrap(), GraphStats::default());
    }
}
