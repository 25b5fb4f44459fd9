//! Neo4j graph store over the HTTP transaction endpoint
//!
//! Every write is one auto-committed transaction
//! (`POST {uri}/db/{database}/tx/commit`) holding a single Cypher statement.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::error::StoreError;
use super::models::{ComponentRecord, FileRecord, GraphStats, ImportRecord};
use super::{GraphStore, SchemaItem};
use crate::core::config::GraphConfig;

/// Client for a Neo4j server
pub struct Neo4jStore {
    client: reqwest::Client,
    base_uri: String,
    commit_url: String,
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct TxRequest<'a> {
    statements: Vec<TxStatement<'a>>,
}

#[derive(Debug, Serialize)]
struct TxStatement<'a> {
    statement: &'a str,
    parameters: Value,
}

#[derive(Debug, Default, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Default, Deserialize)]
struct TxResult {
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    #[serde(default)]
    row: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

impl Neo4jStore {
    /// Build a client; no request is sent until [`GraphStore::verify_connectivity`]
    pub fn new(config: &GraphConfig) -> Result<Self, StoreError> {
        let base_uri = config.uri.trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Connection {
                endpoint: base_uri.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            commit_url: format!("{}/db/{}/tx/commit", base_uri, config.database),
            client,
            base_uri,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Run one statement and return the rows of its result
    async fn run(&self, statement: &str, parameters: Value) -> Result<Vec<Vec<Value>>, StoreError> {
        let request = TxRequest {
            statements: vec![TxStatement {
                statement,
                parameters,
            }],
        };

        let response = self
            .client
            .post(&self.commit_url)
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;

        let status = response.status();
        let body: TxResponse = if status.is_success() {
            response.json().await.map_err(|e| self.connection_error(e))?
        } else {
            // Auth failures and routing errors still carry an `errors` array
            let text = response.text().await.map_err(|e| self.connection_error(e))?;
            let parsed: TxResponse = serde_json::from_str(&text).unwrap_or_default();
            if parsed.errors.is_empty() {
                return Err(StoreError::Connection {
                    endpoint: self.base_uri.clone(),
                    message: format!("HTTP {}: {}", status, text),
                });
            }
            parsed
        };

        if let Some(err) = body.errors.into_iter().next() {
            return Err(classify_error(&self.base_uri, err));
        }

        Ok(body
            .results
            .into_iter()
            .next()
            .map(|r| r.data.into_iter().map(|d| d.row).collect())
            .unwrap_or_default())
    }

    /// Run a statement whose single row is `count(..)`
    async fn run_count(&self, statement: &str, parameters: Value) -> Result<u64, StoreError> {
        let rows = self.run(statement, parameters).await?;
        Ok(rows
            .first()
            .and_then(|row| row.first())
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    fn connection_error(&self, err: reqwest::Error) -> StoreError {
        StoreError::Connection {
            endpoint: self.base_uri.clone(),
            message: err.to_string(),
        }
    }
}

/// Map a Neo4j status code to the store error taxonomy
fn classify_error(endpoint: &str, err: TxError) -> StoreError {
    if err.code.ends_with("AlreadyExists") || err.message.contains("already exists") {
        StoreError::AlreadyExists(err.message)
    } else if err.code.starts_with("Neo.ClientError.Security")
        || err.code.starts_with("Neo.TransientError.General.DatabaseUnavailable")
    {
        StoreError::Connection {
            endpoint: endpoint.to_string(),
            message: format!("{}: {}", err.code, err.message),
        }
    } else {
        StoreError::Statement {
            code: err.code,
            message: err.message,
        }
    }
}

/// Cypher for one schema item. No `IF NOT EXISTS`: re-runs report the item as existing.
pub(crate) fn schema_cypher(item: &SchemaItem) -> String {
    match item {
        SchemaItem::Unique { label, property } => format!(
            "CREATE CONSTRAINT {} FOR (n:{}) REQUIRE n.{} IS UNIQUE",
            item.name(),
            label,
            property
        ),
        SchemaItem::Index { label, property } => format!(
            "CREATE INDEX {} FOR (n:{}) ON (n.{})",
            item.name(),
            label,
            property
        ),
    }
}

const CLEAR: &str = "MATCH (n) DETACH DELETE n";

const UPSERT_FILE: &str = r#"
MERGE (f:File {path: $path})
SET f.name = $name,
    f.extension = $extension,
    f.language = $language,
    f.size = $size,
    f.lastModified = $lastModified,
    f.contentHash = $contentHash
"#;

/// The component is written even when its file node is missing; only `CONTAINS` needs the file
const UPSERT_COMPONENT: &str = r#"
MERGE (c:Component {id: $id})
SET c.name = $name,
    c.file = $file,
    c.componentType = $componentType,
    c.props = $props,
    c.hooks = $hooks,
    c.loc = $loc,
    c.startLine = $startLine,
    c.endLine = $endLine,
    c.complexity = $complexity,
    c.lastModified = $lastModified
WITH c
MATCH (f:File {path: $file})
MERGE (f)-[:CONTAINS]->(c)
"#;

const MERGE_IMPORT: &str = r#"
MATCH (a:File {path: $from}), (b:File {path: $to})
MERGE (a)-[r:IMPORTS]->(b)
SET r.name = $name, r.type = $type
RETURN count(r)
"#;

const MERGE_RENDERS: &str = r#"
MATCH (s:Component {id: $source}), (t:Component {id: $target})
MERGE (s)-[r:RENDERS]->(t)
RETURN count(r)
"#;

const MERGE_HOOK_USAGE: &str = r#"
MATCH (c:Component {id: $component})
MERGE (h:Hook {name: $hook})
MERGE (c)-[r:USES_HOOK]->(h)
RETURN count(r)
"#;

impl GraphStore for Neo4jStore {
    fn endpoint(&self) -> String {
        self.base_uri.clone()
    }

    async fn verify_connectivity(&self) -> Result<(), StoreError> {
        // The server answering with any error still means the probe failed
        self.run("RETURN 1", json!({}))
            .await
            .map(|_| ())
            .map_err(|e| match e {
                StoreError::Connection { .. } => e,
                other => StoreError::Connection {
                    endpoint: self.base_uri.clone(),
                    message: other.to_string(),
                },
            })
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.run(CLEAR, json!({})).await?;
        Ok(())
    }

    async fn apply_schema(&self, item: &SchemaItem) -> Result<(), StoreError> {
        let cypher = schema_cypher(item);
        debug!("Applying schema: {}", cypher);
        self.run(&cypher, json!({})).await?;
        Ok(())
    }

    async fn upsert_file(&self, file: &FileRecord) -> Result<(), StoreError> {
        self.run(
            UPSERT_FILE,
            json!({
                "path": file.path,
                "name": file.name,
                "extension": file.extension,
                "language": file.language,
                "size": file.size,
                "lastModified": file.last_modified.to_rfc3339(),
                "contentHash": file.content_hash,
            }),
        )
        .await?;
        Ok(())
    }

    async fn upsert_component(&self, component: &ComponentRecord) -> Result<(), StoreError> {
        self.run(
            UPSERT_COMPONENT,
            json!({
                "id": component.id,
                "name": component.name,
                "file": component.file,
                "componentType": component.component_type.as_str(),
                "props": component.props,
                "hooks": component.hooks,
                "loc": component.loc,
                "startLine": component.start_line,
                "endLine": component.end_line,
                "complexity": component.complexity,
                "lastModified": component.last_modified.to_rfc3339(),
            }),
        )
        .await?;
        Ok(())
    }

    async fn merge_import(
        &self,
        from: &str,
        to: &str,
        import: &ImportRecord,
    ) -> Result<bool, StoreError> {
        let n = self
            .run_count(
                MERGE_IMPORT,
                json!({
                    "from": from,
                    "to": to,
                    "name": import.local,
                    "type": import.kind.as_str(),
                }),
            )
            .await?;
        Ok(n > 0)
    }

    async fn merge_renders(&self, source_id: &str, target_id: &str) -> Result<bool, StoreError> {
        let n = self
            .run_count(
                MERGE_RENDERS,
                json!({ "source": source_id, "target": target_id }),
            )
            .await?;
        Ok(n > 0)
    }

    async fn merge_hook_usage(&self, component_id: &str, hook: &str) -> Result<bool, StoreError> {
        let n = self
            .run_count(
                MERGE_HOOK_USAGE,
                json!({ "component": component_id, "hook": hook }),
            )
            .await?;
        Ok(n > 0)
    }

    async fn stats(&self) -> Result<GraphStats, StoreError> {
        let node = |label: &str| format!("MATCH (n:{}) RETURN count(n)", label);
        let rel = |kind: &str| format!("MATCH ()-[r:{}]->() RETURN count(r)", kind);

        Ok(GraphStats {
            files: self.run_count(&node("File"), json!({})).await?,
            components: self.run_count(&node("Component"), json!({})).await?,
            hooks: self.run_count(&node("Hook"), json!({})).await?,
            contains: self.run_count(&rel("CONTAINS"), json!({})).await?,
            imports: self.run_count(&rel("IMPORTS"), json!({})).await?,
            renders: self.run_count(&rel("RENDERS"), json!({})).await?,
            uses_hook: self.run_count(&rel("USES_HOOK"), json!({})).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SCHEMA;

    fn tx_error(code: &str, message: &str) -> TxError {
        TxError {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_component_upsert_does_not_depend_on_file() {
        let merge = UPSERT_COMPONENT.find("MERGE (c:Component").unwrap();
        let set = UPSERT_COMPONENT.find("SET c.name").unwrap();
        let file = UPSERT_COMPONENT.find("MATCH (f:File").unwrap();
        let contains = UPSERT_COMPONENT.find("MERGE (f)-[:CONTAINS]->(c)").unwrap();
        assert!(merge < set && set < file && file < contains);
        assert!(UPSERT_COMPONENT[set..file].contains("WITH c"));
    }

    #[test]
    fn test_schema_cypher() {
        assert_eq!(
            schema_cypher(&SCHEMA[1]),
            "CREATE CONSTRAINT component_id_unique FOR (n:Component) REQUIRE n.id IS UNIQUE"
        );
        assert_eq!(
            schema_cypher(&SCHEMA[5]),
            "CREATE INDEX file_extension_index FOR (n:File) ON (n.extension)"
        );
    }

    #[test]
    fn test_classify_already_exists() {
        let err = classify_error(
            "http://localhost:7474",
            tx_error(
                "Neo.ClientError.Schema.EquivalentSchemaRuleAlreadyExists",
                "An equivalent constraint already exists",
            ),
        );
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_classify_auth_failure_is_fatal() {
        let err = classify_error(
            "http://localhost:7474",
            tx_error("Neo.ClientError.Security.Unauthorized", "bad credentials"),
        );
        assert!(err.is_connection());
    }

    #[test]
    fn test_classify_other_errors() {
        let err = classify_error(
            "http://localhost:7474",
            tx_error("Neo.ClientError.Statement.SyntaxError", "Invalid input"),
        );
        assert!(matches!(err, StoreError::Statement { .. }));
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"results":[{"columns":["count(r)"],"data":[{"row":[3],"meta":[null]}]}],"errors":[]}"#;
        let parsed: TxResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.results[0].data[0].row[0], json!(3));
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn test_commit_url() {
        let config = GraphConfig {
            uri: "http://db.local:7474/".to_string(),
            ..GraphConfig::default()
        };
        let store = Neo4jStore::new(&config).unwrap();
        assert_eq!(store.commit_url, "http://db.local:7474/db/neo4j/tx/commit");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let config = GraphConfig {
            uri: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            ..GraphConfig::default()
        };
        let store = Neo4jStore::new(&config).unwrap();
        let err = store.verify_connectivity().await.unwrap_err();
        assert!(err.is_connection());
    }
}
