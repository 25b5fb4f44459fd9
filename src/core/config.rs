//! Configuration management for component-graph
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables. CLI flags are applied last by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Graph store configuration
    pub graph: GraphConfig,

    /// Source scan configuration
    pub scan: ScanConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Which graph store to write to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Neo4j,
    Sqlite,
}

impl std::str::FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "neo4j" => Ok(Backend::Neo4j),
            "sqlite" => Ok(Backend::Sqlite),
            other => anyhow::bail!("Unknown graph backend '{}'", other),
        }
    }
}

/// Graph store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub backend: Backend,

    /// Neo4j HTTP endpoint
    pub uri: String,

    pub username: String,

    pub password: String,

    /// Neo4j database name
    pub database: String,

    /// Request timeout for every store call
    pub timeout_secs: u64,

    /// Database file for the sqlite backend
    pub sqlite_path: PathBuf,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Neo4j,
            uri: "http://localhost:7474".to_string(),
            username: "neo4j".to_string(),
            password: "password".to_string(),
            database: "neo4j".to_string(),
            timeout_secs: 30,
            sqlite_path: PathBuf::from("component-graph.db"),
        }
    }
}

/// Source scan configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory to scan
    pub root: PathBuf,

    /// Parallel analysis workers
    pub workers: usize,

    /// Directory names skipped in addition to the built-in list
    pub extra_excluded_dirs: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("src"),
            workers: 8,
            extra_excluded_dirs: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, compact, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Defaults, then the optional file, then the process environment
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from environment variables looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("NEO4J_URI") {
            self.graph.uri = v;
        }
        if let Some(v) = lookup("NEO4J_USERNAME").or_else(|| lookup("NEO4J_USER")) {
            self.graph.username = v;
        }
        if let Some(v) = lookup("NEO4J_PASSWORD") {
            self.graph.password = v;
        }
        if let Some(v) = lookup("NEO4J_DATABASE") {
            self.graph.database = v;
        }
        if let Some(v) = lookup("COMPONENT_GRAPH_BACKEND") {
            self.graph.backend = v.parse()?;
        }
        if let Some(v) = lookup("COMPONENT_GRAPH_ROOT") {
            self.scan.root = PathBuf::from(v);
        }
        Ok(())
    }
}
