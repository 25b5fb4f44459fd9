//! Component graph - static analysis of JavaScript and TypeScript UI code
//!
//! This library walks a source tree, detects UI components with
//! tree-sitter, and loads files, components, hooks and their relationships
//! into a graph store.

pub mod core;
pub mod languages;
pub mod storage;

pub use crate::core::config::{Backend, Config};
pub use crate::core::context::{RunCounters, RunSummary};
pub use crate::core::graph::GraphLoader;
pub use crate::core::parser::CodeParser;
pub use crate::core::{analyze_file, index_project, FileOutcome};
pub use crate::languages::LanguageRegistry;
pub use crate::storage::{GraphStore, Neo4jStore, SqliteStore, StoreError};
