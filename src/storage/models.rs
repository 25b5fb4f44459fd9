//! Data models for the component graph

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File node: one scanned source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Root-relative path with `/` separators (unique key)
    pub path: String,
    pub name: String,
    pub extension: String,
    pub language: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub content_hash: String,
}

/// Component node: a declaration classified as a UI component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    /// `name` + separator + owning file path
    pub id: String,
    pub name: String,
    /// Owning file path
    pub file: String,
    pub component_type: ComponentType,
    /// Destructured parameter names, in declaration order
    pub props: Vec<String>,
    /// Hook names called by the declaration, sorted and deduplicated
    pub hooks: Vec<String>,
    pub loc: u32,
    pub start_line: u32,
    pub end_line: u32,
    pub complexity: u32,
    pub last_modified: DateTime<Utc>,
}

/// Category inferred from path and name patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Page,
    App,
    Hook,
    Context,
    Common,
    Component,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Page => "page",
            ComponentType::App => "app",
            ComponentType::Hook => "hook",
            ComponentType::Context => "context",
            ComponentType::Common => "common",
            ComponentType::Component => "component",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an import binding was the default export or a named one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Default,
    Named,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Default => "default",
            ImportKind::Named => "named",
        }
    }
}

/// One imported binding of an import statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// Local binding name
    pub local: String,
    /// Exported name, `default` for default imports, `*` for namespace imports
    pub imported: String,
    /// Specifier as written in source
    pub source: String,
    /// Root-relative resolved path, or the specifier unchanged when external
    pub resolved: String,
    pub kind: ImportKind,
}

/// A capitalized template tag seen in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub component: String,
    pub file: String,
}

/// A hook call seen in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookCallRecord {
    pub hook: String,
    pub file: String,
}

/// Relationship types written to the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationKind {
    Contains,
    Imports,
    Renders,
    UsesHook,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Contains => "CONTAINS",
            RelationKind::Imports => "IMPORTS",
            RelationKind::Renders => "RENDERS",
            RelationKind::UsesHook => "USES_HOOK",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node and relationship counts held by a store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub files: u64,
    pub components: u64,
    pub hooks: u64,
    pub contains: u64,
    pub imports: u64,
    pub renders: u64,
    pub uses_hook: u64,
}

impl GraphStats {
    pub fn relationships(&self) -> u64 {
        self.contains + self.imports + self.renders + self.uses_hook
    }
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Nodes:")?;
        writeln!(f, "  File:      {}", self.files)?;
        writeln!(f, "  Component: {}", self.components)?;
        writeln!(f, "  Hook:      {}", self.hooks)?;
        writeln!(f, "Relationships:")?;
        writeln!(f, "  CONTAINS:  {}", self.contains)?;
        writeln!(f, "  IMPORTS:   {}", self.imports)?;
        writeln!(f, "  RENDERS:   {}", self.renders)?;
        write!(f, "  USES_HOOK: {}", self.uses_hook)
    }
}
