//! Run-scoped state: counters and the in-memory model of the scanned tree

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

use crate::core::relations::FileRelations;
use crate::storage::models::{ComponentRecord, FileRecord};

/// Analysis result for one file
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub file: FileRecord,
    pub components: Vec<ComponentRecord>,
    pub relations: FileRelations,
}

/// All analyzed files of one run
#[derive(Debug, Default)]
pub struct ProjectModel {
    pub files: Vec<FileAnalysis>,
}

impl ProjectModel {
    pub fn push(&mut self, analysis: FileAnalysis) {
        self.files.push(analysis);
    }

    /// Order files by path so loads are deterministic
    pub fn sort(&mut self) {
        self.files.sort_by(|a, b| a.file.path.cmp(&b.file.path));
    }

    /// Paths of every analyzed file
    pub fn file_paths(&self) -> HashSet<&str> {
        self.files.iter().map(|f| f.file.path.as_str()).collect()
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentRecord> {
        self.files.iter().flat_map(|f| f.components.iter())
    }

    /// Components grouped by name across the whole tree
    pub fn components_by_name(&self) -> HashMap<&str, Vec<&ComponentRecord>> {
        let mut index: HashMap<&str, Vec<&ComponentRecord>> = HashMap::new();
        for component in self.components() {
            index.entry(component.name.as_str()).or_default().push(component);
        }
        index
    }
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub components_found: usize,
    pub imports_found: usize,
    pub files_stored: usize,
    pub components_stored: usize,
    pub relationships_created: usize,
    pub write_failures: usize,
}

/// State owned by one pipeline run
#[derive(Debug)]
pub struct RunContext {
    pub run_id: Uuid,
    pub root: PathBuf,
    pub counters: RunCounters,
    pub model: ProjectModel,
}

impl RunContext {
    pub fn new(root: PathBuf) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            root,
            counters: RunCounters::default(),
            model: ProjectModel::default(),
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            counters: self.counters.clone(),
        }
    }
}

/// Final report of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    #[serde(flatten)]
    pub counters: RunCounters,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counters;
        writeln!(f, "Run {}", self.run_id)?;
        writeln!(f, "  Files processed:       {}/{}", c.files_processed, c.files_discovered)?;
        writeln!(f, "  Files skipped:         {}", c.files_skipped + c.files_failed)?;
        writeln!(f, "  Components found:      {}", c.components_found)?;
        writeln!(f, "  Files stored:          {}", c.files_stored)?;
        writeln!(f, "  Components stored:     {}", c.components_stored)?;
        write!(f, "  Relationships created: {}", c.relationships_created)?;
        if c.write_failures > 0 {
            write!(f, "\n  Failed writes:         {}", c.write_failures)?;
        }
        Ok(())
    }
}
