//! Graph loading: schema setup, node upserts, then relationships
//!
//! The loader walks a fixed sequence of phases:
//! `Uninitialized -> SchemaReady -> NodesLoaded -> RelationshipsLoaded -> Done`.
//! Relationship writes match on nodes, so every node has to be written first.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::core::context::{ProjectModel, RunCounters};
use crate::core::resolver::is_relative;
use crate::storage::models::{ImportRecord, RelationKind};
use crate::storage::{GraphStore, StoreError, SCHEMA};

/// Where the loader is in the load sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Uninitialized,
    SchemaReady,
    NodesLoaded,
    RelationshipsLoaded,
    Done,
}

/// Deduplicated relationship facts for one run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RelationshipPlan<'m> {
    /// `(from, to) -> binding`; the last binding between a pair wins, as with MERGE + SET
    pub imports: BTreeMap<(&'m str, &'m str), &'m ImportRecord>,
    /// `(source id, target id)`
    pub renders: BTreeSet<(&'m str, &'m str)>,
    /// `(component id, hook name)`
    pub hooks: BTreeSet<(&'m str, &'m str)>,
}

impl RelationshipPlan<'_> {
    pub fn len(&self) -> usize {
        self.imports.len() + self.renders.len() + self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve per-file facts against the whole model.
///
/// `RENDERS` matches usages by component name across the entire tree, so
/// two unrelated components that share a name both become targets. A
/// component is never its own target.
pub fn plan_relationships(model: &ProjectModel) -> RelationshipPlan<'_> {
    let internal = model.file_paths();
    let by_name = model.components_by_name();
    let mut plan = RelationshipPlan::default();

    for analysis in &model.files {
        let from = analysis.file.path.as_str();

        for import in &analysis.relations.imports {
            if is_relative(&import.source) && internal.contains(import.resolved.as_str()) {
                plan.imports.insert((from, import.resolved.as_str()), import);
            }
        }

        for usage in &analysis.relations.usages {
            let Some(targets) = by_name.get(usage.component.as_str()) else {
                continue;
            };
            for source in &analysis.components {
                for target in targets {
                    if source.id != target.id {
                        plan.renders.insert((source.id.as_str(), target.id.as_str()));
                    }
                }
            }
        }

        for call in &analysis.relations.hook_calls {
            for component in &analysis.components {
                if component.hooks.iter().any(|h| h == &call.hook) {
                    plan.hooks.insert((component.id.as_str(), call.hook.as_str()));
                }
            }
        }
    }

    plan
}

/// Writes a [`ProjectModel`] into a [`GraphStore`]
pub struct GraphLoader<'s, S: GraphStore> {
    store: &'s S,
    phase: LoadPhase,
}

impl<'s, S: GraphStore> GraphLoader<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            phase: LoadPhase::Uninitialized,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    fn expect_phase(&self, expected: LoadPhase, step: &str) -> Result<()> {
        if self.phase != expected {
            bail!("Cannot {} in phase {:?} (expected {:?})", step, self.phase, expected);
        }
        Ok(())
    }

    /// Clear the graph and ensure constraints and indexes.
    ///
    /// Only an unreachable store is an error; existing schema items are
    /// ignored and other schema failures are logged.
    pub async fn prepare(&mut self) -> Result<()> {
        self.expect_phase(LoadPhase::Uninitialized, "prepare the graph")?;

        match self.store.clear().await {
            Ok(()) => info!("Cleared existing graph at {}", self.store.endpoint()),
            Err(e) if e.is_connection() => {
                return Err(e).context("Failed to clear the graph");
            }
            Err(e) => warn!("Failed to clear the graph: {}", e),
        }

        for item in SCHEMA {
            match self.store.apply_schema(item).await {
                Ok(()) => debug!("Created {}", item.name()),
                Err(StoreError::AlreadyExists(_)) => debug!("{} already exists", item.name()),
                Err(e) if e.is_connection() => {
                    return Err(e).with_context(|| format!("Failed to create {}", item.name()));
                }
                Err(e) => warn!("Failed to create {}: {}", item.name(), e),
            }
        }

        self.phase = LoadPhase::SchemaReady;
        Ok(())
    }

    /// Upsert every file, then every component with its `CONTAINS` edge.
    ///
    /// A rejected write is logged and counted; losing the store aborts the load.
    pub async fn load_nodes(&mut self, model: &ProjectModel, counters: &mut RunCounters) -> Result<()> {
        self.expect_phase(LoadPhase::SchemaReady, "load nodes")?;

        for analysis in &model.files {
            match self.store.upsert_file(&analysis.file).await {
                Ok(()) => counters.files_stored += 1,
                Err(e) if e.is_connection() => {
                    return Err(e)
                        .with_context(|| format!("Failed to store file {}", analysis.file.path));
                }
                Err(e) => {
                    warn!("Failed to store file {}: {}", analysis.file.path, e);
                    counters.write_failures += 1;
                }
            }
        }

        for component in model.components() {
            match self.store.upsert_component(component).await {
                Ok(()) => counters.components_stored += 1,
                Err(e) if e.is_connection() => {
                    return Err(e)
                        .with_context(|| format!("Failed to store component {}", component.id));
                }
                Err(e) => {
                    warn!("Failed to store component {}: {}", component.id, e);
                    counters.write_failures += 1;
                }
            }
        }

        info!(
            "Stored {} files and {} components",
            counters.files_stored, counters.components_stored
        );
        self.phase = LoadPhase::NodesLoaded;
        Ok(())
    }

    /// Write `IMPORTS`, `RENDERS` and `USES_HOOK` edges
    pub async fn load_relationships(
        &mut self,
        model: &ProjectModel,
        counters: &mut RunCounters,
    ) -> Result<()> {
        self.expect_phase(LoadPhase::NodesLoaded, "load relationships")?;

        let plan = plan_relationships(model);
        debug!("Planned {} relationships", plan.len());

        for (&(from, to), import) in &plan.imports {
            let result = self.store.merge_import(from, to, import).await;
            record(RelationKind::Imports, from, to, result, counters)?;
        }

        for &(source, target) in &plan.renders {
            let result = self.store.merge_renders(source, target).await;
            record(RelationKind::Renders, source, target, result, counters)?;
        }

        for &(component, hook) in &plan.hooks {
            let result = self.store.merge_hook_usage(component, hook).await;
            record(RelationKind::UsesHook, component, hook, result, counters)?;
        }

        info!("Created {} relationships", counters.relationships_created);
        self.phase = LoadPhase::RelationshipsLoaded;
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        self.expect_phase(LoadPhase::RelationshipsLoaded, "finish")?;
        self.phase = LoadPhase::Done;
        Ok(())
    }
}

fn record(
    kind: RelationKind,
    from: &str,
    to: &str,
    result: Result<bool, StoreError>,
    counters: &mut RunCounters,
) -> Result<()> {
    match result {
        Ok(true) => counters.relationships_created += 1,
        Ok(false) => debug!("Skipped {} {} -> {}: endpoint missing", kind, from, to),
        Err(e) if e.is_connection() => {
            return Err(e).with_context(|| format!("Failed to create {} {} -> {}", kind, from, to));
        }
        Err(e) => {
            warn!("Failed to create {} {} -> {}: {}", kind, from, to, e);
            counters.write_failures += 1;
        }
    }
    Ok(())
}
