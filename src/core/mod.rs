//! Core pipeline: walk, parse, classify, enrich, extract, then load the graph

pub mod classifier;
pub mod config;
pub mod context;
pub mod enricher;
pub mod graph;
pub mod parser;
pub mod relations;
pub mod resolver;
pub mod syntax;
pub mod walker;

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::core::config::ScanConfig;
use crate::core::context::{FileAnalysis, RunContext, RunSummary};
use crate::core::graph::GraphLoader;
use crate::core::parser::{CodeParser, ParseOutcome, ParsedFile, SkipReason};
use crate::core::resolver::ImportResolver;
use crate::core::walker::{SourceFile, SourceWalker};
use crate::languages::LanguageRegistry;
use crate::storage::models::FileRecord;
use crate::storage::GraphStore;

/// Result of analyzing one file
#[derive(Debug)]
pub enum FileOutcome {
    Analyzed(FileAnalysis),
    Skipped(SkipReason),
    Failed(String),
}

/// Rebuild the component graph for the tree under `scan.root`.
///
/// Fails only when the store cannot be reached or the root is missing.
/// Files that cannot be read or parsed are counted and skipped.
pub async fn index_project<S: GraphStore>(
    store: &S,
    scan: &ScanConfig,
    registry: Arc<LanguageRegistry>,
) -> anyhow::Result<RunSummary> {
    let mut run = RunContext::new(scan.root.clone());
    let span = info_span!("index", run_id = %run.run_id);

    async move {
        if !run.root.is_dir() {
            bail!("Source root {} is not a directory", run.root.display());
        }

        store
            .verify_connectivity()
            .await
            .with_context(|| format!("Cannot connect to graph store at {}", store.endpoint()))?;
        info!("Connected to graph store at {}", store.endpoint());

        let mut loader = GraphLoader::new(store);
        loader.prepare().await?;

        let files: Vec<SourceFile> = SourceWalker::new(&run.root, &registry)
            .with_excluded_dirs(&scan.extra_excluded_dirs)
            .walk()
            .collect();
        run.counters.files_discovered = files.len();
        info!("Discovered {} source files under {}", files.len(), run.root.display());

        analyze_all(&mut run, files, registry, scan.workers).await?;
        run.model.sort();
        info!(
            "Found {} components and {} imports",
            run.counters.components_found, run.counters.imports_found
        );

        loader.load_nodes(&run.model, &mut run.counters).await?;
        loader.load_relationships(&run.model, &mut run.counters).await?;
        loader.finish()?;

        let summary = run.summary();
        info!(
            "Indexed {}/{} files: {} components, {} files stored, {} relationships",
            summary.counters.files_processed,
            summary.counters.files_discovered,
            summary.counters.components_found,
            summary.counters.files_stored,
            summary.counters.relationships_created
        );
        Ok(summary)
    }
    .instrument(span)
    .await
}

/// Analyze files on blocking workers, at most `workers` at a time
async fn analyze_all(
    run: &mut RunContext,
    files: Vec<SourceFile>,
    registry: Arc<LanguageRegistry>,
    workers: usize,
) -> anyhow::Result<()> {
    let parser = Arc::new(CodeParser::new(registry));
    let resolver = Arc::new(ImportResolver::new(&run.root));
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();

    for file in files {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Worker pool closed")?;
        let parser = parser.clone();
        let resolver = resolver.clone();
        tasks.spawn_blocking(move || {
            let _permit = permit;
            let outcome = analyze_file(&parser, &resolver, &file);
            (file.relative, outcome)
        });
    }

    let total = run.counters.files_discovered;
    let step = (total / 10).max(1);
    let mut done = 0;

    while let Some(joined) = tasks.join_next().await {
        done += 1;
        match joined {
            Ok((_, FileOutcome::Analyzed(analysis))) => {
                run.counters.files_processed += 1;
                run.counters.components_found += analysis.components.len();
                run.counters.imports_found += analysis.relations.imports.len();
                run.model.push(analysis);
            }
            Ok((relative, FileOutcome::Skipped(reason))) => {
                debug!("Skipped {}: {}", relative, reason);
                run.counters.files_skipped += 1;
            }
            Ok((relative, FileOutcome::Failed(message))) => {
                warn!("Failed to analyze {}: {}", relative, message);
                run.counters.files_failed += 1;
            }
            Err(e) => {
                warn!("Analysis task aborted: {}", e);
                run.counters.files_failed += 1;
            }
        }

        if done % step == 0 || done == total {
            info!("Parsed {}/{} files ({}%)", done, total, done * 100 / total.max(1));
        }
    }

    Ok(())
}

/// Read, parse and analyze one file
pub fn analyze_file(parser: &CodeParser, resolver: &ImportResolver, file: &SourceFile) -> FileOutcome {
    let parsed = match parser.parse_file(&file.path, &file.relative) {
        ParseOutcome::Parsed(parsed) => parsed,
        ParseOutcome::Skipped(reason) => return FileOutcome::Skipped(reason),
        ParseOutcome::Failed(message) => return FileOutcome::Failed(message),
    };

    let metadata = match fs::metadata(&file.path) {
        Ok(metadata) => metadata,
        Err(e) => return FileOutcome::Failed(format!("metadata error: {}", e)),
    };
    let last_modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    let relative = Path::new(&file.relative);
    let record = FileRecord {
        path: file.relative.clone(),
        name: relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        extension: relative
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default(),
        language: parsed.language.language_id().to_string(),
        size: metadata.len(),
        last_modified,
        content_hash: parsed.content_hash.clone(),
    };

    FileOutcome::Analyzed(analyze_parsed(&parsed, record, resolver))
}

/// Classify declarations and extract relationship facts from a parsed file
pub fn analyze_parsed(parsed: &ParsedFile, file: FileRecord, resolver: &ImportResolver) -> FileAnalysis {
    let root = parsed.tree.root_node();
    let source = parsed.source.as_str();

    let mut components = Vec::new();
    let mut seen = HashSet::new();
    for candidate in classifier::find_candidates(root) {
        let serialized = syntax::serialize(candidate.node, source);
        let verdict = classifier::classify(&candidate, &serialized, source, &file.path);
        if !verdict.is_component {
            debug!("{} in {} is not a component: {}", candidate.name(source), file.path, verdict.reason);
            continue;
        }

        let component = enricher::enrich(&candidate, &serialized, source, &file);
        // Redeclared names share an id; the first declaration wins
        if seen.insert(component.id.clone()) {
            components.push(component);
        }
    }

    let relations = relations::extract_relations(
        root,
        source,
        &file.path,
        resolver,
        parsed.language.supports_templates(),
    );

    FileAnalysis {
        file,
        components,
        relations,
    }
}
