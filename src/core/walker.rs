//! Source tree traversal
//!
//! Yields candidate source files lazily. Each call to [`SourceWalker::walk`]
//! starts a fresh traversal.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::languages::LanguageRegistry;

/// Directory names never descended into
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "bower_components",
    ".git",
    ".svn",
    ".hg",
    "dist",
    "build",
    "out",
    ".next",
    "coverage",
];

/// Bundled third-party files that sometimes get committed next to sources
const VENDORED_BUNDLES: &[&str] = &[
    "bundle.js",
    "vendor.js",
    "vendors.js",
    "polyfills.js",
    "jquery.js",
    "react.development.js",
    "react-dom.development.js",
    "react.production.js",
    "react-dom.production.js",
];

/// A file selected for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (or root-joined) path on disk
    pub path: PathBuf,
    /// Root-relative path with `/` separators
    pub relative: String,
    pub language: String,
}

/// Walks a root directory for source files the registry recognizes
pub struct SourceWalker<'a> {
    root: PathBuf,
    registry: &'a LanguageRegistry,
    extra_excluded: Vec<String>,
}

impl<'a> SourceWalker<'a> {
    pub fn new(root: &Path, registry: &'a LanguageRegistry) -> Self {
        Self {
            root: root.to_path_buf(),
            registry,
            extra_excluded: Vec::new(),
        }
    }

    /// Additional directory names to skip
    pub fn with_excluded_dirs(mut self, dirs: &[String]) -> Self {
        self.extra_excluded.extend(dirs.iter().cloned());
        self
    }

    /// Lazily enumerate candidate files. Unreadable entries are logged and skipped.
    pub fn walk(&self) -> impl Iterator<Item = SourceFile> + '_ {
        WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(move |e| e.depth() == 0 || !self.is_excluded_dir(e))
            .filter_map(move |entry| match entry {
                Ok(entry) => self.accept(entry),
                Err(e) => {
                    warn!(
                        "Skipping unreadable entry {}: {}",
                        e.path().map(|p| p.display().to_string()).unwrap_or_default(),
                        e
                    );
                    None
                }
            })
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.')
            || EXCLUDED_DIRS.contains(&name.as_ref())
            || self.extra_excluded.iter().any(|d| d == name.as_ref())
    }

    fn accept(&self, entry: DirEntry) -> Option<SourceFile> {
        if !entry.file_type().is_file() {
            return None;
        }

        let file_name = entry.file_name().to_string_lossy();
        if is_minified(&file_name) || VENDORED_BUNDLES.contains(&file_name.as_ref()) {
            debug!("Skipping bundle {}", entry.path().display());
            return None;
        }

        let ext = entry.path().extension().and_then(|e| e.to_str())?;
        let language = self.registry.get_by_extension(ext)?.language_id().to_string();

        // Symlinks can still lead into a dependency tree
        match fs::canonicalize(entry.path()) {
            Ok(resolved) if has_dependency_segment(&resolved) => {
                debug!("Skipping dependency file {}", resolved.display());
                return None;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Cannot resolve {}: {}", entry.path().display(), e);
                return None;
            }
        }

        Some(SourceFile {
            relative: relative_path(&self.root, entry.path()),
            path: entry.into_path(),
            language,
        })
    }
}

fn is_minified(file_name: &str) -> bool {
    file_name.contains(".min.") || file_name.ends_with("-min.js")
}

fn has_dependency_segment(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(s) => s == "node_modules" || s == "bower_components",
        _ => false,
    })
}

/// Root-relative path with forward slashes
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
