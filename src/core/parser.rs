//! Source parser using tree-sitter

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use tree_sitter::Tree;

use crate::languages::{LanguageRegistry, LanguageSupport};

/// A successfully parsed file. The tree may contain ERROR nodes.
pub struct ParsedFile {
    pub source: String,
    pub tree: Tree,
    pub language: Arc<dyn LanguageSupport>,
    pub content_hash: String,
}

/// Why a file was not parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Test,
    Spec,
    BuildOutput,
    Story,
    Minified,
    Unsupported,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::Test => "test file",
            SkipReason::Spec => "spec file",
            SkipReason::BuildOutput => "build output",
            SkipReason::Story => "story or demo file",
            SkipReason::Minified => "minified file",
            SkipReason::Unsupported => "unsupported extension",
        };
        f.write_str(s)
    }
}

/// Result of parsing one file
pub enum ParseOutcome {
    Parsed(ParsedFile),
    Skipped(SkipReason),
    Failed(String),
}

const TEST_PATTERNS: &[&str] = &[".test.", "/__tests__/", "/__mocks__/", "/test/", "/tests/"];
const SPEC_PATTERNS: &[&str] = &[".spec."];
const BUILD_PATTERNS: &[&str] = &["/dist/", "/build/", "/out/", "/.next/", "/coverage/"];
const STORY_PATTERNS: &[&str] = &[".stories.", ".story.", "/demo/", "/demos/", ".demo."];
const MINIFIED_PATTERNS: &[&str] = &[".min.", "-min."];

/// Path-based fast rejection, applied before reading the file
pub fn skip_reason(relative: &str) -> Option<SkipReason> {
    let path = format!("/{}", relative.to_ascii_lowercase());
    let hit = |patterns: &[&str]| patterns.iter().any(|p| path.contains(p));

    if hit(TEST_PATTERNS) {
        Some(SkipReason::Test)
    } else if hit(SPEC_PATTERNS) {
        Some(SkipReason::Spec)
    } else if hit(BUILD_PATTERNS) {
        Some(SkipReason::BuildOutput)
    } else if hit(STORY_PATTERNS) {
        Some(SkipReason::Story)
    } else if hit(MINIFIED_PATTERNS) {
        Some(SkipReason::Minified)
    } else {
        None
    }
}

/// Code parser that uses tree-sitter for syntax analysis
pub struct CodeParser {
    registry: Arc<LanguageRegistry>,
}

impl CodeParser {
    /// Create a new parser with the given language registry
    pub fn new(registry: Arc<LanguageRegistry>) -> Self {
        Self { registry }
    }

    /// Read and parse a file; `relative` is its root-relative path
    pub fn parse_file(&self, path: &Path, relative: &str) -> ParseOutcome {
        if let Some(reason) = skip_reason(relative) {
            return ParseOutcome::Skipped(reason);
        }

        // Read file as bytes first to handle non-UTF8 encodings
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read {}: {}", relative, e);
                return ParseOutcome::Failed(format!("read error: {}", e));
            }
        };

        let content = String::from_utf8_lossy(&bytes).into_owned();
        self.parse_source(relative, content)
    }

    /// Parse already loaded source text
    pub fn parse_source(&self, relative: &str, source: String) -> ParseOutcome {
        if let Some(reason) = skip_reason(relative) {
            return ParseOutcome::Skipped(reason);
        }

        let Some(language) = Path::new(relative)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| self.registry.get_by_extension(ext))
            .cloned()
        else {
            return ParseOutcome::Skipped(SkipReason::Unsupported);
        };

        let mut parser = tree_sitter::Parser::new();
        if let Err(e) = parser.set_language(&language.grammar()) {
            warn!("Failed to load {} grammar for {}: {}", language.language_id(), relative, e);
            return ParseOutcome::Failed(format!("grammar error: {}", e));
        }

        let Some(tree) = parser.parse(&source, None) else {
            warn!("Failed to parse {}: parser produced no tree", relative);
            return ParseOutcome::Failed("parser produced no tree".to_string());
        };

        if tree.root_node().has_error() {
            debug!("Parsed {} with recoverable syntax errors", relative);
        }

        ParseOutcome::Parsed(ParsedFile {
            content_hash: compute_hash(&source),
            source,
            tree,
            language,
        })
    }
}

/// Compute SHA-256 hash of content
pub fn compute_hash(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}
