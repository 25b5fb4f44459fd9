//! Language support for source parsing
//!
//! Each dialect of the JavaScript family gets its own tree-sitter grammar.
//! Extraction is shared: the grammars agree on the node kinds the pipeline
//! inspects.

pub mod javascript;
pub mod typescript;

use std::sync::Arc;

/// Trait for language support plugins
pub trait LanguageSupport: Send + Sync {
    /// Get the language identifier (e.g., "javascript", "tsx")
    fn language_id(&self) -> &str;

    /// Get supported file extensions (e.g., [".js", ".jsx"])
    fn file_extensions(&self) -> &[&str];

    /// Get the tree-sitter grammar
    fn grammar(&self) -> tree_sitter::Language;

    /// Whether the grammar accepts embedded template (JSX) syntax
    fn supports_templates(&self) -> bool;
}

/// Registry for managing language support plugins
pub struct LanguageRegistry {
    languages: Vec<Arc<dyn LanguageSupport>>,
}

impl LanguageRegistry {
    /// Create a new registry with default language support
    pub fn new() -> Self {
        let mut registry = Self {
            languages: Vec::new(),
        };

        registry.register(Arc::new(javascript::JavaScriptLanguage::new()));
        registry.register(Arc::new(typescript::TypeScriptLanguage::new()));
        registry.register(Arc::new(typescript::TsxLanguage::new()));

        registry
    }

    /// Register a language support plugin
    pub fn register(&mut self, language: Arc<dyn LanguageSupport>) {
        self.languages.push(language);
    }

    /// Get language support by ID
    pub fn get(&self, language_id: &str) -> Option<&Arc<dyn LanguageSupport>> {
        self.languages.iter().find(|l| l.language_id() == language_id)
    }

    /// Get language support by file extension
    pub fn get_by_extension(&self, extension: &str) -> Option<&Arc<dyn LanguageSupport>> {
        let ext = if extension.starts_with('.') {
            extension.to_string()
        } else {
            format!(".{}", extension)
        };

        self.languages
            .iter()
            .find(|l| l.file_extensions().contains(&ext.as_str()))
    }

    /// List all supported languages
    pub fn list_languages(&self) -> &[Arc<dyn LanguageSupport>] {
        &self.languages
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
