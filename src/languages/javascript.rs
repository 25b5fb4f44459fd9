//! JavaScript language support (JSX included)

use crate::languages::LanguageSupport;

/// JavaScript language support implementation
pub struct JavaScriptLanguage;

impl JavaScriptLanguage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JavaScriptLanguage {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageSupport for JavaScriptLanguage {
    fn language_id(&self) -> &str {
        "javascript"
    }

    fn file_extensions(&self) -> &[&str] {
        &[".js", ".jsx", ".mjs", ".cjs"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_javascript::LANGUAGE.into()
    }

    fn supports_templates(&self) -> bool {
        true
    }
}
