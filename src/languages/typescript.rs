//! TypeScript language support
//!
//! Plain `.ts` files use the TypeScript grammar, which rejects JSX;
//! `.tsx` files use the TSX grammar.

use crate::languages::LanguageSupport;

/// TypeScript language support implementation
pub struct TypeScriptLanguage;

impl TypeScriptLanguage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TypeScriptLanguage {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageSupport for TypeScriptLanguage {
    fn language_id(&self) -> &str {
        "typescript"
    }

    fn file_extensions(&self) -> &[&str] {
        &[".ts"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }

    fn supports_templates(&self) -> bool {
        false
    }
}

/// TSX language support implementation
pub struct TsxLanguage;

impl TsxLanguage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TsxLanguage {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageSupport for TsxLanguage {
    fn language_id(&self) -> &str {
        "tsx"
    }

    fn file_extensions(&self) -> &[&str] {
        &[".tsx"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    }

    fn supports_templates(&self) -> bool {
        true
    }
}
