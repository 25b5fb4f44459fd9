//! Per-file relationship facts: imports, template usages and hook calls
//!
//! Facts stay file-local here. Turning usages into `RENDERS` edges needs the
//! component index of the whole tree, so that happens at load time.

use tree_sitter::Node;

use crate::core::resolver::ImportResolver;
use crate::core::syntax::{self, node_text};
use crate::storage::models::{HookCallRecord, ImportKind, ImportRecord, UsageRecord};

/// Everything extracted from one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRelations {
    pub imports: Vec<ImportRecord>,
    pub usages: Vec<UsageRecord>,
    pub hook_calls: Vec<HookCallRecord>,
}

/// Run the three extraction passes over one parsed file
pub fn extract_relations(
    root: Node<'_>,
    source: &str,
    path: &str,
    resolver: &ImportResolver,
    templates: bool,
) -> FileRelations {
    FileRelations {
        imports: extract_imports(root, source, path, resolver),
        usages: if templates {
            extract_usages(root, source, path)
        } else {
            Vec::new()
        },
        hook_calls: extract_hook_calls(root, source, path),
    }
}

/// One record per imported binding of every top-level import statement
pub fn extract_imports(
    root: Node<'_>,
    source: &str,
    path: &str,
    resolver: &ImportResolver,
) -> Vec<ImportRecord> {
    let mut imports = Vec::new();
    let mut cursor = root.walk();

    for statement in root.named_children(&mut cursor) {
        if statement.kind() != "import_statement" {
            continue;
        }
        let Some(specifier) = statement
            .child_by_field_name("source")
            .map(|s| string_value(s, source))
        else {
            continue;
        };
        let resolved = resolver.resolve(&specifier, path);

        let mut push = |local: &str, imported: &str, kind: ImportKind| {
            imports.push(ImportRecord {
                local: local.to_string(),
                imported: imported.to_string(),
                source: specifier.clone(),
                resolved: resolved.clone(),
                kind,
            });
        };

        let mut stmt_cursor = statement.walk();
        let Some(clause) = statement
            .named_children(&mut stmt_cursor)
            .find(|c| c.kind() == "import_clause")
        else {
            // Side-effect import, no bindings
            continue;
        };

        let mut clause_cursor = clause.walk();
        for binding in clause.named_children(&mut clause_cursor) {
            match binding.kind() {
                "identifier" => push(node_text(binding, source), "default", ImportKind::Default),
                "namespace_import" => {
                    if let Some(local) = binding.named_child(0) {
                        push(node_text(local, source), "*", ImportKind::Named);
                    }
                }
                "named_imports" => {
                    let mut spec_cursor = binding.walk();
                    for spec in binding.named_children(&mut spec_cursor) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let imported = string_value(name, source);
                        let local = spec
                            .child_by_field_name("alias")
                            .map(|a| node_text(a, source).to_string())
                            .unwrap_or_else(|| imported.clone());
                        let kind = if imported == "default" {
                            ImportKind::Default
                        } else {
                            ImportKind::Named
                        };
                        push(&local, &imported, kind);
                    }
                }
                _ => {}
            }
        }
    }

    imports
}

/// Capitalized template tags, one fact per tag occurrence
pub fn extract_usages(root: Node<'_>, source: &str, path: &str) -> Vec<UsageRecord> {
    let mut usages = Vec::new();
    syntax::walk(root, &mut |n| {
        if matches!(n.kind(), "jsx_opening_element" | "jsx_self_closing_element") {
            if let Some(name) = n.child_by_field_name("name") {
                let tag = node_text(name, source);
                if syntax::is_capitalized(tag) {
                    usages.push(UsageRecord {
                        component: tag.to_string(),
                        file: path.to_string(),
                    });
                }
            }
        }
    });
    usages
}

/// Calls to identifiers following the hook naming convention
pub fn extract_hook_calls(root: Node<'_>, source: &str, path: &str) -> Vec<HookCallRecord> {
    let mut calls = Vec::new();
    syntax::walk(root, &mut |n| {
        if n.kind() == "call_expression" {
            if let Some(name) = syntax::called_identifier(n, source) {
                if syntax::is_hook_name(name) {
                    calls.push(HookCallRecord {
                        hook: name.to_string(),
                        file: path.to_string(),
                    });
                }
            }
        }
    });
    calls
}

/// Contents of a string literal without its quotes
fn string_value(node: Node<'_>, source: &str) -> String {
    let text = node_text(node, source);
    if node.kind() == "string" {
        text.trim_matches(|c| c == '"' || c == '\'').to_string()
    } else {
        text.to_string()
    }
}
