//! Derived metadata for accepted components

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::Node;

use crate::core::classifier::Candidate;
use crate::core::syntax::{self, node_text};
use crate::storage::models::{ComponentRecord, ComponentType, FileRecord};

/// Joins component name and file path into the component id
pub const ID_SEPARATOR: &str = "_";

/// Branching constructs in the serialized subtree. Every match adds one.
static BRANCHES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\((?:if_statement|ternary_expression|for_statement|while_statement|do_statement)\b|operator: "(?:&&|\|\||\?\?)""#,
    )
    .expect("valid branch regex")
});

/// Stable component id
pub fn component_id(name: &str, path: &str) -> String {
    format!("{}{}{}", name, ID_SEPARATOR, path)
}

/// First matching rule wins: path segments, then name fragments
pub fn infer_component_type(path: &str, name: &str) -> ComponentType {
    let path = format!("/{}", path);
    if path.contains("/pages/") {
        ComponentType::Page
    } else if path.contains("/Apps/") || path.contains("/apps/") {
        ComponentType::App
    } else if path.contains("hooks") {
        ComponentType::Hook
    } else if path.contains("contexts") {
        ComponentType::Context
    } else if path.contains("common") {
        ComponentType::Common
    } else if name.contains("Page") {
        ComponentType::Page
    } else if name.contains("App") {
        ComponentType::App
    } else {
        ComponentType::Component
    }
}

/// 1 + number of branching constructs found in the serialization
pub fn complexity(serialized: &str) -> u32 {
    1 + BRANCHES.find_iter(serialized).count() as u32
}

/// (start line, end line, loc), 1-based lines
pub fn line_span(node: Node<'_>) -> (u32, u32, u32) {
    let start = node.start_position().row as u32 + 1;
    let end = node.end_position().row as u32 + 1;
    (start, end, end.saturating_sub(start))
}

/// Names destructured from the first parameter, in order
pub fn extract_props(function: Node<'_>, source: &str) -> Vec<String> {
    let first = function
        .child_by_field_name("parameters")
        .and_then(|params| params.named_child(0))
        .or_else(|| function.child_by_field_name("parameter"));

    let Some(mut param) = first else {
        return Vec::new();
    };

    // TypeScript wraps parameters: `({ a }: Props)`
    if matches!(param.kind(), "required_parameter" | "optional_parameter") {
        match param.child_by_field_name("pattern") {
            Some(pattern) => param = pattern,
            None => return Vec::new(),
        }
    }
    // `({ a } = {})`
    if param.kind() == "assignment_pattern" {
        match param.child_by_field_name("left") {
            Some(left) => param = left,
            None => return Vec::new(),
        }
    }

    if param.kind() != "object_pattern" {
        return Vec::new();
    }

    let mut props = Vec::new();
    let mut cursor = param.walk();
    for entry in param.named_children(&mut cursor) {
        let name = match entry.kind() {
            "shorthand_property_identifier_pattern" => Some(entry),
            "pair_pattern" => entry.child_by_field_name("key"),
            "object_assignment_pattern" => entry.child_by_field_name("left"),
            "rest_pattern" => entry.named_child(0),
            _ => None,
        };
        if let Some(name) = name {
            props.push(node_text(name, source).to_string());
        }
    }
    props
}

/// Hook names called anywhere in the declaration, sorted and deduplicated
pub fn collect_hooks(node: Node<'_>, source: &str) -> Vec<String> {
    let mut hooks = BTreeSet::new();
    syntax::walk(node, &mut |n| {
        if n.kind() == "call_expression" {
            if let Some(name) = syntax::called_identifier(n, source) {
                if syntax::is_hook_name(name) {
                    hooks.insert(name.to_string());
                }
            }
        }
    });
    hooks.into_iter().collect()
}

/// Build the component record for an accepted candidate
pub fn enrich(
    candidate: &Candidate<'_>,
    serialized: &str,
    source: &str,
    file: &FileRecord,
) -> ComponentRecord {
    let name = candidate.name(source).to_string();
    let (start_line, end_line, loc) = line_span(candidate.node);
    let props = candidate
        .function
        .map(|f| extract_props(f, source))
        .unwrap_or_default();

    ComponentRecord {
        id: component_id(&name, &file.path),
        component_type: infer_component_type(&file.path, &name),
        file: file.path.clone(),
        props,
        hooks: collect_hooks(candidate.node, source),
        loc,
        start_line,
        end_line,
        complexity: complexity(serialized),
        last_modified: file.last_modified,
        name,
    }
}
