//! Tree helpers shared by the classifier, enricher and relationship extractor

use std::fmt::Write;

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::Node;

/// `use` + uppercase letter + rest, as a whole identifier
pub static HOOK_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^use[A-Z][A-Za-z0-9_$]*$").expect("valid hook regex"));

/// Source text covered by a node
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

/// Whether a name starts with an uppercase letter
pub fn is_capitalized(name: &str) -> bool {
    name.chars().next().map(char::is_uppercase).unwrap_or(false)
}

/// Whether a name follows the hook naming convention
pub fn is_hook_name(name: &str) -> bool {
    HOOK_NAME.is_match(name)
}

/// Visit `node` and every descendant in document order
pub fn walk<'t, F>(node: Node<'t>, visit: &mut F)
where
    F: FnMut(Node<'t>),
{
    visit(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, visit);
    }
}

/// Name of the function called by a `call_expression`, when it is a plain identifier
pub fn called_identifier<'a>(call: Node<'_>, source: &'a str) -> Option<&'a str> {
    let function = call.child_by_field_name("function")?;
    (function.kind() == "identifier").then(|| node_text(function, source))
}

/// Textual serialization of a subtree.
///
/// Named nodes become `(kind ...)`, children carry their field label
/// (`name: (identifier "Foo")`), named leaves carry their quoted source
/// text, and anonymous tokens appear only when they hold a field (such as
/// `operator: "&&"`). Heuristics match substrings of this text, so string
/// literal contents take part in matching.
pub fn serialize(node: Node<'_>, source: &str) -> String {
    let mut out = String::with_capacity(node.byte_range().len() * 2);
    write_node(node, source, &mut out);
    out
}

fn write_node(node: Node<'_>, source: &str, out: &mut String) {
    out.push('(');
    out.push_str(node.kind());

    if node.named_child_count() == 0 {
        let _ = write!(out, " {:?}", node_text(node, source));
    }

    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            let field = cursor.field_name();
            if child.is_named() {
                out.push(' ');
                if let Some(field) = field {
                    out.push_str(field);
                    out.push_str(": ");
                }
                write_node(child, source, out);
            } else if let Some(field) = field {
                let _ = write!(out, " {}: {:?}", field, node_text(child, source));
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }

    out.push(')');
}
