//! Component classification
//!
//! Decides whether a top-level declaration is a UI component. The checks
//! for templates and hook calls look for substrings in the serialized
//! subtree (see [`syntax::serialize`]), so a string literal that happens to
//! contain a marker also counts.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::Node;

use crate::core::syntax::{self, node_text};

/// Markers of an embedded template or element factory call
const TEMPLATE_MARKERS: &[&str] = &[
    "jsx_element",
    "jsx_self_closing_element",
    "jsx_fragment",
    "createElement",
];

/// Path fragments that mark a UI file
pub const PATH_KEYWORDS: &[&str] = &["Screen", "View", "Modal", "Page", "Dialog", "Window", "Component"];

/// Superclass accepted for class components
const BASE_COMPONENT: &str = "Component";
const BASE_NAMESPACE: &str = "React";

static HOOK_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\buse[A-Z][A-Za-z0-9_]*").expect("valid hook call regex"));

/// Shape of a declaration that can be a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// `function Foo() {}`
    Function,
    /// `const Foo = () => {}` or `const Foo = function () {}`
    Binding,
    /// `class Foo extends Component {}`
    Class,
}

/// A named top-level declaration
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'t> {
    pub kind: DeclarationKind,
    /// Declaration node (the declarator for bindings)
    pub node: Node<'t>,
    /// The function node holding the parameters; `None` for classes
    pub function: Option<Node<'t>>,
    pub name_node: Node<'t>,
}

impl<'t> Candidate<'t> {
    pub fn name<'s>(&self, source: &'s str) -> &'s str {
        node_text(self.name_node, source)
    }

    /// Build a candidate from a declaration node of a supported kind
    pub fn from_node(node: Node<'t>) -> Option<Self> {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => Some(Self {
                kind: DeclarationKind::Function,
                node,
                function: Some(node),
                name_node: node.child_by_field_name("name")?,
            }),
            "class_declaration" => Some(Self {
                kind: DeclarationKind::Class,
                node,
                function: None,
                name_node: node.child_by_field_name("name")?,
            }),
            "variable_declarator" => {
                let name_node = node.child_by_field_name("name")?;
                let value = node.child_by_field_name("value")?;
                let is_function = matches!(
                    value.kind(),
                    "arrow_function" | "function_expression" | "function"
                );
                (name_node.kind() == "identifier" && is_function).then_some(Self {
                    kind: DeclarationKind::Binding,
                    node,
                    function: Some(value),
                    name_node,
                })
            }
            _ => None,
        }
    }
}

/// Why a declaration was accepted or rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyReason {
    LowercaseName,
    UnsupportedDeclaration,
    MissingBaseClass,
    RendersTemplate,
    CallsHook,
    PathKeyword,
    NoSignal,
}

impl fmt::Display for ClassifyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClassifyReason::LowercaseName => "name is not capitalized",
            ClassifyReason::UnsupportedDeclaration => "unsupported declaration",
            ClassifyReason::MissingBaseClass => "class does not extend a component base",
            ClassifyReason::RendersTemplate => "renders a template",
            ClassifyReason::CallsHook => "calls a hook",
            ClassifyReason::PathKeyword => "file path names a UI element",
            ClassifyReason::NoSignal => "no component signal",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub is_component: bool,
    pub reason: ClassifyReason,
}

impl Classification {
    fn accept(reason: ClassifyReason) -> Self {
        Self {
            is_component: true,
            reason,
        }
    }

    fn reject(reason: ClassifyReason) -> Self {
        Self {
            is_component: false,
            reason,
        }
    }
}

/// Named top-level declarations, including exported ones
pub fn find_candidates(root: Node<'_>) -> Vec<Candidate<'_>> {
    let mut candidates = Vec::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        collect_declaration(child, &mut candidates);
    }
    candidates
}

fn collect_declaration<'t>(node: Node<'t>, out: &mut Vec<Candidate<'t>>) {
    match node.kind() {
        "export_statement" => {
            if let Some(decl) = node.child_by_field_name("declaration") {
                collect_declaration(decl, out);
            }
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if let Some(candidate) = Candidate::from_node(declarator) {
                    out.push(candidate);
                }
            }
        }
        _ => {
            if let Some(candidate) = Candidate::from_node(node) {
                out.push(candidate);
            }
        }
    }
}

/// Classify one candidate declared in the file at `path`
pub fn classify(
    candidate: &Candidate<'_>,
    serialized: &str,
    source: &str,
    path: &str,
) -> Classification {
    if !syntax::is_capitalized(candidate.name(source)) {
        return Classification::reject(ClassifyReason::LowercaseName);
    }

    if candidate.kind == DeclarationKind::Class && !extends_component(candidate.node, source) {
        return Classification::reject(ClassifyReason::MissingBaseClass);
    }

    if TEMPLATE_MARKERS.iter().any(|m| serialized.contains(m)) {
        Classification::accept(ClassifyReason::RendersTemplate)
    } else if HOOK_CALL.is_match(serialized) {
        Classification::accept(ClassifyReason::CallsHook)
    } else if PATH_KEYWORDS.iter().any(|k| path.contains(k)) {
        Classification::accept(ClassifyReason::PathKeyword)
    } else {
        Classification::reject(ClassifyReason::NoSignal)
    }
}

/// Boolean shorthand over [`classify`]; `name` is the identifier the caller derived
pub fn is_component(name: &str, node: Node<'_>, source: &str, path: &str) -> bool {
    if !syntax::is_capitalized(name) {
        return false;
    }
    let Some(candidate) = Candidate::from_node(node) else {
        return false;
    };
    let serialized = syntax::serialize(node, source);
    classify(&candidate, &serialized, source, path).is_component
}

/// Whether a class's superclass is `Component` or `React.Component`
fn extends_component(class: Node<'_>, source: &str) -> bool {
    let Some(superclass) = superclass(class) else {
        return false;
    };

    match superclass.kind() {
        "identifier" => node_text(superclass, source) == BASE_COMPONENT,
        "member_expression" => {
            let object = superclass.child_by_field_name("object");
            let property = superclass.child_by_field_name("property");
            match (object, property) {
                (Some(object), Some(property)) => {
                    object.kind() == "identifier"
                        && node_text(object, source) == BASE_NAMESPACE
                        && node_text(property, source) == BASE_COMPONENT
                }
                _ => false,
            }
        }
        _ => false,
    }
}

/// Expression after `extends`. JavaScript puts it directly under
/// `class_heritage`; TypeScript wraps it in `extends_clause`.
fn superclass(class: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = class.walk();
    let heritage = class
        .named_children(&mut cursor)
        .find(|c| c.kind() == "class_heritage")?;

    let mut cursor = heritage.walk();
    let first = heritage.named_children(&mut cursor).next()?;
    if first.kind() == "extends_clause" {
        first
            .child_by_field_name("value")
            .or_else(|| first.named_child(0))
    } else {
        Some(first)
    }
}
