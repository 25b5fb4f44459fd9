//! Integration tests for component-graph
//!
//! These tests run the full pipeline over temporary source trees and
//! inspect the resulting graph in an in-memory SQLite store.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use component_graph::core::config::{GraphConfig, ScanConfig};
use component_graph::storage::models::RelationKind;
use component_graph::{
    index_project, GraphStore, LanguageRegistry, Neo4jStore, RunSummary, SqliteStore,
};

fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn scan_config(root: &Path) -> ScanConfig {
    ScanConfig {
        root: root.to_path_buf(),
        workers: 2,
        extra_excluded_dirs: Vec::new(),
    }
}

async fn run_index(store: &SqliteStore, root: &Path) -> RunSummary {
    index_project(store, &scan_config(root), Arc::new(LanguageRegistry::new()))
        .await
        .unwrap()
}

fn edge_pairs(store: &SqliteStore, kind: RelationKind) -> Vec<(String, String)> {
    store
        .edges(kind)
        .unwrap()
        .into_iter()
        .map(|(source, target, _)| (source, target))
        .collect()
}

fn pair(source: &str, target: &str) -> (String, String) {
    (source.to_string(), target.to_string())
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let temp_dir = TempDir::new().unwrap();
    write_file(
        temp_dir.path(),
        "src/Foo.js",
        "export function Foo() {\n  return <Bar />;\n}\n",
    );
    write_file(temp_dir.path(), "src/BarView.js", "export function Bar() {}\n");

    let store = SqliteStore::open_in_memory().unwrap();
    let summary = run_index(&store, temp_dir.path()).await;

    assert_eq!(summary.counters.files_discovered, 2);
    assert_eq!(summary.counters.files_processed, 2);
    assert_eq!(summary.counters.components_found, 2);

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.components, 2);
    assert_eq!(stats.contains, 2);
    assert_eq!(stats.renders, 1);
    assert_eq!(stats.imports, 0);

    assert_eq!(
        edge_pairs(&store, RelationKind::Renders),
        vec![pair("Foo_src/Foo.js", "Bar_src/BarView.js")]
    );
    assert_eq!(
        store.file_paths().unwrap(),
        vec!["src/BarView.js".to_string(), "src/Foo.js".to_string()]
    );

    let foo = store.component("Foo_src/Foo.js").unwrap().unwrap();
    assert_eq!(foo.name, "Foo");
    assert_eq!(foo.file, "src/Foo.js");
    assert_eq!(foo.complexity, 1);
    assert_eq!((foo.start_line, foo.end_line, foo.loc), (1, 3, 2));
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    write_file(
        temp_dir.path(),
        "src/pages/Home.jsx",
        r#"
import Card from '../components/Card';

export default function Home({ user }) {
    const [open, setOpen] = useState(false);
    return open && user ? <Card title={user.name} /> : <Card />;
}
"#,
    );
    write_file(
        temp_dir.path(),
        "src/components/Card.jsx",
        "export const Card = ({ title = 'Untitled' }) => <div>{title}</div>;\n",
    );

    let store = SqliteStore::open_in_memory().unwrap();
    let first = run_index(&store, temp_dir.path()).await;
    let first_stats = store.stats().await.unwrap();
    let first_home = store.component("Home_src/pages/Home.jsx").unwrap().unwrap();
    let first_imports = store.edges(RelationKind::Imports).unwrap();

    let second = run_index(&store, temp_dir.path()).await;
    let second_stats = store.stats().await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.counters, second.counters);
    assert_eq!(first_stats, second_stats);
    assert_eq!(
        store.component("Home_src/pages/Home.jsx").unwrap().unwrap(),
        first_home
    );
    assert_eq!(store.edges(RelationKind::Imports).unwrap(), first_imports);

    assert_eq!(first_home.props, vec!["user"]);
    assert_eq!(first_home.hooks, vec!["useState"]);
    assert_eq!(first_home.complexity, 3);
}

#[tokio::test]
async fn test_imports_only_for_internal_relative_specifiers() {
    let temp_dir = TempDir::new().unwrap();
    write_file(
        temp_dir.path(),
        "src/App.jsx",
        r#"
import React from 'react';
import { Button as Btn } from './Button';
import Missing from './Missing';

export function App() {
    return <Btn />;
}
"#,
    );
    write_file(
        temp_dir.path(),
        "src/Button.jsx",
        "export function Button() { return <button />; }\n",
    );

    let store = SqliteStore::open_in_memory().unwrap();
    let summary = run_index(&store, temp_dir.path()).await;
    assert_eq!(summary.counters.imports_found, 3);

    let imports = store.edges(RelationKind::Imports).unwrap();
    assert_eq!(imports.len(), 1);
    let (source, target, attributes) = &imports[0];
    assert_eq!(source, "src/App.jsx");
    assert_eq!(target, "src/Button.jsx");
    let attributes: serde_json::Value =
        serde_json::from_str(attributes.as_deref().unwrap()).unwrap();
    assert_eq!(attributes["name"], "Btn");
    assert_eq!(attributes["type"], "named");

    // Usage of the local alias matches no component name
    assert!(edge_pairs(&store, RelationKind::Renders).is_empty());
}

#[tokio::test]
async fn test_recursive_component_has_no_self_render() {
    let temp_dir = TempDir::new().unwrap();
    write_file(
        temp_dir.path(),
        "src/Tree.jsx",
        r#"
export function Tree({ nodes }) {
    return <ul>{nodes.map((n) => <Tree nodes={n.children} />)}</ul>;
}
"#,
    );

    let store = SqliteStore::open_in_memory().unwrap();
    run_index(&store, temp_dir.path()).await;

    assert_eq!(store.stats().await.unwrap().components, 1);
    assert!(edge_pairs(&store, RelationKind::Renders).is_empty());
}

#[tokio::test]
async fn test_hook_usage_edges() {
    let temp_dir = TempDir::new().unwrap();
    write_file(
        temp_dir.path(),
        "src/Counter.jsx",
        r#"
export function Counter() {
    const [n, setN] = useState(0);
    useEffect(() => {}, []);
    return <span onClick={() => setN(n + 1)}>{n}</span>;
}

function useLocal() {
    return useMemo(() => 1, []);
}
"#,
    );

    let store = SqliteStore::open_in_memory().unwrap();
    run_index(&store, temp_dir.path()).await;

    assert_eq!(
        edge_pairs(&store, RelationKind::UsesHook),
        vec![
            pair("Counter_src/Counter.jsx", "useEffect"),
            pair("Counter_src/Counter.jsx", "useState"),
        ]
    );
    assert_eq!(store.stats().await.unwrap().hooks, 2);
}

#[tokio::test]
async fn test_skipped_files_do_not_abort_the_run() {
    let temp_dir = TempDir::new().unwrap();
    write_file(
        temp_dir.path(),
        "src/Widget.jsx",
        "export const Widget = () => <div />;\n",
    );
    write_file(
        temp_dir.path(),
        "src/Widget.test.jsx",
        "export const WidgetTest = () => <div />;\n",
    );
    write_file(
        temp_dir.path(),
        "src/Broken.jsx",
        "export function Broken( { return <div",
    );
    write_file(temp_dir.path(), "src/vendor.min.js", "var A=1;");
    write_file(
        temp_dir.path(),
        "node_modules/lib/Lib.js",
        "export const Lib = () => <div />;\n",
    );
    write_file(temp_dir.path(), "src/notes.md", "# not source\n");

    let store = SqliteStore::open_in_memory().unwrap();
    let summary = run_index(&store, temp_dir.path()).await;

    assert_eq!(summary.counters.files_discovered, 3);
    assert_eq!(summary.counters.files_skipped, 1);
    assert_eq!(summary.counters.files_processed, 2);

    let paths = store.file_paths().unwrap();
    assert_eq!(
        paths,
        vec!["src/Broken.jsx".to_string(), "src/Widget.jsx".to_string()]
    );
    assert!(store.component("Widget_src/Widget.jsx").unwrap().is_some());
}

#[tokio::test]
async fn test_unreachable_store_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "src/Foo.js", "export function Foo() {}\n");

    let config = GraphConfig {
        uri: "http://127.0.0.1:1".to_string(),
        timeout_secs: 2,
        ..GraphConfig::default()
    };
    let store = Neo4jStore::new(&config).unwrap();

    let result = index_project(
        &store,
        &scan_config(temp_dir.path()),
        Arc::new(LanguageRegistry::new()),
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_missing_root_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteStore::open_in_memory().unwrap();

    let result = index_project(
        &store,
        &scan_config(&temp_dir.path().join("absent")),
        Arc::new(LanguageRegistry::new()),
    )
    .await;
    assert!(result.is_err());
}
