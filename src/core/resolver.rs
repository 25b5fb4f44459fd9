//! Relative import resolution

use std::path::{Component, Path, PathBuf};

use path_clean::PathClean;

/// Suffixes tried, in order, when the specifier does not name a file
pub const RESOLVE_SUFFIXES: &[&str] = &[".js", ".jsx", ".ts", ".tsx", "/index.js", "/index.jsx"];

/// Whether a specifier is relative (`./x`, `../x`)
pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with('.')
}

/// Maps import specifiers to root-relative paths inside a source tree
#[derive(Debug, Clone)]
pub struct ImportResolver {
    root: PathBuf,
}

impl ImportResolver {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Resolve `specifier` as written in the file at root-relative `importer`.
    ///
    /// Non-relative specifiers come back unchanged. Relative ones resolve
    /// against the importer's directory, then the [`RESOLVE_SUFFIXES`]. When
    /// nothing exists on disk the normalized candidate is returned as is; it
    /// may point outside the tree (leading `..`).
    pub fn resolve(&self, specifier: &str, importer: &str) -> String {
        if !is_relative(specifier) {
            return specifier.to_string();
        }

        let base = Path::new(importer).parent().unwrap_or(Path::new(""));
        let candidate = to_slash(&base.join(specifier).clean());

        if self.root.join(&candidate).is_file() {
            return candidate;
        }

        RESOLVE_SUFFIXES
            .iter()
            .map(|suffix| format!("{}{}", candidate, suffix))
            .find(|path| self.root.join(path).is_file())
            .unwrap_or(candidate)
    }
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_bare_specifiers_pass_through() {
        let dir = TempDir::new().unwrap();
        let resolver = ImportResolver::new(dir.path());
        assert_eq!(resolver.resolve("react", "src/a/b.js"), "react");
        assert_eq!(resolver.resolve("@/components/X", "src/a/b.js"), "@/components/X");
    }

    #[test]
    fn test_resolves_with_extension() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/a/c.js");
        let resolver = ImportResolver::new(dir.path());
        assert_eq!(resolver.resolve("../c", "src/a/b/d.js"), "src/a/c.js");
        assert_eq!(resolver.resolve("./c", "src/a/b.js"), "src/a/c.js");
    }

    #[test]
    fn test_exact_path_wins() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/util.ts");
        touch(dir.path(), "src/util.ts.js");
        let resolver = ImportResolver::new(dir.path());
        assert_eq!(resolver.resolve("./util.ts", "src/main.ts"), "src/util.ts");
    }

    #[test]
    fn test_falls_back_to_index() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/a/c/index.js");
        let resolver = ImportResolver::new(dir.path());
        assert_eq!(resolver.resolve("../c", "src/a/b/d.js"), "src/a/c/index.js");
    }

    #[test]
    fn test_suffix_order() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/c.tsx");
        touch(dir.path(), "src/c.jsx");
        let resolver = ImportResolver::new(dir.path());
        assert_eq!(resolver.resolve("./c", "src/b.js"), "src/c.jsx");
    }

    #[test]
    fn test_unresolved_returns_candidate() {
        let dir = TempDir::new().unwrap();
        let resolver = ImportResolver::new(dir.path());
        assert_eq!(resolver.resolve("../c", "src/a/b/d.js"), "src/a/c");
        assert_eq!(resolver.resolve("../../x", "src/b.js"), "../x");
    }
}
