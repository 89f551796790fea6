//! TypeScript strategy. Shares the JavaScript extraction (the grammars agree
//! on the shapes we query) and adds interfaces, overload signatures, and
//! annotated bindings through the TypeScript query set.

use std::path::Path;

use tree_sitter::Tree;

use crate::javascript;
use crate::outline::FileOutline;
use crate::registry::QuerySet;
use crate::strategy::LanguageStrategy;

pub struct TypeScriptStrategy;

impl LanguageStrategy for TypeScriptStrategy {
    fn language(&self) -> &'static str {
        "typescript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx", "mts", "cts"]
    }

    fn package_signal(&self, dir: &Path) -> bool {
        dir.join("package.json").exists() || dir.join("tsconfig.json").exists()
    }

    fn module_path(&self, rel_path: &Path) -> Vec<String> {
        let mut segs = crate::strategy::default_module_path(rel_path);
        if segs.len() > 1 && segs.last().is_some_and(|s| s == "index") {
            segs.pop();
        }
        segs
    }

    fn constructor_names(&self) -> &'static [&'static str] {
        &["constructor"]
    }

    fn stdlib_root(&self, module_path: &str) -> Option<String> {
        // Node's built-in module list is shared between the two languages.
        javascript::JavaScriptStrategy.stdlib_root(module_path)
    }

    fn outline(
        &self,
        tree: &Tree,
        source: &str,
        rel_path: &Path,
        queries: &QuerySet,
    ) -> FileOutline {
        javascript::extract_outline("typescript", tree, source, rel_path, queries)
    }
}
