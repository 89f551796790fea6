//! The pluggable per-language strategy surface.
//!
//! One strategy per supported language, enumerated at build time. Strategies
//! are pure with respect to graph state: they read AST and source text and
//! return outline edits; all emission happens in the analysis pipeline.

use std::path::Path;

use tree_sitter::Tree;

use crate::outline::FileOutline;
use crate::registry::QuerySet;

pub trait LanguageStrategy: Send + Sync {
    /// Canonical language id (`"python"`, `"lua"`, …).
    fn language(&self) -> &'static str;

    /// File extensions claimed by this language.
    fn extensions(&self) -> &'static [&'static str];

    /// Whether a directory is a package in this language's sense
    /// (`__init__.py`, `mod.rs`, `package.json`, `Cargo.toml`, `init.lua`).
    fn package_signal(&self, dir: &Path) -> bool;

    /// Module-path segments for a repo-relative source path. Package
    /// markers collapse onto their directory (`pkg/__init__.py` → `pkg`,
    /// `sub/mod.rs` → `sub`).
    fn module_path(&self, rel_path: &Path) -> Vec<String> {
        default_module_path(rel_path)
    }

    /// Names that designate a constructor inside a class body.
    fn constructor_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// If `module_path` roots in this language's standard library, the
    /// normalized module root the `IMPORTS` edge should target. Entity
    /// suffixes (`string.upper`, `std.collections.HashMap`) are truncated.
    fn stdlib_root(&self, _module_path: &str) -> Option<String> {
        None
    }

    /// Extract the structural outline from a parsed tree.
    fn outline(
        &self,
        tree: &Tree,
        source: &str,
        rel_path: &Path,
        queries: &QuerySet,
    ) -> FileOutline;
}

/// Path segments with the extension stripped from the last one.
pub fn default_module_path(rel_path: &Path) -> Vec<String> {
    let no_ext = rel_path.with_extension("");
    no_ext
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect()
}

/// The closed set of known strategies.
pub fn all_strategies() -> Vec<Box<dyn LanguageStrategy>> {
    vec![
        Box::new(crate::python::PythonStrategy),
        Box::new(crate::javascript::JavaScriptStrategy),
        Box::new(crate::typescript::TypeScriptStrategy),
        Box::new(crate::rust_lang::RustStrategy),
        Box::new(crate::go::GoStrategy),
        Box::new(crate::cpp::CppStrategy),
        Box::new(crate::java::JavaStrategy),
        Box::new(crate::lua::LuaStrategy),
    ]
}

/// Look up the strategy for a language id.
pub fn strategy_for(language: &str) -> Option<Box<dyn LanguageStrategy>> {
    all_strategies()
        .into_iter()
        .find(|s| s.language() == language)
}
