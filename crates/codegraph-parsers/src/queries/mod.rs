//! Tree-sitter query sources, one pair per language: a `definitions` query
//! (classes, functions, methods, base clauses) and a `references` query
//! (call sites, imports, tracker bindings). Capture names follow the
//! `def.*` / `ref.*` / `bind.*` prefix convention.

use tree_sitter::{Language, Query};

use crate::registry::{QuerySet, RegistryError};

pub const PYTHON_DEFS: &str = include_str!("python.defs.scm");
pub const PYTHON_REFS: &str = include_str!("python.refs.scm");
pub const JAVASCRIPT_DEFS: &str = include_str!("javascript.defs.scm");
pub const JAVASCRIPT_REFS: &str = include_str!("javascript.refs.scm");
pub const TYPESCRIPT_DEFS: &str = include_str!("typescript.defs.scm");
pub const TYPESCRIPT_REFS: &str = include_str!("typescript.refs.scm");
pub const RUST_DEFS: &str = include_str!("rust.defs.scm");
pub const RUST_REFS: &str = include_str!("rust.refs.scm");
pub const GO_DEFS: &str = include_str!("go.defs.scm");
pub const GO_REFS: &str = include_str!("go.refs.scm");
pub const CPP_DEFS: &str = include_str!("cpp.defs.scm");
pub const CPP_REFS: &str = include_str!("cpp.refs.scm");
pub const JAVA_DEFS: &str = include_str!("java.defs.scm");
pub const JAVA_REFS: &str = include_str!("java.refs.scm");
pub const LUA_DEFS: &str = include_str!("lua.defs.scm");
pub const LUA_REFS: &str = include_str!("lua.refs.scm");

fn sources_for(lang_name: &str) -> Option<(&'static str, &'static str)> {
    match lang_name {
        "python" => Some((PYTHON_DEFS, PYTHON_REFS)),
        "javascript" => Some((JAVASCRIPT_DEFS, JAVASCRIPT_REFS)),
        "typescript" => Some((TYPESCRIPT_DEFS, TYPESCRIPT_REFS)),
        "rust" => Some((RUST_DEFS, RUST_REFS)),
        "go" => Some((GO_DEFS, GO_REFS)),
        "cpp" => Some((CPP_DEFS, CPP_REFS)),
        "java" => Some((JAVA_DEFS, JAVA_REFS)),
        "lua" => Some((LUA_DEFS, LUA_REFS)),
        _ => None,
    }
}

/// Compiles the query set for the given language.
pub fn compile(lang: &Language, lang_name: &str) -> Result<QuerySet, RegistryError> {
    let (defs, refs) = sources_for(lang_name)
        .ok_or_else(|| RegistryError::UnknownLanguage(lang_name.to_string()))?;
    let compile_one = |role: &str, source: &str| {
        Query::new(lang, source).map_err(|e| RegistryError::QueryCompile {
            language: lang_name.to_string(),
            message: format!("{role}: {e}"),
        })
    };
    Ok(QuerySet {
        definitions: compile_one("definitions", defs)?,
        references: compile_one("references", refs)?,
    })
}
