//! Grammar and query loading, keyed by language id.
//!
//! A missing or non-compiling grammar disables that language for the run and
//! is logged; it is never fatal for other languages.

use std::collections::HashMap;

use tree_sitter::{Language, Parser, Query, Tree};

use codegraph_core::config::LanguageFilter;

use crate::queries;

/// Errors raised while loading a language. Never fatal for the run: the
/// affected language is disabled and the rest proceed.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    #[error("query compilation error for {language}: {message}")]
    QueryCompile { language: String, message: String },
}

/// Compiled queries for one language, keyed by role.
pub struct QuerySet {
    pub definitions: Query,
    pub references: Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRole {
    Definitions,
    References,
}

impl QuerySet {
    pub fn get(&self, role: QueryRole) -> &Query {
        match role {
            QueryRole::Definitions => &self.definitions,
            QueryRole::References => &self.references,
        }
    }
}

/// One loaded language: grammar plus compiled queries.
pub struct LanguageEntry {
    pub language: Language,
    pub queries: QuerySet,
}

/// Registry of loaded grammars, built once per run.
pub struct ParserRegistry {
    entries: HashMap<&'static str, LanguageEntry>,
}

/// All language ids the registry knows how to load.
pub const KNOWN_LANGUAGES: &[&str] = &[
    "python",
    "javascript",
    "typescript",
    "rust",
    "go",
    "cpp",
    "java",
    "lua",
];

fn grammar_for(name: &str) -> Option<Language> {
    match name {
        "python" => Some(tree_sitter_python::LANGUAGE.into()),
        "javascript" => Some(tree_sitter_javascript::LANGUAGE.into()),
        "typescript" => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        "rust" => Some(tree_sitter_rust::LANGUAGE.into()),
        "go" => Some(tree_sitter_go::LANGUAGE.into()),
        "cpp" => Some(tree_sitter_cpp::LANGUAGE.into()),
        "java" => Some(tree_sitter_java::LANGUAGE.into()),
        "lua" => Some(tree_sitter_lua::LANGUAGE.into()),
        _ => None,
    }
}

impl ParserRegistry {
    /// Load grammars and compile queries for every enabled language.
    pub fn load(filter: &LanguageFilter) -> Self {
        let mut entries = HashMap::new();
        for &name in KNOWN_LANGUAGES {
            if !filter.is_enabled(name) {
                continue;
            }
            let Some(language) = grammar_for(name) else {
                tracing::warn!(language = name, "no grammar available, skipping language");
                continue;
            };
            match queries::compile(&language, name) {
                Ok(queries) => {
                    entries.insert(name, LanguageEntry { language, queries });
                }
                Err(e) => {
                    tracing::warn!(
                        language = name,
                        error = %e,
                        "query compilation failed, skipping language"
                    );
                }
            }
        }
        Self { entries }
    }

    pub fn get(&self, language: &str) -> Option<&LanguageEntry> {
        self.entries.get(language)
    }

    pub fn is_supported(&self, language: &str) -> bool {
        self.entries.contains_key(language)
    }

    /// Loaded language ids, sorted for deterministic logging.
    pub fn supported(&self) -> Vec<&'static str> {
        let mut langs: Vec<_> = self.entries.keys().copied().collect();
        langs.sort_unstable();
        langs
    }

    /// Parse `source` with a fresh parser for the language. Returns `None`
    /// when the language is not loaded, the parse times out, or the parser
    /// gives up entirely. Workers call this once per file.
    pub fn parse(&self, language: &str, source: &str, timeout_ms: u64) -> Option<Tree> {
        let entry = self.entries.get(language)?;
        let mut parser = Parser::new();
        parser.set_language(&entry.language).ok()?;
        if timeout_ms > 0 {
            #[allow(deprecated)]
            parser.set_timeout_micros(timeout_ms * 1_000);
        }
        parser.parse(source, None)
    }
}

/// Classifies a file by extension to a language id.
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "py" | "pyi" => Some("python"),
        "js" | "mjs" | "cjs" | "jsx" => Some("javascript"),
        "ts" | "tsx" | "mts" | "cts" => Some("typescript"),
        "rs" => Some("rust"),
        "go" => Some("go"),
        "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" | "c" | "h" => Some("cpp"),
        "java" => Some("java"),
        "lua" => Some("lua"),
        _ => None,
    }
}
