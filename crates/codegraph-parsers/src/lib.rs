//! Tree-sitter parsing and per-language extraction for codegraph.
//!
//! - [`registry`] — grammar + query loading, keyed by language id
//! - [`walker`] — repository file discovery with ignore rules
//! - [`outline`] — the per-file structural outline (definitions, imports,
//!   call sites, local bindings) produced by one parse
//! - [`strategy`] — the `LanguageStrategy` trait every language implements
//!
//! Supported languages: Python, JavaScript, TypeScript, Rust, Go, C/C++,
//! Java, Lua.

pub mod outline;
pub mod queries;
pub mod registry;
pub mod strategy;
pub mod walker;

pub mod cpp;
pub mod go;
pub mod java;
pub mod javascript;
pub mod lua;
pub mod python;
pub mod rust_lang;
pub mod typescript;
