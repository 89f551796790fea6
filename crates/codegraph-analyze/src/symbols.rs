//! The global symbol table.
//!
//! Written while the definition phase merges per-file outlines, read-only
//! once call resolution starts; the phase barrier in the pipeline enforces
//! the handover, so no locking is needed here.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use codegraph_parsers::outline::{BaseKind, DefKind};

/// What a resolved name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Module,
    Class,
    Function,
    Method,
}

impl SymbolKind {
    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolKind::Function | SymbolKind::Method)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRef {
    pub qn: String,
    pub kind: SymbolKind,
}

/// Where an imported local name points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    /// A qualified name inside this repository.
    Internal(String),
    /// An external root (package or stdlib module path).
    External(String),
}

/// Per-module symbol state.
#[derive(Debug, Default, Clone)]
pub struct ModuleInfo {
    pub qn: String,
    pub language: &'static str,
    /// Top-level definitions by bare name.
    pub locals: BTreeMap<String, SymbolRef>,
    /// Import bindings: local name → target.
    pub imports: BTreeMap<String, ImportTarget>,
    /// Modules consulted for names that fail direct lookup
    /// (`from x import *` and friends).
    pub wildcard_sources: Vec<String>,
}

/// Per-class symbol state.
#[derive(Debug, Default, Clone)]
pub struct ClassInfo {
    pub qn: String,
    pub module_qn: String,
    /// Bare method name → qualified name of the primary definition.
    pub methods: BTreeMap<String, String>,
    /// Unresolved base clauses as written.
    pub raw_bases: Vec<(String, BaseKind)>,
    /// Resolved base class qualified names (hierarchy fix-up output).
    pub bases: Vec<String>,
    /// Constructor method qualified name, when one exists.
    pub constructor: Option<String>,
}

/// One definition record carried through to emission.
#[derive(Debug, Clone)]
pub struct DefRecord {
    pub qn: String,
    pub name: String,
    pub kind: DefKind,
    pub module_qn: String,
    /// Qualified name of the enclosing scope (module, class, or function).
    pub parent_qn: String,
    pub start_line: u32,
    pub end_line: u32,
    pub decorators: Vec<String>,
    pub is_async: bool,
    pub is_static: bool,
    pub docstring: Option<String>,
    pub synthetic: bool,
}

/// The merged symbol table for one run.
#[derive(Debug, Default)]
pub struct SymbolTable {
    pub project: String,
    pub modules: BTreeMap<String, ModuleInfo>,
    pub classes: BTreeMap<String, ClassInfo>,
    pub functions: HashSet<String>,
    pub methods: HashSet<String>,
    /// All definition records, in merge order.
    pub defs: Vec<DefRecord>,
    /// Qualified name → index into `defs` for the primary record.
    pub def_index: HashMap<String, usize>,
    /// Overload sets: primary qn → later member qns.
    pub overloads: BTreeMap<String, Vec<String>>,
    /// Repo-relative path → module qualified name.
    pub path_to_module: HashMap<PathBuf, String>,
}

impl SymbolTable {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Default::default()
        }
    }

    pub fn module(&self, qn: &str) -> Option<&ModuleInfo> {
        self.modules.get(qn)
    }

    pub fn class(&self, qn: &str) -> Option<&ClassInfo> {
        self.classes.get(qn)
    }

    /// Whether a qualified name exists as a callable (function or method).
    pub fn is_callable(&self, qn: &str) -> bool {
        self.functions.contains(qn) || self.methods.contains(qn)
    }

    /// Kind of an arbitrary qualified name, if known.
    pub fn kind_of(&self, qn: &str) -> Option<SymbolKind> {
        if self.modules.contains_key(qn) {
            Some(SymbolKind::Module)
        } else if self.classes.contains_key(qn) {
            Some(SymbolKind::Class)
        } else if self.methods.contains(qn) {
            Some(SymbolKind::Method)
        } else if self.functions.contains(qn) {
            Some(SymbolKind::Function)
        } else {
            None
        }
    }

    /// Looks up a method by bare name on a class, walking the resolved
    /// inheritance chain breadth-first. Returns the first match.
    pub fn find_method(&self, class_qn: &str, method: &str) -> Option<String> {
        let mut queue = vec![class_qn.to_string()];
        let mut seen = HashSet::new();
        while let Some(current) = queue.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(info) = self.classes.get(&current) {
                if let Some(qn) = info.methods.get(method) {
                    return Some(qn.clone());
                }
                for base in &info.bases {
                    queue.insert(0, base.clone());
                }
            }
        }
        None
    }

    /// All members of the overload set containing `qn` (primary first).
    pub fn overload_set(&self, qn: &str) -> Vec<String> {
        match self.overloads.get(qn) {
            Some(rest) => std::iter::once(qn.to_string())
                .chain(rest.iter().cloned())
                .collect(),
            None => vec![qn.to_string()],
        }
    }
}
