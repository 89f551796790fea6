//! The type tracker: best-effort mapping from local identifiers to the
//! qualified name of the class they refer to, consumed by the call resolver.
//!
//! Bindings are binary — either a confident class binding exists or the
//! identifier is left unbound and call resolution falls through to
//! name-only matching.

use codegraph_core::qualified;
use codegraph_parsers::outline::{BindingSource, FileOutline, LocalBinding};

use crate::symbols::{ImportTarget, ModuleInfo, SymbolKind, SymbolRef, SymbolTable};

/// Resolution result for a bare name in a module's scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTarget {
    Internal(SymbolRef),
    External(String),
}

/// Resolves a bare name inside a module, in tie-break order: same-module >
/// same-package > imported > wildcard-imported. Externals come last through
/// the import table.
pub fn resolve_name(table: &SymbolTable, module: &ModuleInfo, name: &str) -> Option<NameTarget> {
    if let Some(local) = module.locals.get(name) {
        return Some(NameTarget::Internal(local.clone()));
    }

    if let Some(package) = qualified::parent(&module.qn) {
        for (qn, sibling) in &table.modules {
            if qn == &module.qn || qualified::parent(qn) != Some(package) {
                continue;
            }
            if let Some(local) = sibling.locals.get(name) {
                return Some(NameTarget::Internal(local.clone()));
            }
        }
    }

    match module.imports.get(name) {
        Some(ImportTarget::Internal(qn)) => {
            if let Some(kind) = table.kind_of(qn) {
                return Some(NameTarget::Internal(SymbolRef {
                    qn: qn.clone(),
                    kind,
                }));
            }
            // An imported item the defining module re-exports or defines
            // under a different shape; fall back to its module's table.
            if let (Some(parent), last) = (qualified::parent(qn), qualified::last_segment(qn)) {
                if let Some(local) = table.modules.get(parent).and_then(|m| m.locals.get(last)) {
                    return Some(NameTarget::Internal(local.clone()));
                }
            }
            None
        }
        Some(ImportTarget::External(root)) => Some(NameTarget::External(root.clone())),
        None => {
            for source in &module.wildcard_sources {
                if let Some(local) = table.modules.get(source).and_then(|m| m.locals.get(name)) {
                    return Some(NameTarget::Internal(local.clone()));
                }
            }
            None
        }
    }
}

/// Strips reference, pointer, and generic noise off an annotated type name.
fn sanitize_type(raw: &str) -> &str {
    let raw = raw.trim().trim_start_matches(':').trim();
    let raw = raw
        .trim_start_matches("dyn ")
        .trim_start_matches("impl ")
        .trim_start_matches("const ")
        .trim_start_matches("mut ");
    let raw = raw.trim_start_matches(['&', '*']).trim();
    let raw = raw.split('<').next().unwrap_or(raw);
    let raw = raw.split('[').next().unwrap_or(raw);
    raw.trim()
}

/// Per-module tracker over the outline's recorded bindings.
pub struct TypeTracker<'a> {
    table: &'a SymbolTable,
    module: &'a ModuleInfo,
    bindings: &'a [LocalBinding],
}

impl<'a> TypeTracker<'a> {
    pub fn new(table: &'a SymbolTable, module: &'a ModuleInfo, outline: &'a FileOutline) -> Self {
        Self {
            table,
            module,
            bindings: &outline.bindings,
        }
    }

    /// Class qualified name an identifier refers to at a call site inside
    /// `scope`, or `None` when no confident binding exists.
    pub fn type_of(&self, scope: &[String], name: &str) -> Option<String> {
        if matches!(name, "self" | "this" | "cls") {
            return self.enclosing_class(scope);
        }

        // Innermost visible binding wins: longest scope prefix, then the
        // latest line within it.
        let mut best: Option<(&LocalBinding, usize)> = None;
        for binding in self.bindings {
            if binding.name != name || !is_prefix(&binding.scope, scope) {
                continue;
            }
            let depth = binding.scope.len();
            let better = match best {
                Some((current, current_depth)) => {
                    depth > current_depth
                        || (depth == current_depth && binding.line >= current.line)
                }
                None => true,
            };
            if better {
                best = Some((binding, depth));
            }
        }
        let (binding, _) = best?;

        match &binding.source {
            BindingSource::Annotation { type_name } => {
                self.class_by_name(sanitize_type(type_name))
            }
            BindingSource::Call { path } => {
                let root = path.first()?;
                match resolve_name(self.table, self.module, root)? {
                    NameTarget::Internal(SymbolRef {
                        qn,
                        kind: SymbolKind::Class,
                    }) => Some(qn),
                    NameTarget::Internal(SymbolRef {
                        qn,
                        kind: SymbolKind::Module,
                    }) => class_exported_as(self.table, &qn, root),
                    _ => None,
                }
            }
        }
    }

    /// Innermost class the scope chain sits inside (`self` / `this`).
    pub fn enclosing_class(&self, scope: &[String]) -> Option<String> {
        for take in (1..=scope.len()).rev() {
            let candidate = qualified::join(&self.module.qn, &scope[..take].join("."));
            if self.table.classes.contains_key(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    fn class_by_name(&self, name: &str) -> Option<String> {
        let dotted = name.replace("::", ".");
        let root = qualified::root(&dotted);
        match resolve_name(self.table, self.module, root)? {
            NameTarget::Internal(SymbolRef {
                qn,
                kind: SymbolKind::Class,
            }) => Some(qn),
            NameTarget::Internal(SymbolRef {
                qn,
                kind: SymbolKind::Module,
            }) => {
                let rest = dotted.strip_prefix(root)?.trim_start_matches('.');
                let candidate = qualified::join(&qn, rest);
                self.table.classes.contains_key(&candidate).then_some(candidate)
            }
            _ => None,
        }
    }
}

fn is_prefix(prefix: &[String], scope: &[String]) -> bool {
    prefix.len() <= scope.len() && prefix.iter().zip(scope).all(|(a, b)| a == b)
}

/// A module imported under `name` that defines a class of the same bare
/// name (the Lua `return Storage` idiom, Python re-exports).
pub fn class_exported_as(table: &SymbolTable, module_qn: &str, name: &str) -> Option<String> {
    match table.modules.get(module_qn)?.locals.get(name) {
        Some(SymbolRef {
            qn,
            kind: SymbolKind::Class,
        }) => Some(qn.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use codegraph_core::config::LanguageFilter;
    use codegraph_parsers::registry::ParserRegistry;
    use codegraph_parsers::strategy::{all_strategies, strategy_for};

    use crate::definitions::{link_members, merge_outline};

    fn setup(files: &[(&str, &str, &str)]) -> (SymbolTable, Vec<(String, FileOutline)>) {
        let registry = ParserRegistry::load(&LanguageFilter::default());
        let mut table = SymbolTable::new("proj");
        let mut outlines = Vec::new();
        for (rel, lang, source) in files {
            let strategy = strategy_for(lang).unwrap();
            let tree = registry.parse(lang, source, 0).unwrap();
            let entry = registry.get(lang).unwrap();
            let outline = strategy.outline(&tree, source, Path::new(rel), &entry.queries);
            let module_qn = format!("proj.{}", strategy.module_path(Path::new(rel)).join("."));
            merge_outline(&mut table, &module_qn, &outline);
            outlines.push((module_qn, outline));
        }
        link_members(&mut table, &all_strategies());
        (table, outlines)
    }

    #[test]
    fn test_ctor_assignment_binds_instance() {
        let (table, outlines) = setup(&[(
            "a.py",
            "python",
            "class C:\n    def run(self): pass\n\ndef main():\n    x = C()\n    x.run()\n",
        )]);
        let (module_qn, outline) = &outlines[0];
        let module = table.module(module_qn).unwrap();
        let tracker = TypeTracker::new(&table, module, outline);
        assert_eq!(
            tracker.type_of(&["main".to_string()], "x"),
            Some("proj.a.C".to_string())
        );
    }

    #[test]
    fn test_self_binds_enclosing_class() {
        let (table, outlines) = setup(&[(
            "a.py",
            "python",
            "class C:\n    def helper(self): pass\n    def run(self):\n        self.helper()\n",
        )]);
        let (module_qn, outline) = &outlines[0];
        let module = table.module(module_qn).unwrap();
        let tracker = TypeTracker::new(&table, module, outline);
        assert_eq!(
            tracker.type_of(&["C".to_string(), "run".to_string()], "self"),
            Some("proj.a.C".to_string())
        );
    }

    #[test]
    fn test_annotation_binding_rust_reference() {
        let (table, outlines) = setup(&[(
            "f.rs",
            "rust",
            "struct Point;\nimpl Point {\n    fn fmt(&self) {}\n}\nfn show(p: &Point) { p.fmt(); }\n",
        )]);
        let (module_qn, outline) = &outlines[0];
        let module = table.module(module_qn).unwrap();
        let tracker = TypeTracker::new(&table, module, outline);
        assert_eq!(
            tracker.type_of(&["show".to_string()], "p"),
            Some("proj.f.Point".to_string())
        );
    }

    #[test]
    fn test_unbound_stays_unbound() {
        let (table, outlines) = setup(&[(
            "a.py",
            "python",
            "def main(x):\n    x.run()\n",
        )]);
        let (module_qn, outline) = &outlines[0];
        let module = table.module(module_qn).unwrap();
        let tracker = TypeTracker::new(&table, module, outline);
        assert_eq!(tracker.type_of(&["main".to_string()], "x"), None);
    }

    #[test]
    fn test_factory_call_on_class_binds() {
        let (table, outlines) = setup(&[
            (
                "storage/Storage.lua",
                "lua",
                "local Storage = {}\nfunction Storage:getInstance()\nend\nfunction Storage:save(k)\nend\n",
            ),
            (
                "main.lua",
                "lua",
                "local Storage = require('storage.Storage')\nfunction run()\n    local s = Storage:getInstance()\n    s:save('k')\nend\n",
            ),
        ]);
        let mut packages = std::collections::HashSet::new();
        packages.insert(String::new());
        let mut table = table;
        let res = crate::imports::resolve_imports(
            &mut table,
            &outlines,
            &packages,
            &Default::default(),
            &all_strategies(),
        );
        drop(res);
        let (module_qn, outline) = &outlines[1];
        let module = table.module(module_qn).unwrap();
        let tracker = TypeTracker::new(&table, module, outline);
        // `Storage` resolves through the require to the module; its class
        // shares the bare name, so the factory call binds `s` to it.
        assert_eq!(
            tracker.type_of(&["run".to_string()], "s"),
            Some("proj.storage.Storage.Storage".to_string())
        );
    }
}
