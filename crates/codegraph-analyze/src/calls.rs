//! Call resolution: the second pass, run only after every file's
//! definitions are in the symbol table.
//!
//! Resolution order per site: direct qualified lookup, then method dispatch
//! through the type tracker with an inheritance walk, then the constructor
//! rule. Failures drop the edge — never a dangling target.

use codegraph_core::qualified;
use codegraph_core::types::{NodeLabel, NodeRef, RelKind, RelRecord};
use codegraph_parsers::outline::{CallSite, FileOutline};

use crate::symbols::{SymbolKind, SymbolRef, SymbolTable};
use crate::tracker::{class_exported_as, resolve_name, NameTarget, TypeTracker};

/// Output of resolving one module's call sites.
#[derive(Debug, Default)]
pub struct CallResolution {
    pub rels: Vec<RelRecord>,
    pub unresolved: u64,
}

fn label_for(kind: SymbolKind) -> NodeLabel {
    match kind {
        SymbolKind::Module => NodeLabel::Module,
        SymbolKind::Class => NodeLabel::Class,
        SymbolKind::Function => NodeLabel::Function,
        SymbolKind::Method => NodeLabel::Method,
    }
}

enum Outcome {
    /// Concrete targets; overload sets expand to one edge per member.
    Targets(Vec<(NodeLabel, String)>),
    /// Resolved into an external package; no edge by policy.
    External,
    Unresolved,
}

/// Expands a callable qn into its overload set as edge targets.
fn callable_targets(table: &SymbolTable, qn: &str) -> Vec<(NodeLabel, String)> {
    table
        .overload_set(qn)
        .into_iter()
        .map(|member| {
            let label = if table.methods.contains(&member) {
                NodeLabel::Method
            } else {
                NodeLabel::Function
            };
            (label, member)
        })
        .collect()
}

/// The constructor rule: a class target becomes its constructor when one
/// exists, the class itself otherwise.
fn constructor_targets(table: &SymbolTable, class_qn: &str) -> Vec<(NodeLabel, String)> {
    match table.classes.get(class_qn).and_then(|c| c.constructor.clone()) {
        Some(ctor) => callable_targets(table, &ctor),
        None => vec![(NodeLabel::Class, class_qn.to_string())],
    }
}

fn dispatch_on_class(table: &SymbolTable, class_qn: &str, method: &str) -> Outcome {
    if let Some(method_qn) = table.find_method(class_qn, method) {
        return Outcome::Targets(callable_targets(table, &method_qn));
    }
    Outcome::Unresolved
}

fn resolve_site(
    table: &SymbolTable,
    module_qn: &str,
    tracker: &TypeTracker<'_>,
    site: &CallSite,
) -> Outcome {
    let module = match table.modules.get(module_qn) {
        Some(m) => m,
        None => return Outcome::Unresolved,
    };

    if site.path.len() == 1 {
        let name = &site.path[0];
        return match resolve_name(table, module, name) {
            Some(NameTarget::Internal(SymbolRef { qn, kind })) => match kind {
                SymbolKind::Function | SymbolKind::Method => {
                    Outcome::Targets(callable_targets(table, &qn))
                }
                SymbolKind::Class => Outcome::Targets(constructor_targets(table, &qn)),
                SymbolKind::Module => Outcome::Unresolved,
            },
            Some(NameTarget::External(_)) => Outcome::External,
            None => Outcome::Unresolved,
        };
    }

    let root = &site.path[0];
    let method = site.path.last().expect("non-empty call path");
    let middle = &site.path[1..site.path.len() - 1];

    // Receiver typed by the tracker (`self`, locals bound to instances).
    if let Some(class_qn) = tracker.type_of(&site.scope, root) {
        if middle.is_empty() {
            return dispatch_on_class(table, &class_qn, method);
        }
    }

    match resolve_name(table, module, root) {
        Some(NameTarget::Internal(SymbolRef { qn, kind })) => match kind {
            SymbolKind::Class if middle.is_empty() => dispatch_on_class(table, &qn, method),
            SymbolKind::Class => {
                let nested = qualified::join(&qn, &middle.join("."));
                if table.classes.contains_key(&nested) {
                    dispatch_on_class(table, &nested, method)
                } else {
                    Outcome::Unresolved
                }
            }
            SymbolKind::Module => {
                // The Lua/JS idiom: a module imported under the name of the
                // class it exports dispatches straight onto that class.
                if middle.is_empty() {
                    if let Some(class_qn) = class_exported_as(table, &qn, root) {
                        if let outcome @ Outcome::Targets(_) =
                            dispatch_on_class(table, &class_qn, method)
                        {
                            return outcome;
                        }
                    }
                }
                // Walk the dotted remainder through modules and classes.
                let mut current = qn;
                for seg in middle {
                    let candidate = qualified::join(&current, seg);
                    if table.modules.contains_key(&candidate)
                        || table.classes.contains_key(&candidate)
                    {
                        current = candidate;
                    } else {
                        return Outcome::Unresolved;
                    }
                }
                if table.classes.contains_key(&current) {
                    return dispatch_on_class(table, &current, method);
                }
                match table.modules.get(&current).and_then(|m| m.locals.get(method.as_str()))
                {
                    Some(SymbolRef {
                        qn,
                        kind: SymbolKind::Class,
                    }) => Outcome::Targets(constructor_targets(table, qn)),
                    Some(SymbolRef { qn, .. }) => Outcome::Targets(callable_targets(table, qn)),
                    None => Outcome::Unresolved,
                }
            }
            SymbolKind::Function | SymbolKind::Method => Outcome::Unresolved,
        },
        Some(NameTarget::External(_)) => Outcome::External,
        None => Outcome::Unresolved,
    }
}

/// Resolves every call site recorded for one module. Pure reads of the
/// symbol table; safe to run in parallel across modules.
pub fn resolve_calls(
    table: &SymbolTable,
    module_qn: &str,
    outline: &FileOutline,
) -> CallResolution {
    let mut out = CallResolution::default();
    let Some(module) = table.modules.get(module_qn) else {
        return out;
    };
    let tracker = TypeTracker::new(table, module, outline);

    for site in &outline.calls {
        // The caller must exist as a node: the enclosing definition, or the
        // module itself for top-level code.
        let (caller_label, caller_qn) = if site.scope.is_empty() {
            (NodeLabel::Module, module_qn.to_string())
        } else {
            let qn = qualified::join(module_qn, &site.scope.join("."));
            match table.kind_of(&qn) {
                Some(kind) => (label_for(kind), qn),
                None => {
                    tracing::debug!(caller = %qn, "call site in unknown scope, skipped");
                    out.unresolved += 1;
                    continue;
                }
            }
        };

        match resolve_site(table, module_qn, &tracker, site) {
            Outcome::Targets(targets) => {
                for (label, target_qn) in targets {
                    out.rels.push(
                        RelRecord::new(
                            NodeRef::new(caller_label, caller_qn.clone()),
                            RelKind::Calls,
                            NodeRef::new(label, target_qn),
                        )
                        .with("line", site.line),
                    );
                }
            }
            Outcome::External => {
                tracing::debug!(
                    module = %module_qn,
                    callee = %site.path.join("."),
                    "call into external package, no edge"
                );
            }
            Outcome::Unresolved => {
                tracing::debug!(
                    module = %module_qn,
                    callee = %site.path.join("."),
                    line = site.line,
                    "unresolved call"
                );
                out.unresolved += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::Path;

    use codegraph_core::config::LanguageFilter;
    use codegraph_parsers::registry::ParserRegistry;
    use codegraph_parsers::strategy::{all_strategies, strategy_for};

    use crate::definitions::{link_members, merge_outline};
    use crate::imports::resolve_imports;

    fn setup(
        files: &[(&str, &str, &str)],
        packages: &[&str],
    ) -> (SymbolTable, Vec<(String, FileOutline)>) {
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
        let package_set: HashSet<String> =
            packages.iter().map(|p| format!("proj.{p}")).collect();
        resolve_imports(
            &mut table,
            &outlines,
            &package_set,
            &Default::default(),
            &all_strategies(),
        );
        crate::hierarchy::resolve_hierarchy(&mut table);
        (table, outlines)
    }

    fn calls_for(table: &SymbolTable, outlines: &[(String, FileOutline)]) -> Vec<(String, String)> {
        let mut edges = Vec::new();
        for (module_qn, outline) in outlines {
            let res = resolve_calls(table, module_qn, outline);
            edges.extend(
                res.rels
                    .into_iter()
                    .map(|r| (r.source.key, r.target.key)),
            );
        }
        edges
    }

    #[test]
    fn test_cross_module_python_call() {
        let (table, outlines) = setup(
            &[
                ("pkg/__init__.py", "python", ""),
                ("pkg/a.py", "python", "def hello(): pass\n"),
                (
                    "pkg/b.py",
                    "python",
                    "from .a import hello\ndef main(): hello()\n",
                ),
            ],
            &["pkg"],
        );
        let edges = calls_for(&table, &outlines);
        assert!(edges.contains(&("proj.pkg.b.main".to_string(), "proj.pkg.a.hello".to_string())));
    }

    #[test]
    fn test_method_dispatch_through_tracker() {
        let (table, outlines) = setup(
            &[(
                "a.py",
                "python",
                "class C:\n    def run(self): pass\n\ndef main():\n    x = C()\n    x.run()\n",
            )],
            &[],
        );
        let edges = calls_for(&table, &outlines);
        assert!(edges.contains(&("proj.a.main".to_string(), "proj.a.C.run".to_string())));
        // The constructor-less class call targets the class itself.
        assert!(edges.contains(&("proj.a.main".to_string(), "proj.a.C".to_string())));
    }

    #[test]
    fn test_inherited_method_dispatch_and_unresolved_drop() {
        let (table, outlines) = setup(
            &[(
                "a.py",
                "python",
                "class Base:\n    def run(self): pass\nclass Child(Base):\n    pass\n\ndef main():\n    c = Child()\n    c.run()\n    c.missing()\n",
            )],
            &[],
        );
        let (module_qn, outline) = &outlines[0];
        let res = resolve_calls(&table, module_qn, outline);
        let edges: Vec<_> = res
            .rels
            .iter()
            .map(|r| (r.source.key.as_str(), r.target.key.as_str()))
            .collect();
        assert!(edges.contains(&("proj.a.main", "proj.a.Base.run")));
        assert!(!edges.iter().any(|(_, t)| t.ends_with("missing")));
        assert_eq!(res.unresolved, 1);
    }

    #[test]
    fn test_lua_singleton_dispatch_across_files() {
        let (table, outlines) = setup(
            &[
                (
                    "storage/Storage.lua",
                    "lua",
                    "local Storage = {}\nfunction Storage:getInstance()\nend\nfunction Storage:save(k, v)\nend\nfunction Storage:load(k)\nend\n",
                ),
                (
                    "controllers/Ctrl.lua",
                    "lua",
                    "local Storage = require('storage.Storage')\nlocal Ctrl = {}\nfunction Ctrl:loadScene()\n    local s = Storage:getInstance()\n    s:save('k', 'v')\n    return s:load('k')\nend\n",
                ),
            ],
            &[],
        );
        let edges = calls_for(&table, &outlines);
        let caller = "proj.controllers.Ctrl.Ctrl:loadScene".to_string();
        assert!(edges.contains(&(
            caller.clone(),
            "proj.storage.Storage.Storage:getInstance".to_string()
        )));
        assert!(edges.contains(&(caller.clone(), "proj.storage.Storage.Storage:save".to_string())));
        assert!(edges.contains(&(caller, "proj.storage.Storage.Storage:load".to_string())));
    }

    #[test]
    fn test_rust_trait_method_through_impl() {
        let (table, outlines) = setup(
            &[(
                "f.rs",
                "rust",
                "trait Display { fn fmt(&self) -> String; }\nstruct Point;\nimpl Display for Point {\n    fn fmt(&self) -> String { String::new() }\n}\nfn show(p: &Point) { p.fmt(); }\n",
            )],
            &[],
        );
        let edges = calls_for(&table, &outlines);
        assert!(edges.contains(&("proj.f.show".to_string(), "proj.f.Point.fmt".to_string())));
    }

    #[test]
    fn test_cpp_out_of_class_method_call() {
        let (table, outlines) = setup(
            &[(
                "calc.cpp",
                "cpp",
                "class Calculator {\npublic:\n    int add(int a, int b);\n};\nint Calculator::add(int a, int b) { return a + b; }\nvoid use() {\n    Calculator c;\n    c.add(1, 2);\n}\n",
            )],
            &[],
        );
        let edges = calls_for(&table, &outlines);
        assert!(edges.contains(&(
            "proj.calc.use".to_string(),
            "proj.calc.Calculator.add".to_string()
        )));
    }

    #[test]
    fn test_external_call_emits_nothing() {
        let (table, outlines) = setup(
            &[(
                "f.rs",
                "rust",
                "use std::collections::HashMap;\nfn f() { let _m: HashMap<i32, i32> = HashMap::new(); }\n",
            )],
            &[],
        );
        let (module_qn, outline) = &outlines[0];
        let res = resolve_calls(&table, module_qn, outline);
        assert!(res.rels.is_empty());
        assert_eq!(res.unresolved, 0);
    }

    #[test]
    fn test_commonjs_destructured_call() {
        let (table, outlines) = setup(
            &[
                ("a.js", "javascript", "exports.read = function(p) {};\n"),
                (
                    "b.js",
                    "javascript",
                    "const { read } = require('./a');\nfunction main(p) { read(p); }\n",
                ),
            ],
            &[],
        );
        let edges = calls_for(&table, &outlines);
        assert!(edges.contains(&("proj.b.main".to_string(), "proj.a.read".to_string())));
    }

    #[test]
    fn test_overload_set_gets_edge_per_member() {
        let (table, outlines) = setup(
            &[(
                "calc.cpp",
                "cpp",
                "int add(int a) { return a; }\nint add(int a, int b) { return a + b; }\nvoid use() { add(1); }\n",
            )],
            &[],
        );
        let edges = calls_for(&table, &outlines);
        let add_edges: Vec<_> = edges
            .iter()
            .filter(|(s, t)| s == "proj.calc.use" && t.starts_with("proj.calc.add"))
            .collect();
        assert_eq!(add_edges.len(), 2);
    }
}
