//! Python strategy: scoping via `class`/`def` nesting, dotted and relative
//! imports, decorator capture, docstrings.

use std::path::Path;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor, Tree};

use crate::outline::{
    callee_path, directly_in_class, end_line, node_text, scope_chain, scope_names, start_line,
    BaseClause, BaseKind, BindingSource, CallSite, DefKind, FileOutline, ImportItem, ImportStmt,
    LocalBinding, OutlineDef, ScopeSeg,
};
use crate::registry::QuerySet;
use crate::strategy::LanguageStrategy;

const STDLIB_ROOTS: &[&str] = &[
    "abc", "argparse", "asyncio", "collections", "contextlib", "copy", "csv", "dataclasses",
    "datetime", "enum", "functools", "glob", "hashlib", "io", "itertools", "json", "logging",
    "math", "os", "pathlib", "pickle", "random", "re", "shutil", "socket", "sqlite3", "string",
    "subprocess", "sys", "tempfile", "threading", "time", "typing", "unittest", "urllib", "uuid",
];

pub struct PythonStrategy;

fn segment(node: Node<'_>, src: &[u8]) -> Option<ScopeSeg> {
    match node.kind() {
        "class_definition" => Some(ScopeSeg {
            name: node_text(node.child_by_field_name("name")?, src).to_string(),
            class_like: true,
        }),
        "function_definition" => Some(ScopeSeg {
            name: node_text(node.child_by_field_name("name")?, src).to_string(),
            class_like: false,
        }),
        _ => None,
    }
}

/// Decorator lines attached via a wrapping `decorated_definition`.
fn decorators_of(def_node: Node<'_>, src: &[u8]) -> Vec<String> {
    let Some(parent) = def_node.parent() else {
        return vec![];
    };
    if parent.kind() != "decorated_definition" {
        return vec![];
    }
    let mut cursor = parent.walk();
    parent
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "decorator")
        .map(|c| node_text(c, src).trim_start_matches('@').trim().to_string())
        .collect()
}

/// Leading string expression of a block, with quotes stripped.
fn docstring_of(body: Node<'_>, src: &[u8]) -> Option<String> {
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let inner = first.named_child(0)?;
    if inner.kind() != "string" {
        return None;
    }
    let raw = node_text(inner, src);
    let trimmed = raw
        .trim_start_matches(['r', 'b', 'u', 'f', 'R', 'B', 'U', 'F'])
        .trim_matches(|c| c == '"' || c == '\'');
    Some(trimmed.trim().to_string())
}

fn is_async_def(def_node: Node<'_>) -> bool {
    def_node
        .child(0)
        .is_some_and(|c| c.kind() == "async")
}

/// Splits a base list `(A, B, metaclass=M)` into inheritance clauses,
/// dropping keyword arguments.
fn parse_bases(raw: &str) -> Vec<BaseClause> {
    raw.trim_matches(|c| c == '(' || c == ')')
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.contains('=') && *s != "object")
        .map(|s| BaseClause {
            name: s.replace("::", "."),
            kind: BaseKind::Inherits,
        })
        .collect()
}

/// Parses one import statement's text into normalized entries.
fn parse_import(text: &str, line: u32) -> Vec<ImportStmt> {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix("from ") {
        let Some((module_part, names_part)) = rest.split_once(" import ") else {
            return vec![];
        };
        let module_part = module_part.trim();
        let relative_level = module_part.chars().take_while(|&c| c == '.').count() as u32;
        let module = module_part.trim_start_matches('.').to_string();
        let names_part = names_part
            .trim()
            .trim_matches(|c| c == '(' || c == ')')
            .replace(['\n', '\\'], " ");
        let mut stmt = ImportStmt {
            module,
            relative_level,
            module_alias: None,
            items: vec![],
            wildcard: false,
            line,
            display: text.to_string(),
        };
        for part in names_part.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if part == "*" {
                stmt.wildcard = true;
                continue;
            }
            let (name, alias) = match part.split_once(" as ") {
                Some((n, a)) => (n.trim().to_string(), Some(a.trim().to_string())),
                None => (part.to_string(), None),
            };
            stmt.items.push(ImportItem { name, alias });
        }
        return vec![stmt];
    }
    if let Some(rest) = text.strip_prefix("import ") {
        return rest
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|part| {
                let (module, alias) = match part.split_once(" as ") {
                    Some((m, a)) => (m.trim().to_string(), Some(a.trim().to_string())),
                    None => (part.to_string(), None),
                };
                ImportStmt {
                    module,
                    relative_level: 0,
                    module_alias: alias,
                    items: vec![],
                    wildcard: false,
                    line,
                    display: part.to_string(),
                }
            })
            .collect();
    }
    vec![]
}

impl LanguageStrategy for PythonStrategy {
    fn language(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn package_signal(&self, dir: &Path) -> bool {
        dir.join("__init__.py").exists()
    }

    fn module_path(&self, rel_path: &Path) -> Vec<String> {
        let mut segs = crate::strategy::default_module_path(rel_path);
        if segs.last().is_some_and(|s| s == "__init__") {
            segs.pop();
        }
        segs
    }

    fn constructor_names(&self) -> &'static [&'static str] {
        &["__init__"]
    }

    fn stdlib_root(&self, module_path: &str) -> Option<String> {
        let root = module_path.split('.').next()?;
        STDLIB_ROOTS
            .contains(&root)
            .then(|| module_path.to_string())
    }

    fn outline(
        &self,
        tree: &Tree,
        source: &str,
        rel_path: &Path,
        queries: &QuerySet,
    ) -> FileOutline {
        let src = source.as_bytes();
        let root = tree.root_node();
        let mut out = FileOutline {
            language: "python",
            rel_path: rel_path.to_path_buf(),
            had_parse_errors: root.has_error(),
            line_count: source.lines().count().max(1) as u32,
            ..Default::default()
        };

        let defs = &queries.definitions;
        let cap_names = defs.capture_names();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(defs, root, src);
        while let Some(m) = matches.next() {
            let mut def_node = None;
            let mut name = None;
            let mut bases_raw = None;
            let mut body = None;
            let mut is_class = false;
            for cap in m.captures {
                match cap_names[cap.index as usize] {
                    "def.class" => {
                        def_node = Some(cap.node);
                        is_class = true;
                    }
                    "def.func" => def_node = Some(cap.node),
                    "def.class.name" | "def.func.name" => {
                        name = Some(node_text(cap.node, src).to_string());
                    }
                    "def.class.bases" => bases_raw = Some(node_text(cap.node, src).to_string()),
                    "def.class.body" | "def.func.body" => body = Some(cap.node),
                    _ => {}
                }
            }
            let (Some(node), Some(name)) = (def_node, name) else {
                continue;
            };
            let segs = scope_chain(node, src, segment);
            let decorators = decorators_of(node, src);
            let kind = if is_class {
                DefKind::Class
            } else if directly_in_class(&segs) {
                DefKind::Method
            } else {
                DefKind::Function
            };
            let mut def = OutlineDef::new(name, kind);
            def.scope = scope_names(&segs);
            def.start_line = start_line(node);
            def.end_line = end_line(node);
            def.is_async = !is_class && is_async_def(node);
            def.is_static = decorators.iter().any(|d| d.starts_with("staticmethod"));
            def.docstring = body.and_then(|b| docstring_of(b, src));
            def.decorators = decorators;
            if is_class {
                def.bases = bases_raw.as_deref().map(parse_bases).unwrap_or_default();
            }
            out.definitions.push(def);
        }

        let refs = &queries.references;
        let cap_names = refs.capture_names();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(refs, root, src);
        while let Some(m) = matches.next() {
            let mut call_node = None;
            let mut callee = None;
            let mut import_node = None;
            let mut bind_target = None;
            let mut bind_ctor = None;
            let mut param_node = None;
            let mut param_type = None;
            for cap in m.captures {
                match cap_names[cap.index as usize] {
                    "ref.call" => call_node = Some(cap.node),
                    "ref.call.callee" => callee = Some(node_text(cap.node, src).to_string()),
                    "ref.import" => import_node = Some(cap.node),
                    "bind.target" => bind_target = Some((cap.node, node_text(cap.node, src))),
                    "bind.ctor" => bind_ctor = Some(node_text(cap.node, src).to_string()),
                    "bind.param" => param_node = Some(cap.node),
                    "bind.param.type" => param_type = Some(node_text(cap.node, src).to_string()),
                    _ => {}
                }
            }
            if let (Some(node), Some(callee)) = (call_node, callee) {
                if let Some(path) = callee_path(&callee) {
                    let segs = scope_chain(node, src, segment);
                    out.calls.push(CallSite {
                        method_syntax: path.len() > 1,
                        path,
                        scope: scope_names(&segs),
                        line: start_line(node),
                        is_new: false,
                    });
                }
            }
            if let Some(node) = import_node {
                out.imports
                    .extend(parse_import(node_text(node, src), start_line(node)));
            }
            if let (Some((target_node, target)), Some(ctor)) = (bind_target, bind_ctor) {
                if let Some(path) = callee_path(&ctor) {
                    let segs = scope_chain(target_node, src, segment);
                    out.bindings.push(LocalBinding {
                        scope: scope_names(&segs),
                        name: target.to_string(),
                        source: BindingSource::Call { path },
                        line: start_line(target_node),
                    });
                }
            }
            if let (Some(node), Some(type_name)) = (param_node, param_type) {
                let raw = node_text(node, src);
                if let Some((pname, _)) = raw.split_once(':') {
                    let segs = scope_chain(node, src, segment);
                    out.bindings.push(LocalBinding {
                        scope: scope_names(&segs),
                        name: pname.trim().to_string(),
                        source: BindingSource::Annotation {
                            type_name: type_name.trim().to_string(),
                        },
                        line: start_line(node),
                    });
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::config::LanguageFilter;

    use crate::registry::ParserRegistry;

    fn outline_of(source: &str) -> FileOutline {
        let registry = ParserRegistry::load(&LanguageFilter::default());
        let tree = registry.parse("python", source, 0).unwrap();
        let entry = registry.get("python").unwrap();
        PythonStrategy.outline(&tree, source, Path::new("test.py"), &entry.queries)
    }

    #[test]
    fn test_function_and_nested_scope() {
        let out = outline_of("def outer():\n    def inner():\n        pass\n");
        let names: Vec<_> = out.definitions.iter().map(|d| d.local_path()).collect();
        assert!(names.contains(&"outer".to_string()));
        assert!(names.contains(&"outer.inner".to_string()));
    }

    #[test]
    fn test_method_detection() {
        let out = outline_of("class C:\n    def m(self):\n        pass\n");
        let m = out.definitions.iter().find(|d| d.name == "m").unwrap();
        assert_eq!(m.kind, DefKind::Method);
        assert_eq!(m.local_path(), "C.m");
    }

    #[test]
    fn test_class_bases_parsed() {
        let out = outline_of("class B(A, metaclass=M):\n    pass\n");
        let b = out.definitions.iter().find(|d| d.name == "B").unwrap();
        assert_eq!(b.bases.len(), 1);
        assert_eq!(b.bases[0].name, "A");
    }

    #[test]
    fn test_decorators_and_static() {
        let out = outline_of(
            "class C:\n    @staticmethod\n    def s():\n        pass\n",
        );
        let s = out.definitions.iter().find(|d| d.name == "s").unwrap();
        assert!(s.is_static);
        assert_eq!(s.decorators, vec!["staticmethod"]);
    }

    #[test]
    fn test_async_flag() {
        let out = outline_of("async def f():\n    pass\n");
        let f = out.definitions.iter().find(|d| d.name == "f").unwrap();
        assert!(f.is_async);
    }

    #[test]
    fn test_docstring_captured() {
        let out = outline_of("def f():\n    \"\"\"Does a thing.\"\"\"\n    pass\n");
        let f = out.definitions.iter().find(|d| d.name == "f").unwrap();
        assert_eq!(f.docstring.as_deref(), Some("Does a thing."));
    }

    #[test]
    fn test_import_forms() {
        let out = outline_of("import os\nimport foo as bar\nfrom .a import hello\nfrom pkg import x as y, z\nfrom m import *\n");
        assert_eq!(out.imports.len(), 5);
        assert_eq!(out.imports[0].module, "os");
        assert_eq!(out.imports[1].module_alias.as_deref(), Some("bar"));
        assert_eq!(out.imports[2].relative_level, 1);
        assert_eq!(out.imports[2].module, "a");
        assert_eq!(out.imports[2].items[0].name, "hello");
        assert_eq!(out.imports[3].items[1].name, "z");
        assert_eq!(out.imports[3].items[0].alias.as_deref(), Some("y"));
        assert!(out.imports[4].wildcard);
    }

    #[test]
    fn test_calls_recorded_with_scope() {
        let out = outline_of("def main():\n    hello()\n    obj.save()\n");
        assert_eq!(out.calls.len(), 2);
        assert_eq!(out.calls[0].path, vec!["hello"]);
        assert_eq!(out.calls[0].scope, vec!["main"]);
        assert!(out.calls[1].method_syntax);
    }

    #[test]
    fn test_dynamic_access_skipped() {
        let out = outline_of("def f(o, n):\n    getattr(o, n)()\n    o[n]()\n");
        // Only the getattr(...) inner call itself survives; the dynamic
        // outer calls are dropped.
        assert!(out
            .calls
            .iter()
            .all(|c| c.path.iter().all(|s| !s.contains('('))));
    }

    #[test]
    fn test_ctor_binding_recorded() {
        let out = outline_of("def f():\n    x = C()\n    x.run()\n");
        assert_eq!(out.bindings.len(), 1);
        assert_eq!(out.bindings[0].name, "x");
        assert_eq!(
            out.bindings[0].source,
            BindingSource::Call {
                path: vec!["C".to_string()]
            }
        );
    }

    #[test]
    fn test_module_path_collapses_init() {
        let strategy = PythonStrategy;
        assert_eq!(
            strategy.module_path(Path::new("pkg/__init__.py")),
            vec!["pkg".to_string()]
        );
        assert_eq!(
            strategy.module_path(Path::new("pkg/a.py")),
            vec!["pkg".to_string(), "a".to_string()]
        );
    }

    #[test]
    fn test_stdlib_root() {
        let strategy = PythonStrategy;
        assert_eq!(strategy.stdlib_root("os.path"), Some("os.path".to_string()));
        assert_eq!(strategy.stdlib_root("requests"), None);
    }
}
