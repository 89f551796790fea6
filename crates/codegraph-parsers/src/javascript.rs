//! JavaScript strategy: ES classes, CommonJS and ESM imports, prototype and
//! `exports.*` assignment methods, IIFE anonymous functions.

use std::path::Path;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor, Tree};

use codegraph_core::qualified::anon_name;

use crate::outline::{
    callee_path, directly_in_class, end_line, node_text, scope_chain, scope_names, start_col,
    start_line, strip_quotes, BaseClause, BaseKind, BindingSource, CallSite, DefKind, FileOutline,
    ImportItem, ImportStmt, LocalBinding, OutlineDef, ScopeSeg,
};
use crate::registry::QuerySet;
use crate::strategy::LanguageStrategy;

const STDLIB_ROOTS: &[&str] = &[
    "assert", "buffer", "child_process", "crypto", "events", "fs", "http", "https", "net", "os",
    "path", "process", "readline", "stream", "url", "util", "zlib",
];

pub struct JavaScriptStrategy;

pub(crate) fn segment(node: Node<'_>, src: &[u8]) -> Option<ScopeSeg> {
    match node.kind() {
        "class_declaration" | "abstract_class_declaration" | "interface_declaration"
        | "enum_declaration" | "class" => Some(ScopeSeg {
            name: node
                .child_by_field_name("name")
                .map(|n| node_text(n, src).to_string())
                .unwrap_or_else(|| anon_name(start_line(node), start_col(node))),
            class_like: true,
        }),
        "function_declaration" | "generator_function_declaration" | "method_definition" => {
            Some(ScopeSeg {
                name: node
                    .child_by_field_name("name")
                    .map(|n| node_text(n, src).to_string())
                    .unwrap_or_else(|| anon_name(start_line(node), start_col(node))),
                class_like: false,
            })
        }
        "function_expression" | "arrow_function" => Some(ScopeSeg {
            name: function_value_name(node, src),
            class_like: false,
        }),
        _ => None,
    }
}

/// Name for a function-valued expression: the enclosing declarator or
/// assignment target when there is one, otherwise a synthetic anon name.
pub(crate) fn function_value_name(node: Node<'_>, src: &[u8]) -> String {
    if let Some(parent) = node.parent() {
        match parent.kind() {
            "variable_declarator" => {
                if let Some(name) = parent.child_by_field_name("name") {
                    return node_text(name, src).to_string();
                }
            }
            "assignment_expression" => {
                if let Some(left) = parent.child_by_field_name("left") {
                    let raw = node_text(left, src);
                    // Mirror the definition's shape so call sites inside the
                    // body attribute to the same qualified name.
                    if let Some((scope, name, _)) = classify_assign_target(raw) {
                        return scope
                            .into_iter()
                            .chain([name])
                            .collect::<Vec<_>>()
                            .join(".");
                    }
                    if let Some(last) = raw.rsplit('.').next() {
                        return last.to_string();
                    }
                }
            }
            "pair" => {
                if let Some(key) = parent.child_by_field_name("key") {
                    return node_text(key, src).to_string();
                }
            }
            _ => {}
        }
    }
    anon_name(start_line(node), start_col(node))
}

/// `extends`/`implements` clauses from a class node's heritage child.
pub(crate) fn heritage_of(class_node: Node<'_>, src: &[u8]) -> Vec<BaseClause> {
    let mut bases = Vec::new();
    let mut cursor = class_node.walk();
    for child in class_node.named_children(&mut cursor) {
        if child.kind() != "class_heritage" {
            continue;
        }
        let raw = node_text(child, src);
        for (keyword, kind) in [
            ("extends", BaseKind::Inherits),
            ("implements", BaseKind::Implements),
        ] {
            if let Some(idx) = raw.find(keyword) {
                let tail = &raw[idx + keyword.len()..];
                let tail = tail.split("implements").next().unwrap_or(tail);
                for name in tail.split(',') {
                    let name = name.trim().split('<').next().unwrap_or("").trim();
                    if !name.is_empty()
                        && name
                            .chars()
                            .all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '$')
                    {
                        bases.push(BaseClause {
                            name: name.to_string(),
                            kind,
                        });
                    }
                }
            }
        }
    }
    bases
}

fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).any(|c| c.kind() == token);
    result
}

/// JS/TS module specifier → (dotted module path, relative level).
pub(crate) fn split_specifier(spec: &str) -> (String, u32) {
    let spec = spec.strip_prefix("node:").unwrap_or(spec);
    let mut rest = spec;
    let mut level = 0u32;
    if let Some(r) = rest.strip_prefix("./") {
        level = 1;
        rest = r;
    }
    while let Some(r) = rest.strip_prefix("../") {
        level += 1;
        rest = r;
    }
    let mut module = rest.trim_end_matches(".js").trim_end_matches(".mjs").replace('/', ".");
    if let Some(stripped) = module.strip_suffix(".index") {
        module = stripped.to_string();
    }
    (module, level)
}

/// Parses one ESM `import` statement's text.
pub(crate) fn parse_esm_import(text: &str, line: u32) -> Option<ImportStmt> {
    let text = text.trim().trim_end_matches(';');
    let rest = text.strip_prefix("import")?.trim();
    // Side-effect import: import 'm'
    if rest.starts_with('\'') || rest.starts_with('"') {
        let (module, level) = split_specifier(strip_quotes(rest));
        let mut stmt = ImportStmt::module_import(module, line);
        stmt.relative_level = level;
        stmt.display = text.to_string();
        return Some(stmt);
    }
    let (clause, source) = rest.split_once(" from ")?;
    let (module, level) = split_specifier(strip_quotes(source.trim()));
    let mut stmt = ImportStmt {
        module,
        relative_level: level,
        module_alias: None,
        items: vec![],
        wildcard: false,
        line,
        display: text.to_string(),
    };
    for part in clause.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some(ns) = part.strip_prefix("* as ") {
            stmt.module_alias = Some(ns.trim().to_string());
        } else if part.starts_with('{') || part.ends_with('}') || part.contains('{') {
            let inner = part.trim_matches(|c| c == '{' || c == '}' || c == ' ');
            for named in inner.split(',') {
                let named = named.trim();
                if named.is_empty() {
                    continue;
                }
                let (name, alias) = match named.split_once(" as ") {
                    Some((n, a)) => (n.trim().to_string(), Some(a.trim().to_string())),
                    None => (named.to_string(), None),
                };
                stmt.items.push(ImportItem { name, alias });
            }
        } else {
            // Default import binds the local name to the module itself.
            stmt.module_alias = Some(part.to_string());
        }
    }
    Some(stmt)
}

/// Parses the CommonJS `const X = require('m')` / destructured form.
pub(crate) fn parse_require(target: &str, source: &str, line: u32) -> ImportStmt {
    let (module, level) = split_specifier(strip_quotes(source));
    let mut stmt = ImportStmt {
        module,
        relative_level: level,
        module_alias: None,
        items: vec![],
        wildcard: false,
        line,
        display: format!("require({source})"),
    };
    let target = target.trim();
    if target.starts_with('{') {
        for named in target.trim_matches(|c| c == '{' || c == '}').split(',') {
            let named = named.trim();
            if named.is_empty() {
                continue;
            }
            let (name, alias) = match named.split_once(':') {
                Some((n, a)) => (n.trim().to_string(), Some(a.trim().to_string())),
                None => (named.to_string(), None),
            };
            stmt.items.push(ImportItem { name, alias });
        }
    } else {
        stmt.module_alias = Some(target.to_string());
    }
    stmt
}

/// Classifies an assignment-form definition target. Returns
/// `(scope_override, name, kind)`.
pub(crate) fn classify_assign_target(raw: &str) -> Option<(Vec<String>, String, DefKind)> {
    let segs: Vec<&str> = raw.split('.').map(str::trim).collect();
    match segs.as_slice() {
        ["exports", name] => Some((vec![], name.to_string(), DefKind::Function)),
        ["module", "exports", name] => Some((vec![], name.to_string(), DefKind::Function)),
        ["module", "exports"] => None,
        [class, "prototype", name] => {
            Some((vec![class.to_string()], name.to_string(), DefKind::Method))
        }
        [class, name]
            if class
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_uppercase()) =>
        {
            Some((vec![class.to_string()], name.to_string(), DefKind::Method))
        }
        _ => None,
    }
}

pub(crate) fn extract_outline(
    language: &'static str,
    tree: &Tree,
    source: &str,
    rel_path: &Path,
    queries: &QuerySet,
) -> FileOutline {
    let src = source.as_bytes();
    let root = tree.root_node();
    let mut out = FileOutline {
        language,
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
        let mut class_node = None;
        let mut class_name = None;
        let mut func_node = None;
        let mut func_name = None;
        let mut sig = false;
        let mut method_node = None;
        let mut method_name = None;
        let mut var_node = None;
        let mut var_name = None;
        let mut var_value = None;
        let mut assign_node = None;
        let mut assign_target = None;
        for cap in m.captures {
            match cap_names[cap.index as usize] {
                "def.class" => class_node = Some(cap.node),
                "def.class.name" => class_name = Some(node_text(cap.node, src).to_string()),
                "def.func" => func_node = Some(cap.node),
                "def.func.name" => func_name = Some(node_text(cap.node, src).to_string()),
                "def.func.sig" => {
                    func_node = Some(cap.node);
                    sig = true;
                }
                "def.func.sig.name" => func_name = Some(node_text(cap.node, src).to_string()),
                "def.method" | "def.method.sig" => method_node = Some(cap.node),
                "def.method.name" | "def.method.sig.name" => {
                    method_name = Some(node_text(cap.node, src).to_string());
                }
                "def.var" => var_node = Some(cap.node),
                "def.var.name" => var_name = Some(node_text(cap.node, src).to_string()),
                "def.var.value" => var_value = Some(cap.node),
                "def.assign" => assign_node = Some(cap.node),
                "def.assign.target" => assign_target = Some(node_text(cap.node, src).to_string()),
                _ => {}
            }
        }

        if let (Some(node), Some(name)) = (class_node, class_name) {
            let segs = scope_chain(node, src, segment);
            let mut def = OutlineDef::new(name, DefKind::Class);
            def.scope = scope_names(&segs);
            def.start_line = start_line(node);
            def.end_line = end_line(node);
            def.bases = heritage_of(node, src);
            out.definitions.push(def);
        } else if let (Some(node), Some(name)) = (method_node, method_name) {
            let segs = scope_chain(node, src, segment);
            let mut def = OutlineDef::new(name, DefKind::Method);
            def.scope = scope_names(&segs);
            def.start_line = start_line(node);
            def.end_line = end_line(node);
            def.is_static = has_token(node, "static");
            def.is_async = has_token(node, "async");
            out.definitions.push(def);
        } else if let (Some(node), Some(name)) = (func_node, func_name) {
            let segs = scope_chain(node, src, segment);
            let kind = if directly_in_class(&segs) {
                DefKind::Method
            } else {
                DefKind::Function
            };
            let mut def = OutlineDef::new(name, kind);
            def.scope = scope_names(&segs);
            def.start_line = start_line(node);
            def.end_line = end_line(node);
            def.is_async = has_token(node, "async");
            if sig {
                def.decorators.push("overload_signature".to_string());
            }
            out.definitions.push(def);
        } else if let (Some(node), Some(name), Some(value)) = (var_node, var_name, var_value) {
            let segs = scope_chain(node, src, segment);
            let mut def = OutlineDef::new(name, DefKind::Function);
            def.scope = scope_names(&segs);
            def.start_line = start_line(node);
            def.end_line = end_line(node);
            def.is_async = has_token(value, "async");
            out.definitions.push(def);
        } else if let (Some(node), Some(target)) = (assign_node, assign_target) {
            if let Some((scope_override, name, kind)) = classify_assign_target(&target) {
                let mut def = OutlineDef::new(name, kind);
                def.scope = scope_override;
                def.start_line = start_line(node);
                def.end_line = end_line(node);
                out.definitions.push(def);
            }
        }
    }

    let refs = &queries.references;
    let cap_names = refs.capture_names();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(refs, root, src);
    while let Some(m) = matches.next() {
        let mut call_node = None;
        let mut callee = None;
        let mut new_node = None;
        let mut new_callee = None;
        let mut import_node = None;
        let mut require_target = None;
        let mut require_fn = None;
        let mut require_source = None;
        let mut require_line = 0;
        let mut bind_target = None;
        let mut bind_ctor = None;
        let mut param_name = None;
        let mut param_node = None;
        let mut param_type = None;
        let mut ann_target = None;
        let mut ann_type = None;
        for cap in m.captures {
            match cap_names[cap.index as usize] {
                "ref.call" => call_node = Some(cap.node),
                "ref.call.callee" => callee = Some(node_text(cap.node, src).to_string()),
                "ref.new" => new_node = Some(cap.node),
                "ref.new.callee" => new_callee = Some(node_text(cap.node, src).to_string()),
                "ref.import" => import_node = Some(cap.node),
                "ref.require.target" => {
                    require_target = Some(node_text(cap.node, src).to_string());
                    require_line = start_line(cap.node);
                }
                "ref.require.fn" => require_fn = Some(node_text(cap.node, src).to_string()),
                "ref.require.source" => {
                    require_source = Some(node_text(cap.node, src).to_string());
                }
                "bind.target" => bind_target = Some((cap.node, node_text(cap.node, src))),
                "bind.ctor" => bind_ctor = Some(node_text(cap.node, src).to_string()),
                "bind.param" => param_node = Some(cap.node),
                "bind.param.name" => param_name = Some(node_text(cap.node, src).to_string()),
                "bind.param.type" => param_type = Some(node_text(cap.node, src).to_string()),
                "bind.ann.target" => ann_target = Some((cap.node, node_text(cap.node, src))),
                "bind.ann.type" => ann_type = Some(node_text(cap.node, src).to_string()),
                _ => {}
            }
        }

        if let (Some(node), Some(callee)) = (call_node, callee) {
            // requires are handled by their own capture below
            if callee != "require" {
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
        }
        if let (Some(node), Some(callee)) = (new_node, new_callee) {
            if let Some(path) = callee_path(&callee) {
                let segs = scope_chain(node, src, segment);
                out.calls.push(CallSite {
                    method_syntax: false,
                    path,
                    scope: scope_names(&segs),
                    line: start_line(node),
                    is_new: true,
                });
            }
        }
        if let Some(node) = import_node {
            if let Some(stmt) = parse_esm_import(node_text(node, src), start_line(node)) {
                out.imports.push(stmt);
            }
        }
        if let (Some(target), Some(func), Some(source_str)) =
            (require_target, require_fn, require_source)
        {
            if func == "require" {
                out.imports
                    .push(parse_require(&target, &source_str, require_line));
            }
        }
        if let (Some((node, target)), Some(ctor)) = (bind_target, bind_ctor) {
            if let Some(path) = callee_path(&ctor) {
                let segs = scope_chain(node, src, segment);
                out.bindings.push(LocalBinding {
                    scope: scope_names(&segs),
                    name: target.to_string(),
                    source: BindingSource::Call { path },
                    line: start_line(node),
                });
            }
        }
        if let (Some(node), Some(name), Some(type_name)) = (param_node, param_name, param_type) {
            let segs = scope_chain(node, src, segment);
            out.bindings.push(LocalBinding {
                scope: scope_names(&segs),
                name,
                source: BindingSource::Annotation {
                    type_name: type_name.trim_start_matches(':').trim().to_string(),
                },
                line: start_line(node),
            });
        }
        if let (Some((node, target)), Some(type_name)) = (ann_target, ann_type) {
            let segs = scope_chain(node, src, segment);
            out.bindings.push(LocalBinding {
                scope: scope_names(&segs),
                name: target.to_string(),
                source: BindingSource::Annotation {
                    type_name: type_name.trim_start_matches(':').trim().to_string(),
                },
                line: start_line(node),
            });
        }
    }

    out
}

impl LanguageStrategy for JavaScriptStrategy {
    fn language(&self) -> &'static str {
        "javascript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["js", "mjs", "cjs", "jsx"]
    }

    fn package_signal(&self, dir: &Path) -> bool {
        dir.join("package.json").exists()
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
        let root = module_path.split('.').next()?;
        STDLIB_ROOTS.contains(&root).then(|| root.to_string())
    }

    fn outline(
        &self,
        tree: &Tree,
        source: &str,
        rel_path: &Path,
        queries: &QuerySet,
    ) -> FileOutline {
        extract_outline("javascript", tree, source, rel_path, queries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::config::LanguageFilter;

    use crate::registry::ParserRegistry;

    fn outline_of(source: &str) -> FileOutline {
        let registry = ParserRegistry::load(&LanguageFilter::default());
        let tree = registry.parse("javascript", source, 0).unwrap();
        let entry = registry.get("javascript").unwrap();
        JavaScriptStrategy.outline(&tree, source, Path::new("test.js"), &entry.queries)
    }

    #[test]
    fn test_class_with_methods() {
        let out = outline_of("class A extends B {\n  constructor() {}\n  run() {}\n}\n");
        let a = out.definitions.iter().find(|d| d.name == "A").unwrap();
        assert_eq!(a.kind, DefKind::Class);
        assert_eq!(a.bases[0].name, "B");
        let run = out.definitions.iter().find(|d| d.name == "run").unwrap();
        assert_eq!(run.kind, DefKind::Method);
        assert_eq!(run.local_path(), "A.run");
    }

    #[test]
    fn test_exports_assignment_is_function() {
        let out = outline_of("exports.read = function(p) {};\n");
        let read = out.definitions.iter().find(|d| d.name == "read").unwrap();
        assert_eq!(read.kind, DefKind::Function);
        assert!(read.scope.is_empty());
    }

    #[test]
    fn test_prototype_assignment_is_method() {
        let out = outline_of("Cls.prototype.save = function() {};\n");
        let save = out.definitions.iter().find(|d| d.name == "save").unwrap();
        assert_eq!(save.kind, DefKind::Method);
        assert_eq!(save.scope, vec!["Cls"]);
    }

    #[test]
    fn test_arrow_function_var() {
        let out = outline_of("const go = async () => {};\n");
        let go = out.definitions.iter().find(|d| d.name == "go").unwrap();
        assert_eq!(go.kind, DefKind::Function);
        assert!(go.is_async);
    }

    #[test]
    fn test_commonjs_destructured_require() {
        let out = outline_of("const { read, write: w } = require('./a');\n");
        assert_eq!(out.imports.len(), 1);
        let imp = &out.imports[0];
        assert_eq!(imp.module, "a");
        assert_eq!(imp.relative_level, 1);
        assert_eq!(imp.items[0].name, "read");
        assert_eq!(imp.items[1].alias.as_deref(), Some("w"));
    }

    #[test]
    fn test_plain_require_binds_alias() {
        let out = outline_of("const fs = require('fs');\n");
        assert_eq!(out.imports[0].module, "fs");
        assert_eq!(out.imports[0].module_alias.as_deref(), Some("fs"));
        assert_eq!(out.imports[0].relative_level, 0);
    }

    #[test]
    fn test_esm_forms() {
        let out = outline_of(
            "import def from './m';\nimport { a, b as c } from '../lib/x';\nimport * as ns from 'pkg';\n",
        );
        assert_eq!(out.imports.len(), 3);
        assert_eq!(out.imports[0].module_alias.as_deref(), Some("def"));
        assert_eq!(out.imports[1].module, "lib.x");
        assert_eq!(out.imports[1].relative_level, 2);
        assert_eq!(out.imports[1].items[1].alias.as_deref(), Some("c"));
        assert_eq!(out.imports[2].module_alias.as_deref(), Some("ns"));
    }

    #[test]
    fn test_calls_and_new() {
        let out = outline_of("function main(p) { read(p); const s = new Store(); s.save(p); }\n");
        let paths: Vec<_> = out.calls.iter().map(|c| c.path.join(".")).collect();
        assert!(paths.contains(&"read".to_string()));
        assert!(paths.contains(&"Store".to_string()));
        assert!(paths.contains(&"s.save".to_string()));
        let new_call = out.calls.iter().find(|c| c.is_new).unwrap();
        assert_eq!(new_call.path, vec!["Store"]);
        assert_eq!(out.bindings.len(), 1);
        assert_eq!(out.bindings[0].name, "s");
    }

    #[test]
    fn test_specifier_normalization() {
        assert_eq!(split_specifier("./a"), ("a".to_string(), 1));
        assert_eq!(split_specifier("../../x/y.js"), ("x.y".to_string(), 2));
        assert_eq!(split_specifier("node:fs"), ("fs".to_string(), 0));
        assert_eq!(split_specifier("./dir/index.js"), ("dir".to_string(), 1));
    }
}
