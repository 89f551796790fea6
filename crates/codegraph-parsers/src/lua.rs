//! Lua strategy: tables with dot/colon-declared functions act as classes.
//! Colon-declared methods keep `Class:method` spelling in their final
//! qualified-name segment; `require('a.b')` binds like a module import.

use std::path::Path;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor, Tree};

use crate::outline::{
    callee_path, end_line, node_text, scope_chain, scope_names, start_line, strip_quotes,
    BindingSource, CallSite, DefKind, FileOutline, ImportStmt, LocalBinding, OutlineDef, ScopeSeg,
};
use crate::registry::QuerySet;
use crate::strategy::LanguageStrategy;

const STDLIB_ROOTS: &[&str] = &[
    "coroutine", "debug", "io", "math", "os", "package", "string", "table", "utf8",
];

pub struct LuaStrategy;

fn segment(node: Node<'_>, src: &[u8]) -> Option<ScopeSeg> {
    if node.kind() != "function_declaration" {
        return None;
    }
    let name = node.child_by_field_name("name")?;
    Some(ScopeSeg {
        name: node_text(name, src).to_string(),
        class_like: false,
    })
}

/// First string literal inside a call's argument list, quotes stripped.
fn first_string_arg(args: Node<'_>, src: &[u8]) -> Option<String> {
    let mut cursor = args.walk();
    for child in args.named_children(&mut cursor) {
        if child.kind() == "string" {
            return Some(strip_quotes(node_text(child, src)).to_string());
        }
    }
    None
}

impl LanguageStrategy for LuaStrategy {
    fn language(&self) -> &'static str {
        "lua"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["lua"]
    }

    fn package_signal(&self, dir: &Path) -> bool {
        dir.join("init.lua").exists()
    }

    fn module_path(&self, rel_path: &Path) -> Vec<String> {
        let mut segs = crate::strategy::default_module_path(rel_path);
        if segs.len() > 1 && segs.last().is_some_and(|s| s == "init") {
            segs.pop();
        }
        segs
    }

    fn constructor_names(&self) -> &'static [&'static str] {
        &["new"]
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
        let src = source.as_bytes();
        let root = tree.root_node();
        let mut out = FileOutline {
            language: "lua",
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
            let mut func_name = None;
            let mut owner = None;
            let mut method_name = None;
            let mut colon = false;
            for cap in m.captures {
                match cap_names[cap.index as usize] {
                    "def.func" => def_node = Some(cap.node),
                    "def.func.name" => func_name = Some(node_text(cap.node, src).to_string()),
                    "def.method.dot" => def_node = Some(cap.node),
                    "def.method.colon" => {
                        def_node = Some(cap.node);
                        colon = true;
                    }
                    "def.method.owner" => owner = Some(node_text(cap.node, src).to_string()),
                    "def.method.name" => method_name = Some(node_text(cap.node, src).to_string()),
                    _ => {}
                }
            }
            let Some(node) = def_node else { continue };
            let outer = scope_names(&scope_chain(node, src, segment));

            if let (Some(owner), Some(name)) = (owner, method_name) {
                // The owning table acts as a class; synthesize its record so
                // membership and containment resolve even without an explicit
                // `local T = {}` capture.
                let mut class_def = OutlineDef::new(owner.clone(), DefKind::Class);
                class_def.scope = outer.clone();
                class_def.start_line = start_line(node);
                class_def.end_line = end_line(node);
                class_def.synthetic = true;
                out.definitions.push(class_def);

                let mut def = OutlineDef::new(name, DefKind::Method);
                def.scope = outer.iter().cloned().chain([owner]).collect();
                def.method_sep = if colon { ':' } else { '.' };
                def.start_line = start_line(node);
                def.end_line = end_line(node);
                out.definitions.push(def);
            } else if let Some(name) = func_name {
                let mut def = OutlineDef::new(name, DefKind::Function);
                def.scope = outer;
                def.start_line = start_line(node);
                def.end_line = end_line(node);
                out.definitions.push(def);
            }
        }

        let refs = &queries.references;
        let cap_names = refs.capture_names();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(refs, root, src);
        while let Some(m) = matches.next() {
            let mut call_node = None;
            let mut call_name = None;
            let mut call_args = None;
            let mut callee = None;
            let mut bind_node = None;
            let mut bind_target = None;
            let mut bind_ctor = None;
            let mut bind_args = None;
            for cap in m.captures {
                match cap_names[cap.index as usize] {
                    "ref.call" => call_node = Some(cap.node),
                    "ref.call.name" => call_name = Some(node_text(cap.node, src).to_string()),
                    "ref.call.args" => call_args = Some(cap.node),
                    "ref.call.callee" => callee = Some(node_text(cap.node, src).to_string()),
                    "bind" => bind_node = Some(cap.node),
                    "bind.target" => bind_target = Some(node_text(cap.node, src).to_string()),
                    "bind.ctor" => bind_ctor = Some(node_text(cap.node, src).to_string()),
                    "bind.args" => bind_args = Some(cap.node),
                    _ => {}
                }
            }

            // `local X = require('a.b')` — an import binding, not a call.
            if let (Some(node), Some(target), Some(ctor)) =
                (bind_node, bind_target.clone(), bind_ctor.clone())
            {
                if ctor == "require" {
                    if let Some(args) = bind_args {
                        if let Some(module) = first_string_arg(args, src) {
                            out.imports.push(ImportStmt {
                                display: format!("require('{module}')"),
                                module,
                                relative_level: 0,
                                module_alias: Some(target),
                                items: vec![],
                                wildcard: false,
                                line: start_line(node),
                            });
                        }
                    }
                } else if let Some(path) = callee_path(&ctor) {
                    let segs = scope_chain(node, src, segment);
                    out.bindings.push(LocalBinding {
                        scope: scope_names(&segs),
                        name: target,
                        source: BindingSource::Call { path },
                        line: start_line(node),
                    });
                }
            }

            if let Some(node) = call_node {
                let raw = match (call_name, callee) {
                    (Some(name), _) => {
                        if name == "require" {
                            // Bare require without a local binding: record the
                            // module dependency alone.
                            if let Some(args) = call_args {
                                if let Some(module) = first_string_arg(args, src) {
                                    out.imports.push(ImportStmt::module_import(
                                        module,
                                        start_line(node),
                                    ));
                                }
                            }
                            continue;
                        }
                        name
                    }
                    (None, Some(callee)) => callee,
                    (None, None) => continue,
                };
                if let Some(path) = callee_path(&raw) {
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

        // A bound require matches both the binding and the bare-call
        // patterns; keep the aliased entry.
        let aliased: Vec<(String, u32)> = out
            .imports
            .iter()
            .filter(|i| i.module_alias.is_some())
            .map(|i| (i.module.clone(), i.line))
            .collect();
        out.imports.retain(|i| {
            i.module_alias.is_some() || !aliased.contains(&(i.module.clone(), i.line))
        });

        out
    }
}
