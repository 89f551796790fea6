//! Java strategy: classes/interfaces/enums, `extends`/`implements` clauses,
//! annotation capture, static imports, `java.*` roots normalized to their
//! package.

use std::path::Path;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor, Tree};

use crate::outline::{
    callee_path, end_line, node_text, scope_chain, scope_names, start_line, BaseClause, BaseKind,
    BindingSource, CallSite, DefKind, FileOutline, ImportItem, ImportStmt, LocalBinding,
    OutlineDef, ScopeSeg,
};
use crate::registry::QuerySet;
use crate::strategy::LanguageStrategy;

pub struct JavaStrategy;

fn segment(node: Node<'_>, src: &[u8]) -> Option<ScopeSeg> {
    match node.kind() {
        "class_declaration" | "interface_declaration" | "enum_declaration" => Some(ScopeSeg {
            name: node_text(node.child_by_field_name("name")?, src).to_string(),
            class_like: true,
        }),
        "method_declaration" | "constructor_declaration" => Some(ScopeSeg {
            name: node_text(node.child_by_field_name("name")?, src).to_string(),
            class_like: false,
        }),
        _ => None,
    }
}

/// Modifier list of a declaration: annotations become decorators, `static`
/// and `abstract` become flags.
fn modifiers_of(node: Node<'_>, src: &[u8]) -> (Vec<String>, bool) {
    let mut annotations = Vec::new();
    let mut is_static = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "modifiers" {
            continue;
        }
        let mut inner = child.walk();
        for m in child.children(&mut inner) {
            match m.kind() {
                "marker_annotation" | "annotation" => {
                    annotations.push(node_text(m, src).trim_start_matches('@').to_string());
                }
                "static" => is_static = true,
                _ => {}
            }
        }
    }
    (annotations, is_static)
}

/// `extends X` / `implements A, B` clauses from a class node.
fn heritage_of(class_node: Node<'_>, src: &[u8]) -> Vec<BaseClause> {
    let mut bases = Vec::new();
    let mut cursor = class_node.walk();
    for child in class_node.named_children(&mut cursor) {
        match child.kind() {
            "superclass" => {
                let name = node_text(child, src).trim_start_matches("extends").trim();
                let name = name.split('<').next().unwrap_or(name).trim();
                if !name.is_empty() {
                    bases.push(BaseClause {
                        name: name.to_string(),
                        kind: BaseKind::Inherits,
                    });
                }
            }
            "super_interfaces" | "extends_interfaces" => {
                let raw = node_text(child, src)
                    .trim_start_matches("implements")
                    .trim_start_matches("extends")
                    .to_string();
                for part in raw.split(',') {
                    let name = part.trim().split('<').next().unwrap_or("").trim();
                    if !name.is_empty() {
                        // Interfaces extending interfaces still inherit.
                        let kind = if child.kind() == "super_interfaces" {
                            BaseKind::Implements
                        } else {
                            BaseKind::Inherits
                        };
                        bases.push(BaseClause {
                            name: name.to_string(),
                            kind,
                        });
                    }
                }
            }
            _ => {}
        }
    }
    bases
}

/// Parses one `import` declaration's text.
fn parse_import(text: &str, line: u32) -> Option<ImportStmt> {
    let body = text
        .trim()
        .trim_end_matches(';')
        .strip_prefix("import")?
        .trim();
    let (body, _is_static) = match body.strip_prefix("static ") {
        Some(rest) => (rest.trim(), true),
        None => (body, false),
    };
    if let Some(pkg) = body.strip_suffix(".*") {
        let mut stmt = ImportStmt::module_import(pkg.to_string(), line);
        stmt.wildcard = true;
        stmt.display = text.trim().to_string();
        return Some(stmt);
    }
    let (module, item) = body.rsplit_once('.')?;
    Some(ImportStmt {
        module: module.to_string(),
        relative_level: 0,
        module_alias: None,
        items: vec![ImportItem {
            name: item.to_string(),
            alias: None,
        }],
        wildcard: false,
        line,
        display: text.trim().to_string(),
    })
}

impl LanguageStrategy for JavaStrategy {
    fn language(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn package_signal(&self, dir: &Path) -> bool {
        dir.join("pom.xml").exists() || dir.join("build.gradle").exists()
    }

    fn stdlib_root(&self, module_path: &str) -> Option<String> {
        let mut segs = module_path.split('.');
        let root = segs.next()?;
        if !matches!(root, "java" | "javax" | "jakarta") {
            return None;
        }
        Some(match segs.next() {
            Some(second) => format!("{root}.{second}"),
            None => root.to_string(),
        })
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
            language: "java",
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
            let mut method_node = None;
            let mut method_name = None;
            for cap in m.captures {
                match cap_names[cap.index as usize] {
                    "def.class" => class_node = Some(cap.node),
                    "def.class.name" => class_name = Some(node_text(cap.node, src).to_string()),
                    "def.method" | "def.ctor" => method_node = Some(cap.node),
                    "def.method.name" | "def.ctor.name" => {
                        method_name = Some(node_text(cap.node, src).to_string());
                    }
                    _ => {}
                }
            }

            if let (Some(node), Some(name)) = (class_node, class_name) {
                let segs = scope_chain(node, src, segment);
                let (annotations, _) = modifiers_of(node, src);
                let mut def = OutlineDef::new(name, DefKind::Class);
                def.scope = scope_names(&segs);
                def.start_line = start_line(node);
                def.end_line = end_line(node);
                def.decorators = annotations;
                def.bases = heritage_of(node, src);
                out.definitions.push(def);
            } else if let (Some(node), Some(name)) = (method_node, method_name) {
                let segs = scope_chain(node, src, segment);
                let (annotations, is_static) = modifiers_of(node, src);
                let mut def = OutlineDef::new(name, DefKind::Method);
                def.scope = scope_names(&segs);
                def.start_line = start_line(node);
                def.end_line = end_line(node);
                def.decorators = annotations;
                def.is_static = is_static;
                out.definitions.push(def);
            }
        }

        let refs = &queries.references;
        let cap_names = refs.capture_names();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(refs, root, src);
        while let Some(m) = matches.next() {
            let mut call_node = None;
            let mut call_receiver = None;
            let mut call_name = None;
            let mut new_node = None;
            let mut new_type = None;
            let mut import_node = None;
            let mut bind_target = None;
            let mut bind_type = None;
            for cap in m.captures {
                match cap_names[cap.index as usize] {
                    "ref.call" => call_node = Some(cap.node),
                    "ref.call.receiver" => {
                        call_receiver = Some(node_text(cap.node, src).to_string());
                    }
                    "ref.call.name" => call_name = Some(node_text(cap.node, src).to_string()),
                    "ref.new" => new_node = Some(cap.node),
                    "ref.new.type" => new_type = Some(node_text(cap.node, src).to_string()),
                    "ref.import" => import_node = Some(cap.node),
                    "bind.target" => bind_target = Some((cap.node, node_text(cap.node, src))),
                    "bind.ann.type" => bind_type = Some(node_text(cap.node, src).to_string()),
                    _ => {}
                }
            }

            if let (Some(node), Some(name)) = (call_node, call_name) {
                let raw = match &call_receiver {
                    Some(recv) => format!("{recv}.{name}"),
                    None => name,
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
            if let (Some(node), Some(type_name)) = (new_node, new_type) {
                let base = type_name.split('<').next().unwrap_or(&type_name).trim();
                if let Some(path) = callee_path(base) {
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
                if let Some(stmt) = parse_import(node_text(node, src), start_line(node)) {
                    out.imports.push(stmt);
                }
            }
            if let (Some((node, target)), Some(type_name)) = (bind_target, bind_type) {
                let segs = scope_chain(node, src, segment);
                out.bindings.push(LocalBinding {
                    scope: scope_names(&segs),
                    name: target.to_string(),
                    source: BindingSource::Annotation { type_name },
                    line: start_line(node),
                });
            }
        }

        out
    }
}
