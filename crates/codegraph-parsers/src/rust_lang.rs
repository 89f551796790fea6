//! Rust strategy: `impl` blocks attach methods to their type, `impl Trait
//! for Type` records IMPLEMENTS, `use` trees expand to individual bindings,
//! `std`/`core`/`alloc` paths normalize to their module root.

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

pub struct RustStrategy;

fn impl_type_name(node: Node<'_>, src: &[u8]) -> Option<String> {
    let ty = node.child_by_field_name("type")?;
    let raw = node_text(ty, src);
    // Strip generic arguments: `Point<T>` owns the same methods as `Point`.
    Some(raw.split('<').next().unwrap_or(raw).trim().to_string())
}

fn segment(node: Node<'_>, src: &[u8]) -> Option<ScopeSeg> {
    match node.kind() {
        "mod_item" => Some(ScopeSeg {
            name: node_text(node.child_by_field_name("name")?, src).to_string(),
            class_like: false,
        }),
        "function_item" => Some(ScopeSeg {
            name: node_text(node.child_by_field_name("name")?, src).to_string(),
            class_like: false,
        }),
        "impl_item" => Some(ScopeSeg {
            name: impl_type_name(node, src)?,
            class_like: true,
        }),
        "trait_item" => Some(ScopeSeg {
            name: node_text(node.child_by_field_name("name")?, src).to_string(),
            class_like: true,
        }),
        _ => None,
    }
}

/// Outer attributes (`#[derive(...)]`, `#[tokio::main]`) preceding an item.
fn attributes_of(node: Node<'_>, src: &[u8]) -> Vec<String> {
    let mut attrs = Vec::new();
    let mut sib = node.prev_named_sibling();
    while let Some(s) = sib {
        if s.kind() != "attribute_item" {
            break;
        }
        attrs.push(
            node_text(s, src)
                .trim_start_matches("#[")
                .trim_end_matches(']')
                .to_string(),
        );
        sib = s.prev_named_sibling();
    }
    attrs.reverse();
    attrs
}

/// Expands one `use` declaration into normalized import statements.
/// `use a::{b, c as d};` produces a single statement with two items.
pub(crate) fn parse_use(text: &str, line: u32) -> Vec<ImportStmt> {
    let text = text.trim().trim_end_matches(';');
    let body = text
        .trim_start_matches("pub ")
        .trim_start_matches("pub(crate) ")
        .trim_start_matches("use ")
        .trim();

    let mut relative_level = 0u32;
    let mut body = body;
    if let Some(rest) = body.strip_prefix("self::") {
        relative_level = 1;
        body = rest;
    }
    while let Some(rest) = body.strip_prefix("super::") {
        relative_level += if relative_level == 0 { 2 } else { 1 };
        body = rest;
    }

    if let Some(brace_start) = body.find('{') {
        let prefix = body[..brace_start].trim_end_matches("::").trim();
        let inner = body[brace_start + 1..]
            .trim_end_matches('}')
            .replace('\n', " ");
        let module = prefix.replace("::", ".");
        let mut stmt = ImportStmt {
            module,
            relative_level,
            module_alias: None,
            items: vec![],
            wildcard: false,
            line,
            display: text.to_string(),
        };
        for part in inner.split(',') {
            let part = part.trim();
            if part.is_empty() || part.contains('{') {
                // Nested use-trees are rare in practice; the module-level
                // dependency is still recorded through the statement itself.
                continue;
            }
            if part == "*" {
                stmt.wildcard = true;
                continue;
            }
            if part == "self" {
                stmt.module_alias = stmt
                    .module
                    .rsplit('.')
                    .next()
                    .map(|s| s.to_string());
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

    if let Some(stripped) = body.strip_suffix("::*") {
        let mut stmt = ImportStmt::module_import(stripped.replace("::", "."), line);
        stmt.relative_level = relative_level;
        stmt.wildcard = true;
        stmt.display = text.to_string();
        return vec![stmt];
    }

    let (path, alias) = match body.split_once(" as ") {
        Some((p, a)) => (p.trim(), Some(a.trim().to_string())),
        None => (body, None),
    };
    let dotted = path.replace("::", ".");
    let stmt = match dotted.rsplit_once('.') {
        Some((module, item)) => ImportStmt {
            module: module.to_string(),
            relative_level,
            module_alias: None,
            items: vec![ImportItem {
                name: item.to_string(),
                alias,
            }],
            wildcard: false,
            line,
            display: text.to_string(),
        },
        None => ImportStmt {
            module: dotted,
            relative_level,
            module_alias: alias,
            items: vec![],
            wildcard: false,
            line,
            display: text.to_string(),
        },
    };
    vec![stmt]
}

impl LanguageStrategy for RustStrategy {
    fn language(&self) -> &'static str {
        "rust"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn package_signal(&self, dir: &Path) -> bool {
        dir.join("Cargo.toml").exists() || dir.join("mod.rs").exists()
    }

    fn module_path(&self, rel_path: &Path) -> Vec<String> {
        let mut segs = crate::strategy::default_module_path(rel_path);
        if segs.len() > 1 && segs.last().is_some_and(|s| s == "mod") {
            segs.pop();
        }
        segs
    }

    fn constructor_names(&self) -> &'static [&'static str] {
        &["new"]
    }

    fn stdlib_root(&self, module_path: &str) -> Option<String> {
        let mut segs = module_path.split('.');
        let root = segs.next()?;
        if !matches!(root, "std" | "core" | "alloc") {
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
            language: "rust",
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
            let mut is_trait = false;
            let mut func_node = None;
            let mut func_name = None;
            let mut impl_node = None;
            let mut impl_trait = None;
            let mut impl_type = None;
            for cap in m.captures {
                match cap_names[cap.index as usize] {
                    "def.class" => class_node = Some(cap.node),
                    "def.class.name" => class_name = Some(node_text(cap.node, src).to_string()),
                    "def.trait" => {
                        class_node = Some(cap.node);
                        is_trait = true;
                    }
                    "def.trait.name" => class_name = Some(node_text(cap.node, src).to_string()),
                    "def.func" => func_node = Some(cap.node),
                    "def.func.name" => func_name = Some(node_text(cap.node, src).to_string()),
                    "def.impl.trait_for" => impl_node = Some(cap.node),
                    "def.impl.trait" => {
                        impl_trait = Some(node_text(cap.node, src).replace("::", "."));
                    }
                    "def.impl.type" => impl_type = Some(node_text(cap.node, src).to_string()),
                    "def.impl" | "def.mod" | "def.mod.name" => {}
                    _ => {}
                }
            }

            if let (Some(node), Some(name)) = (class_node, class_name) {
                let segs = scope_chain(node, src, segment);
                let mut def = OutlineDef::new(name, DefKind::Class);
                def.scope = scope_names(&segs);
                def.start_line = start_line(node);
                def.end_line = end_line(node);
                def.decorators = attributes_of(node, src);
                if is_trait {
                    def.decorators.push("trait".to_string());
                }
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
                def.is_async = node_text(node, src).starts_with("async ")
                    || node_text(node, src).contains("async fn ");
                def.decorators = attributes_of(node, src);
                out.definitions.push(def);
            } else if let (Some(node), Some(trait_name), Some(type_name)) =
                (impl_node, impl_trait, impl_type)
            {
                // `impl Trait for Type` — synthesize the type's class record
                // carrying the IMPLEMENTS clause; attrs merge into the real
                // struct definition wherever it lives.
                let type_base = type_name
                    .split('<')
                    .next()
                    .unwrap_or(&type_name)
                    .trim()
                    .to_string();
                let segs = scope_chain(node, src, segment);
                let mut def = OutlineDef::new(type_base, DefKind::Class);
                def.scope = scope_names(&segs);
                def.start_line = start_line(node);
                def.end_line = end_line(node);
                def.synthetic = true;
                def.bases.push(BaseClause {
                    name: trait_name.split('<').next().unwrap_or(&trait_name).to_string(),
                    kind: BaseKind::Implements,
                });
                out.definitions.push(def);
            }
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
            let mut ann_target = None;
            let mut ann_type = None;
            let mut param_name = None;
            let mut param_node = None;
            let mut param_type = None;
            for cap in m.captures {
                match cap_names[cap.index as usize] {
                    "ref.call" => call_node = Some(cap.node),
                    "ref.call.callee" => callee = Some(node_text(cap.node, src).to_string()),
                    "ref.import" => import_node = Some(cap.node),
                    "bind.target" => bind_target = Some((cap.node, node_text(cap.node, src))),
                    "bind.ctor" => bind_ctor = Some(node_text(cap.node, src).to_string()),
                    "bind.ann.target" => ann_target = Some((cap.node, node_text(cap.node, src))),
                    "bind.ann.type" => ann_type = Some(node_text(cap.node, src).to_string()),
                    "bind.param" => param_node = Some(cap.node),
                    "bind.param.name" => param_name = Some(node_text(cap.node, src).to_string()),
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
                    .extend(parse_use(node_text(node, src), start_line(node)));
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
            if let (Some((node, target)), Some(type_name)) = (ann_target, ann_type) {
                let segs = scope_chain(node, src, segment);
                out.bindings.push(LocalBinding {
                    scope: scope_names(&segs),
                    name: target.to_string(),
                    source: BindingSource::Annotation { type_name },
                    line: start_line(node),
                });
            }
            if let (Some(node), Some(name), Some(type_name)) = (param_node, param_name, param_type)
            {
                let segs = scope_chain(node, src, segment);
                out.bindings.push(LocalBinding {
                    scope: scope_names(&segs),
                    name,
                    source: BindingSource::Annotation { type_name },
                    line: start_line(node),
                });
            }
        }

        out
    }
}
