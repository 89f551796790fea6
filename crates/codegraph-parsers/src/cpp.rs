//! C/C++ strategy: classes and structs with bodies, out-of-class
//! `Class::method` definitions joined back onto their class, `#include`
//! dependencies, declaration-typed tracker bindings.

use std::path::Path;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor, Tree};

use crate::outline::{
    callee_path, directly_in_class, end_line, node_text, scope_chain, scope_names, start_line,
    strip_quotes, BaseClause, BaseKind, BindingSource, CallSite, DefKind, FileOutline, ImportStmt,
    LocalBinding, OutlineDef, ScopeSeg,
};
use crate::registry::QuerySet;
use crate::strategy::LanguageStrategy;

const STD_HEADERS: &[&str] = &[
    "algorithm", "array", "atomic", "bitset", "cassert", "chrono", "cmath", "cstdint", "cstdio",
    "cstdlib", "cstring", "deque", "format", "fstream", "functional", "iostream", "istream",
    "iterator", "limits", "list", "map", "memory", "mutex", "numeric", "optional", "ostream",
    "queue", "ranges", "set", "sstream", "stack", "stdexcept", "string", "string_view", "thread",
    "tuple", "type_traits", "unordered_map", "unordered_set", "utility", "variant", "vector",
    "stdio", "stdlib", "assert", "ctype", "errno", "math", "signal", "time",
];

pub struct CppStrategy;

fn segment(node: Node<'_>, src: &[u8]) -> Option<ScopeSeg> {
    match node.kind() {
        "class_specifier" | "struct_specifier" => Some(ScopeSeg {
            name: node_text(node.child_by_field_name("name")?, src).to_string(),
            class_like: true,
        }),
        "namespace_definition" => Some(ScopeSeg {
            name: node_text(node.child_by_field_name("name")?, src).to_string(),
            class_like: false,
        }),
        "function_definition" => {
            let name = definition_name(node, src)?;
            Some(ScopeSeg {
                name: name.replace("::", "."),
                class_like: false,
            })
        }
        _ => None,
    }
}

/// Declarator name of a function definition, descending through pointer and
/// reference wrappers.
fn definition_name(node: Node<'_>, src: &[u8]) -> Option<String> {
    let mut decl = node.child_by_field_name("declarator")?;
    loop {
        match decl.kind() {
            "function_declarator" => {
                let inner = decl.child_by_field_name("declarator")?;
                return Some(node_text(inner, src).to_string());
            }
            "pointer_declarator" | "reference_declarator" => {
                decl = decl
                    .child_by_field_name("declarator")
                    .or_else(|| decl.named_child(decl.named_child_count().saturating_sub(1)))?;
            }
            _ => return None,
        }
    }
}

/// `: public Base, private Other` → Inherits clauses, access specifiers and
/// virtual keywords dropped.
fn parse_base_clause(class_node: Node<'_>, src: &[u8]) -> Vec<BaseClause> {
    let mut bases = Vec::new();
    let mut cursor = class_node.walk();
    for child in class_node.named_children(&mut cursor) {
        if child.kind() != "base_class_clause" {
            continue;
        }
        let raw = node_text(child, src).trim_start_matches(':').to_string();
        for part in raw.split(',') {
            let name = part
                .split_whitespace()
                .filter(|w| !matches!(*w, "public" | "private" | "protected" | "virtual"))
                .next_back()
                .unwrap_or("");
            let name = name.split('<').next().unwrap_or(name).trim();
            if !name.is_empty() {
                bases.push(BaseClause {
                    name: name.replace("::", "."),
                    kind: BaseKind::Inherits,
                });
            }
        }
    }
    bases
}

/// Attribute specifiers (`[[nodiscard]]`) attached before the definition.
fn attributes_of(node: Node<'_>, src: &[u8]) -> Vec<String> {
    let mut attrs = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "attribute_declaration" || child.kind() == "attribute_specifier" {
            attrs.push(
                node_text(child, src)
                    .trim_start_matches("[[")
                    .trim_end_matches("]]")
                    .to_string(),
            );
        }
    }
    attrs
}

impl LanguageStrategy for CppStrategy {
    fn language(&self) -> &'static str {
        "cpp"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["cpp", "cc", "cxx", "hpp", "hh", "hxx", "c", "h"]
    }

    fn package_signal(&self, dir: &Path) -> bool {
        dir.join("CMakeLists.txt").exists() || dir.join("Makefile").exists()
    }

    fn stdlib_root(&self, module_path: &str) -> Option<String> {
        let root = module_path.split('.').next()?;
        let bare = root.strip_suffix(".h").unwrap_or(root);
        STD_HEADERS.contains(&bare).then(|| bare.to_string())
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
            language: "cpp",
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
            let mut func_decl = None;
            let mut methoddecl_node = None;
            let mut methoddecl_name = None;
            for cap in m.captures {
                match cap_names[cap.index as usize] {
                    "def.class" => class_node = Some(cap.node),
                    "def.class.name" => class_name = Some(node_text(cap.node, src).to_string()),
                    "def.func" => func_node = Some(cap.node),
                    "def.func.decl" => func_decl = Some(node_text(cap.node, src).to_string()),
                    "def.methoddecl" => methoddecl_node = Some(cap.node),
                    "def.methoddecl.name" => {
                        methoddecl_name = Some(node_text(cap.node, src).to_string());
                    }
                    _ => {}
                }
            }

            if let (Some(node), Some(name)) = (class_node, class_name) {
                let segs = scope_chain(node, src, segment);
                let mut def = OutlineDef::new(name, DefKind::Class);
                def.scope = scope_names(&segs);
                def.start_line = start_line(node);
                def.end_line = end_line(node);
                def.bases = parse_base_clause(node, src);
                def.decorators = attributes_of(node, src);
                out.definitions.push(def);
            } else if let (Some(node), Some(raw_name)) = (func_node, func_decl) {
                let segs = scope_chain(node, src, segment);
                if raw_name.contains("::") {
                    // Out-of-class definition: `Calculator::add`. The
                    // qualifier becomes the scope; the pipeline joins it onto
                    // the class (or demotes to Function if no class matches).
                    let dotted = raw_name.replace("::", ".");
                    let (owner, name) = dotted.rsplit_once('.').unwrap_or(("", &dotted));
                    let mut def = OutlineDef::new(name, DefKind::Method);
                    def.scope = scope_names(&segs)
                        .into_iter()
                        .chain(owner.split('.').map(String::from))
                        .collect();
                    def.start_line = start_line(node);
                    def.end_line = end_line(node);
                    out.definitions.push(def);
                } else {
                    let kind = if directly_in_class(&segs) {
                        DefKind::Method
                    } else {
                        DefKind::Function
                    };
                    let mut def = OutlineDef::new(raw_name, kind);
                    def.scope = scope_names(&segs);
                    def.start_line = start_line(node);
                    def.end_line = end_line(node);
                    out.definitions.push(def);
                }
            } else if let (Some(node), Some(name)) = (methoddecl_node, methoddecl_name) {
                let segs = scope_chain(node, src, segment);
                if directly_in_class(&segs) {
                    let mut def = OutlineDef::new(name, DefKind::Method);
                    def.scope = scope_names(&segs);
                    def.start_line = start_line(node);
                    def.end_line = end_line(node);
                    // A declaration, not the definition: merges with the
                    // out-of-class body instead of forming an overload.
                    def.synthetic = true;
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
            let mut include_path = None;
            let mut include_line = 0;
            let mut bind_target = None;
            let mut bind_type = None;
            for cap in m.captures {
                match cap_names[cap.index as usize] {
                    "ref.call" => call_node = Some(cap.node),
                    "ref.call.callee" => callee = Some(node_text(cap.node, src).to_string()),
                    "ref.include.path" => {
                        include_path = Some(node_text(cap.node, src).to_string());
                        include_line = start_line(cap.node);
                    }
                    "bind.target" => bind_target = Some((cap.node, node_text(cap.node, src))),
                    "bind.ann.type" => bind_type = Some(node_text(cap.node, src).to_string()),
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
            if let Some(raw) = include_path {
                let is_system = raw.starts_with('<');
                let cleaned = strip_quotes(&raw);
                let module = cleaned
                    .trim_end_matches(".hpp")
                    .trim_end_matches(".hh")
                    .trim_end_matches(".h")
                    .replace('/', ".");
                out.imports.push(ImportStmt {
                    module,
                    relative_level: if is_system { 0 } else { 1 },
                    module_alias: None,
                    items: vec![],
                    wildcard: false,
                    line: include_line,
                    display: raw,
                });
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
