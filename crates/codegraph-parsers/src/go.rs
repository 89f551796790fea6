//! Go strategy: struct/interface types as classes, receiver methods joined
//! onto their type, grouped import blocks, stdlib paths kept whole.

use std::path::Path;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor, Tree};

use crate::outline::{
    callee_path, end_line, node_text, scope_chain, scope_names, start_line, strip_quotes,
    BindingSource, CallSite, DefKind, FileOutline, ImportStmt, LocalBinding, OutlineDef, ScopeSeg,
};
use crate::registry::QuerySet;
use crate::strategy::LanguageStrategy;

pub struct GoStrategy;

/// Receiver type from a method's parameter list: `(s *Server)` → `Server`.
fn receiver_type(raw: &str) -> Option<String> {
    let inner = raw.trim().trim_matches(|c| c == '(' || c == ')');
    let ty = inner.split_whitespace().last()?;
    let ty = ty.trim_start_matches('*');
    let ty = ty.split('[').next().unwrap_or(ty);
    (!ty.is_empty()).then(|| ty.to_string())
}

fn segment(node: Node<'_>, src: &[u8]) -> Option<ScopeSeg> {
    match node.kind() {
        "function_declaration" => Some(ScopeSeg {
            name: node_text(node.child_by_field_name("name")?, src).to_string(),
            class_like: false,
        }),
        "method_declaration" => {
            let name = node_text(node.child_by_field_name("name")?, src);
            let recv = node
                .child_by_field_name("receiver")
                .and_then(|r| receiver_type(node_text(r, src)));
            Some(ScopeSeg {
                name: match recv {
                    Some(t) => format!("{t}.{name}"),
                    None => name.to_string(),
                },
                class_like: false,
            })
        }
        _ => None,
    }
}

/// Parses an `import` declaration (single or grouped) into statements.
fn parse_import(text: &str, line: u32) -> Vec<ImportStmt> {
    let body = text.trim().trim_start_matches("import").trim();
    let specs: Vec<&str> = if body.starts_with('(') {
        body.trim_matches(|c| c == '(' || c == ')')
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with("//"))
            .collect()
    } else {
        vec![body]
    };
    let mut stmts = Vec::new();
    for (i, spec) in specs.iter().enumerate() {
        let (alias, path) = match spec.split_once(char::is_whitespace) {
            Some((a, p)) if !a.starts_with('"') => (Some(a.trim().to_string()), p.trim()),
            _ => (None, *spec),
        };
        let path = strip_quotes(path);
        if path.is_empty() {
            continue;
        }
        let module = path.replace('/', ".");
        let alias = match alias.as_deref() {
            Some("_") | Some(".") => None,
            _ => alias,
        };
        stmts.push(ImportStmt {
            // The last path segment is the package name Go code refers to.
            module_alias: alias.or_else(|| {
                module.rsplit('.').next().map(|s| s.to_string())
            }),
            module,
            relative_level: 0,
            items: vec![],
            wildcard: false,
            line: line + i as u32,
            display: path.to_string(),
        });
    }
    stmts
}

impl LanguageStrategy for GoStrategy {
    fn language(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn package_signal(&self, dir: &Path) -> bool {
        dir.join("go.mod").exists()
    }

    fn stdlib_root(&self, module_path: &str) -> Option<String> {
        // Stdlib import paths have no host; module-path domains read as
        // `<host>.<tld>.…` after separator normalization.
        let mut segs = module_path.split('.');
        let root = segs.next()?;
        let is_domain = matches!(
            segs.next(),
            Some("com" | "org" | "net" | "io" | "dev" | "co" | "build")
        );
        (!is_domain && root.chars().all(|c| c.is_ascii_lowercase()))
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
            language: "go",
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
            let mut method_node = None;
            let mut method_name = None;
            let mut receiver = None;
            for cap in m.captures {
                match cap_names[cap.index as usize] {
                    "def.class" => class_node = Some(cap.node),
                    "def.class.name" => class_name = Some(node_text(cap.node, src).to_string()),
                    "def.func" => func_node = Some(cap.node),
                    "def.func.name" => func_name = Some(node_text(cap.node, src).to_string()),
                    "def.method" => method_node = Some(cap.node),
                    "def.method.name" => method_name = Some(node_text(cap.node, src).to_string()),
                    "def.method.receiver" => {
                        receiver = receiver_type(node_text(cap.node, src));
                    }
                    _ => {}
                }
            }

            if let (Some(node), Some(name)) = (class_node, class_name) {
                let mut def = OutlineDef::new(name, DefKind::Class);
                def.start_line = start_line(node);
                def.end_line = end_line(node);
                out.definitions.push(def);
            } else if let (Some(node), Some(name), Some(recv)) =
                (method_node, method_name, receiver.clone())
            {
                let mut def = OutlineDef::new(name.clone(), DefKind::Method);
                def.scope = vec![recv.clone()];
                def.start_line = start_line(node);
                def.end_line = end_line(node);
                out.definitions.push(def);

                // The receiver variable is a known-typed binding inside the
                // method body: `func (s *Server) Start()` binds s → Server.
                if let Some(var) = node
                    .child_by_field_name("receiver")
                    .map(|r| node_text(r, src))
                    .and_then(|raw| {
                        raw.trim_matches(|c| c == '(' || c == ')')
                            .split_whitespace()
                            .next()
                            .map(|s| s.to_string())
                    })
                {
                    if var != recv {
                        out.bindings.push(LocalBinding {
                            scope: vec![format!("{recv}.{name}")],
                            name: var,
                            source: BindingSource::Annotation { type_name: recv },
                            line: start_line(node),
                        });
                    }
                }
            } else if let (Some(node), Some(name)) = (func_node, func_name) {
                let mut def = OutlineDef::new(name, DefKind::Function);
                def.scope = scope_names(&scope_chain(node, src, segment));
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
            let mut callee = None;
            let mut import_node = None;
            let mut bind_target = None;
            let mut bind_ctor = None;
            let mut ann_target = None;
            let mut ann_type = None;
            for cap in m.captures {
                match cap_names[cap.index as usize] {
                    "ref.call" => call_node = Some(cap.node),
                    "ref.call.callee" => callee = Some(node_text(cap.node, src).to_string()),
                    "ref.import" => import_node = Some(cap.node),
                    "bind.target" => bind_target = Some((cap.node, node_text(cap.node, src))),
                    "bind.ctor" => bind_ctor = Some(node_text(cap.node, src).to_string()),
                    "bind.ann.target" => ann_target = Some((cap.node, node_text(cap.node, src))),
                    "bind.ann.type" => ann_type = Some(node_text(cap.node, src).to_string()),
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
        }

        out
    }
}
