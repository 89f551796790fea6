//! Import resolution: per-module local-name → qualified-name bindings plus
//! `IMPORTS` edge emission.
//!
//! Internal targets resolve against the module table (relative levels walk
//! the package chain); standard-library targets normalize to their module
//! root; everything else becomes a best-guess `ExternalPackage` so the
//! dependency is still visible downstream.

use std::collections::{BTreeMap, HashSet};

use codegraph_core::qualified;
use codegraph_core::types::{NodeLabel, NodeRecord, NodeRef, RelKind, RelRecord};
use codegraph_parsers::outline::{FileOutline, ImportStmt};
use codegraph_parsers::strategy::LanguageStrategy;

use crate::symbols::{ImportTarget, SymbolTable};

/// Emission output of the import phase.
#[derive(Debug, Default)]
pub struct ImportResolution {
    pub nodes: Vec<NodeRecord>,
    pub rels: Vec<RelRecord>,
    pub unresolved: u64,
}

enum Resolved {
    Module(String),
    Package(String),
    External(String),
}

fn resolve_module_target(
    table: &SymbolTable,
    packages: &HashSet<String>,
    strategy: Option<&dyn LanguageStrategy>,
    known_externals: &BTreeMap<String, String>,
    module_qn: &str,
    stmt: &ImportStmt,
    unresolved: &mut u64,
) -> Option<Resolved> {
    // Relative: walk up the importing module's package chain.
    if stmt.relative_level > 0 {
        let mut base: Vec<&str> = module_qn.split('.').collect();
        base.pop();
        for _ in 1..stmt.relative_level {
            base.pop()?;
        }
        let mut candidate = base.join(".");
        if !stmt.module.is_empty() {
            candidate = qualified::join(&candidate, &stmt.module);
        }
        if table.modules.contains_key(&candidate) {
            return Some(Resolved::Module(candidate));
        }
        if packages.contains(&candidate) {
            return Some(Resolved::Package(candidate));
        }
        *unresolved += 1;
        return Some(Resolved::External(
            qualified::root(&stmt.module).to_string(),
        ));
    }

    // Rust `crate::` paths re-root at an ancestor of the importing module.
    if stmt.module == "crate" || stmt.module.starts_with("crate.") {
        let rest = stmt.module.strip_prefix("crate").unwrap_or("");
        let rest = rest.strip_prefix('.').unwrap_or(rest);
        let segs: Vec<&str> = module_qn.split('.').collect();
        for take in (1..segs.len()).rev() {
            let mut candidate = segs[..take].join(".");
            if !rest.is_empty() {
                candidate = qualified::join(&candidate, rest);
            }
            if table.modules.contains_key(&candidate) {
                return Some(Resolved::Module(candidate));
            }
            if packages.contains(&candidate) {
                return Some(Resolved::Package(candidate));
            }
        }
        *unresolved += 1;
        return Some(Resolved::External("crate".to_string()));
    }

    // Absolute: project-rooted lookup first.
    let candidate = qualified::join(&table.project, &stmt.module);
    if table.modules.contains_key(&candidate) {
        return Some(Resolved::Module(candidate));
    }
    if packages.contains(&candidate) {
        return Some(Resolved::Package(candidate));
    }

    // Standard library: normalized to the module root, entity suffix gone.
    if let Some(root) = strategy.and_then(|s| s.stdlib_root(&stmt.module)) {
        return Some(Resolved::External(root));
    }

    // Known third-party dependency roots resolve to their package name.
    let root = qualified::root(&stmt.module).to_string();
    if known_externals.contains_key(&root) || known_externals.contains_key(&stmt.module) {
        return Some(Resolved::External(root));
    }

    *unresolved += 1;
    Some(Resolved::External(root))
}

/// Resolves every module's imports, filling binding tables and emitting
/// `IMPORTS` edges. Runs after all definitions are merged.
pub fn resolve_imports(
    table: &mut SymbolTable,
    outlines: &[(String, FileOutline)],
    packages: &HashSet<String>,
    known_externals: &BTreeMap<String, String>,
    strategies: &[Box<dyn LanguageStrategy>],
) -> ImportResolution {
    let mut out = ImportResolution::default();
    let mut external_nodes: HashSet<String> = HashSet::new();
    let project = table.project.clone();

    for (module_qn, outline) in outlines {
        let strategy = strategies
            .iter()
            .find(|s| s.language() == outline.language)
            .map(|s| s.as_ref());
        let source_ref = NodeRef::new(NodeLabel::Module, module_qn.clone());

        for stmt in &outline.imports {
            let Some(resolved) = resolve_module_target(
                table,
                packages,
                strategy,
                known_externals,
                module_qn,
                stmt,
                &mut out.unresolved,
            ) else {
                out.unresolved += 1;
                continue;
            };

            let (target_ref, target_prefix, external) = match &resolved {
                Resolved::Module(qn) => (
                    NodeRef::new(NodeLabel::Module, qn.clone()),
                    qn.clone(),
                    false,
                ),
                Resolved::Package(qn) => (
                    NodeRef::new(NodeLabel::Package, qn.clone()),
                    qn.clone(),
                    false,
                ),
                Resolved::External(root) => {
                    if external_nodes.insert(root.clone()) {
                        out.nodes.push(
                            NodeRecord::new(NodeLabel::ExternalPackage, root)
                                .with("name", root.clone())
                                .with(
                                    "version_spec",
                                    known_externals.get(root).cloned().unwrap_or_default(),
                                ),
                        );
                    }
                    (
                        NodeRef::new(NodeLabel::ExternalPackage, root.clone()),
                        root.clone(),
                        true,
                    )
                }
            };

            // Binding table updates.
            let module = table
                .modules
                .get_mut(module_qn)
                .expect("importing module was merged");
            let make_target = |qn: String| {
                if external {
                    ImportTarget::External(target_prefix.clone())
                } else {
                    ImportTarget::Internal(qn)
                }
            };
            if stmt.items.is_empty() && !stmt.wildcard {
                let local = stmt
                    .module_alias
                    .clone()
                    .or_else(|| {
                        if outline.language == "python" && stmt.module.contains('.') {
                            Some(qualified::root(&stmt.module).to_string())
                        } else {
                            stmt.module.rsplit('.').next().map(|s| s.to_string())
                        }
                    })
                    .unwrap_or_default();
                if !local.is_empty() {
                    let target = if outline.language == "python"
                        && stmt.module_alias.is_none()
                        && stmt.module.contains('.')
                        && !external
                    {
                        // `import a.b` binds the root package name.
                        ImportTarget::Internal(qualified::join(
                            &project,
                            qualified::root(&stmt.module),
                        ))
                    } else {
                        make_target(target_prefix.clone())
                    };
                    module.imports.insert(local, target);
                }
            }
            for item in &stmt.items {
                let local = item.alias.clone().unwrap_or_else(|| item.name.clone());
                module.imports.insert(
                    local,
                    make_target(qualified::join(&target_prefix, &item.name)),
                );
            }
            if stmt.wildcard && !external {
                if !module.wildcard_sources.contains(&target_prefix) {
                    module.wildcard_sources.push(target_prefix.clone());
                }
            }

            // One IMPORTS edge per item; whole-module imports emit a single
            // edge. Identity dedup collapses repeats.
            if stmt.items.is_empty() {
                let mut rel =
                    RelRecord::new(source_ref.clone(), RelKind::Imports, target_ref.clone())
                        .with("line", stmt.line);
                if let Some(alias) = &stmt.module_alias {
                    rel = rel.with("alias", alias.clone());
                }
                out.rels.push(rel);
            } else {
                for item in &stmt.items {
                    let mut rel =
                        RelRecord::new(source_ref.clone(), RelKind::Imports, target_ref.clone())
                            .with("line", stmt.line)
                            .with("item", item.name.clone());
                    if let Some(alias) = &item.alias {
                        rel = rel.with("alias", alias.clone());
                    }
                    out.rels.push(rel);
                }
            }
        }
    }

    out
}
