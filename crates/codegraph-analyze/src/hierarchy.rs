//! Inheritance fix-up: resolves base clauses recorded during the definition
//! phase, emits `INHERITS` / `IMPLEMENTS` edges with cycle rejection, and
//! derives `OVERRIDES` edges for redeclared inherited methods.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::unionfind::UnionFind;

use codegraph_core::qualified;
use codegraph_core::types::{NodeLabel, NodeRef, RelKind, RelRecord};
use codegraph_parsers::outline::BaseKind;

use crate::symbols::{ImportTarget, SymbolTable};

/// Resolves a base-clause name in the context of a class's module.
fn resolve_base(table: &SymbolTable, module_qn: &str, raw: &str) -> Option<String> {
    let root = qualified::root(raw);
    let rest = raw.strip_prefix(root).unwrap_or("").trim_start_matches('.');
    let with_rest = |base: String| {
        if rest.is_empty() {
            base
        } else {
            qualified::join(&base, rest)
        }
    };

    if let Some(module) = table.modules.get(module_qn) {
        if let Some(local) = module.locals.get(root) {
            let candidate = with_rest(local.qn.clone());
            if table.classes.contains_key(&candidate) {
                return Some(candidate);
            }
        }
        if let Some(ImportTarget::Internal(target)) = module.imports.get(root) {
            let candidate = with_rest(target.clone());
            if table.classes.contains_key(&candidate) {
                return Some(candidate);
            }
        }
        for source in &module.wildcard_sources {
            if let Some(local) = table.modules.get(source).and_then(|m| m.locals.get(root)) {
                let candidate = with_rest(local.qn.clone());
                if table.classes.contains_key(&candidate) {
                    return Some(candidate);
                }
            }
        }
    }

    // Same-module class that never reached the top-level table (nested,
    // synthesized from an impl block).
    let in_module: Vec<&String> = table
        .classes
        .iter()
        .filter(|(qn, info)| {
            info.module_qn == module_qn && qualified::last_segment(qn) == root
        })
        .map(|(qn, _)| qn)
        .collect();
    if let [only] = in_module.as_slice() {
        return Some((*only).clone());
    }

    // Last resort: a unique bare-name match anywhere in the repository.
    let global: Vec<&String> = table
        .classes
        .keys()
        .filter(|qn| qualified::last_segment(qn) == root)
        .collect();
    match global.as_slice() {
        [only] => Some((*only).clone()),
        _ => None,
    }
}

/// Resolves every class's bases, emits hierarchy edges, and returns them
/// together with the derived overrides.
pub fn resolve_hierarchy(table: &mut SymbolTable) -> Vec<RelRecord> {
    let mut rels = Vec::new();

    // Pass 1: resolve raw base names per class.
    let mut resolved: BTreeMap<String, Vec<(String, BaseKind)>> = BTreeMap::new();
    for (qn, info) in &table.classes {
        let mut bases = Vec::new();
        for (raw, kind) in &info.raw_bases {
            match resolve_base(table, &info.module_qn, raw) {
                Some(base_qn) if base_qn != *qn => bases.push((base_qn, *kind)),
                Some(_) => {}
                None => {
                    tracing::debug!(class = %qn, base = %raw, "base clause did not resolve");
                }
            }
        }
        resolved.insert(qn.clone(), bases);
    }

    // Pass 2: emit, rejecting INHERITS cycles. Union-find gives the cheap
    // connectivity signal; a directed walk confirms before refusing so
    // diamond hierarchies stay legal.
    let index: HashMap<String, usize> = table
        .classes
        .keys()
        .enumerate()
        .map(|(i, qn)| (qn.clone(), i))
        .collect();
    let mut uf: UnionFind<usize> = UnionFind::new(index.len());
    let mut accepted: HashMap<String, Vec<String>> = HashMap::new();

    let reaches = |adj: &HashMap<String, Vec<String>>, from: &str, to: &str| -> bool {
        let mut stack = vec![from.to_string()];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(parents) = adj.get(&current) {
                stack.extend(parents.iter().cloned());
            }
        }
        false
    };

    for (child, bases) in &resolved {
        for (base, kind) in bases {
            if *kind == BaseKind::Inherits {
                let (ci, bi) = (index[child], index[base]);
                if !uf.union(ci, bi) && reaches(&accepted, base, child) {
                    tracing::warn!(
                        child = %child,
                        base = %base,
                        "refusing cycle-closing INHERITS edge"
                    );
                    continue;
                }
                accepted
                    .entry(child.clone())
                    .or_default()
                    .push(base.clone());
            }
            let rel_kind = match kind {
                BaseKind::Inherits => RelKind::Inherits,
                BaseKind::Implements => RelKind::Implements,
            };
            rels.push(RelRecord::new(
                NodeRef::new(NodeLabel::Class, child.clone()),
                rel_kind,
                NodeRef::new(NodeLabel::Class, base.clone()),
            ));
            if let Some(info) = table.classes.get_mut(child) {
                if !info.bases.contains(base) {
                    info.bases.push(base.clone());
                }
            }
        }
    }

    // Pass 3: overrides. A method redeclared anywhere up the resolved chain
    // points at the nearest ancestor declaration.
    let mut overrides = Vec::new();
    for (qn, info) in &table.classes {
        for (name, method_qn) in &info.methods {
            let mut queue: Vec<String> = info.bases.clone();
            let mut seen = HashSet::new();
            seen.insert(qn.clone());
            while let Some(ancestor) = queue.pop() {
                if !seen.insert(ancestor.clone()) {
                    continue;
                }
                if let Some(ancestor_info) = table.classes.get(&ancestor) {
                    if let Some(parent_method) = ancestor_info.methods.get(name) {
                        overrides.push(RelRecord::new(
                            NodeRef::new(NodeLabel::Method, method_qn.clone()),
                            RelKind::Overrides,
                            NodeRef::new(NodeLabel::Method, parent_method.clone()),
                        ));
                        break;
                    }
                    for base in &ancestor_info.bases {
                        queue.insert(0, base.clone());
                    }
                }
            }
        }
    }
    rels.extend(overrides);

    rels
}
