//! Definition processing: per-file outlines → symbol table → definition
//! nodes and `DEFINES` / `DEFINES_METHOD` edges.
//!
//! Merging happens while the definition phase runs; linking and emission run
//! once every file has been merged, so cross-file joins (C++ out-of-class
//! methods, Rust `impl` blocks in sibling modules) see the full table.

use std::collections::HashMap;

use codegraph_core::qualified;
use codegraph_core::types::{NodeLabel, NodeRecord, NodeRef, RelKind, RelRecord};
use codegraph_parsers::outline::{DefKind, FileOutline};
use codegraph_parsers::strategy::LanguageStrategy;

use crate::symbols::{ClassInfo, DefRecord, ModuleInfo, SymbolKind, SymbolRef, SymbolTable};

/// Merges one file's outline into the table. Called once per parsed file
/// during the definition phase.
pub fn merge_outline(table: &mut SymbolTable, module_qn: &str, outline: &FileOutline) {
    let module = table
        .modules
        .entry(module_qn.to_string())
        .or_insert_with(|| ModuleInfo {
            qn: module_qn.to_string(),
            language: outline.language,
            ..Default::default()
        });
    module.language = outline.language;
    table
        .path_to_module
        .insert(outline.rel_path.clone(), module_qn.to_string());

    for def in &outline.definitions {
        let parent_qn = if def.scope.is_empty() {
            module_qn.to_string()
        } else {
            qualified::join(module_qn, &def.scope.join("."))
        };
        let mut qn = qualified::join_with(&parent_qn, &def.name, if def.scope.is_empty() {
            '.'
        } else {
            def.method_sep
        });

        let already = table.def_index.get(&qn).copied();
        if let Some(idx) = already {
            let existing_kind = table.defs[idx].kind;
            if def.kind == DefKind::Class && existing_kind == DefKind::Class {
                // Same class seen twice (impl block, Lua method table):
                // union the base clauses, keep the real definition's attrs.
                let existing = &mut table.defs[idx];
                if existing.synthetic && !def.synthetic {
                    existing.start_line = def.start_line;
                    existing.end_line = def.end_line;
                    existing.decorators = def.decorators.clone();
                    existing.docstring = def.docstring.clone();
                    existing.synthetic = false;
                }
                let class = table.classes.entry(qn.clone()).or_default();
                for (base, kind) in def.bases.iter().map(|b| (b.name.clone(), b.kind)) {
                    if !class.raw_bases.iter().any(|(n, k)| *n == base && *k == kind) {
                        class.raw_bases.push((base, kind));
                    }
                }
                continue;
            }
            if def.kind != DefKind::Class && existing_kind != DefKind::Class {
                let existing_synthetic = table.defs[idx].synthetic;
                if existing_synthetic || def.synthetic {
                    // Declaration/definition pair (C++ header split): one
                    // method, the definition's position wins.
                    if existing_synthetic && !def.synthetic {
                        let existing = &mut table.defs[idx];
                        existing.start_line = def.start_line;
                        existing.end_line = def.end_line;
                        existing.synthetic = false;
                    }
                    continue;
                }
                // Same-scope redefinition: an overload set. Later members get
                // a position-derived disambiguator.
                let member_qn = format!("{qn}@{}", def.start_line);
                table
                    .overloads
                    .entry(qn.clone())
                    .or_default()
                    .push(member_qn.clone());
                qn = member_qn;
            }
        }

        let record = DefRecord {
            qn: qn.clone(),
            name: def.name.clone(),
            kind: def.kind,
            module_qn: module_qn.to_string(),
            parent_qn: parent_qn.clone(),
            start_line: def.start_line,
            end_line: def.end_line,
            decorators: def.decorators.clone(),
            is_async: def.is_async,
            is_static: def.is_static,
            docstring: def.docstring.clone(),
            synthetic: def.synthetic,
        };

        if def.kind == DefKind::Class {
            let class = table.classes.entry(qn.clone()).or_insert_with(|| ClassInfo {
                qn: qn.clone(),
                module_qn: module_qn.to_string(),
                ..Default::default()
            });
            for base in &def.bases {
                if !class
                    .raw_bases
                    .iter()
                    .any(|(n, k)| *n == base.name && *k == base.kind)
                {
                    class.raw_bases.push((base.name.clone(), base.kind));
                }
            }
        }
        table.def_index.insert(qn, table.defs.len());
        table.defs.push(record);
    }
}

/// Links members to their owners once every file has been merged: attaches
/// methods to classes (demoting those whose qualifier matches no class),
/// fills module-level name tables, and designates constructors.
pub fn link_members(table: &mut SymbolTable, strategies: &[Box<dyn LanguageStrategy>]) {
    // Attach or demote methods.
    let class_qns: std::collections::HashSet<String> =
        table.classes.keys().cloned().collect();
    let mut records = std::mem::take(&mut table.defs);
    for record in &mut records {
        match record.kind {
            DefKind::Method => {
                if class_qns.contains(&record.parent_qn) {
                    table.methods.insert(record.qn.clone());
                    let class = table.classes.get_mut(&record.parent_qn).expect("class exists");
                    class
                        .methods
                        .entry(record.name.clone())
                        .or_insert_with(|| record.qn.clone());
                } else {
                    record.kind = DefKind::Function;
                    table.functions.insert(record.qn.clone());
                }
            }
            DefKind::Function => {
                table.functions.insert(record.qn.clone());
            }
            DefKind::Class => {}
        }
    }
    table.defs = records;

    // Module-level names and constructors.
    let mut local_updates: Vec<(String, String, SymbolRef)> = Vec::new();
    for record in &table.defs {
        if record.parent_qn == record.module_qn {
            let kind = match record.kind {
                DefKind::Class => SymbolKind::Class,
                DefKind::Function => SymbolKind::Function,
                DefKind::Method => SymbolKind::Method,
            };
            local_updates.push((
                record.module_qn.clone(),
                record.name.clone(),
                SymbolRef {
                    qn: record.qn.clone(),
                    kind,
                },
            ));
        }
    }
    for (module_qn, name, sym) in local_updates {
        if let Some(module) = table.modules.get_mut(&module_qn) {
            module.locals.entry(name).or_insert(sym);
        }
    }

    let ctor_names: HashMap<&'static str, &'static [&'static str]> = strategies
        .iter()
        .map(|s| (s.language(), s.constructor_names()))
        .collect();
    let languages: HashMap<String, &'static str> = table
        .modules
        .iter()
        .map(|(qn, m)| (qn.clone(), m.language))
        .collect();
    for class in table.classes.values_mut() {
        let names = languages
            .get(&class.module_qn)
            .and_then(|lang| ctor_names.get(lang))
            .copied()
            .unwrap_or(&[]);
        let bare = qualified::last_segment(&class.qn).to_string();
        class.constructor = names
            .iter()
            .find_map(|n| class.methods.get(*n).cloned())
            .or_else(|| class.methods.get(&bare).cloned());
    }
}

/// Emits nodes and membership edges for every linked definition.
pub fn emit_definitions(table: &SymbolTable) -> (Vec<NodeRecord>, Vec<RelRecord>) {
    let mut nodes = Vec::new();
    let mut rels = Vec::new();
    let mut seen: HashMap<(NodeLabel, &str), usize> = HashMap::new();

    for record in &table.defs {
        let label = match record.kind {
            DefKind::Class => NodeLabel::Class,
            DefKind::Function => NodeLabel::Function,
            DefKind::Method => NodeLabel::Method,
        };
        if seen.insert((label, record.qn.as_str()), nodes.len()).is_some() {
            continue;
        }

        let mut node = NodeRecord::new(label, &record.qn)
            .with("name", record.name.clone())
            .with("decorators", record.decorators.clone())
            .with("start_line", record.start_line)
            .with("end_line", record.end_line);
        match record.kind {
            DefKind::Function => {
                node = node.with("is_async", record.is_async);
            }
            DefKind::Method => {
                node = node
                    .with("is_async", record.is_async)
                    .with("is_static", record.is_static);
            }
            DefKind::Class => {}
        }
        if let Some(doc) = &record.docstring {
            node = node.with("docstring", doc.clone());
        }
        nodes.push(node);

        match record.kind {
            DefKind::Method => {
                rels.push(RelRecord::new(
                    NodeRef::new(NodeLabel::Class, record.parent_qn.clone()),
                    RelKind::DefinesMethod,
                    NodeRef::new(NodeLabel::Method, record.qn.clone()),
                ));
            }
            DefKind::Class | DefKind::Function => {
                // DEFINES comes from the nearest Module-or-Class ancestor so
                // nested-in-function entities still hang off the module.
                let source = if table.classes.contains_key(&record.parent_qn) {
                    NodeRef::new(NodeLabel::Class, record.parent_qn.clone())
                } else {
                    NodeRef::new(NodeLabel::Module, record.module_qn.clone())
                };
                rels.push(RelRecord::new(
                    source,
                    RelKind::Defines,
                    NodeRef::new(label, record.qn.clone()),
                ));
            }
        }
    }

    // Overload sets: each later member relates back to the primary.
    for (primary, members) in &table.overloads {
        let label = |qn: &str| {
            if table.methods.contains(qn) {
                NodeLabel::Method
            } else {
                NodeLabel::Function
            }
        };
        for member in members {
            rels.push(RelRecord::new(
                NodeRef::new(label(member), member.clone()),
                RelKind::Overloads,
                NodeRef::new(label(primary), primary.clone()),
            ));
        }
    }

    (nodes, rels)
}
