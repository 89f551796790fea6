//! Structure builder: filesystem skeleton → graph nodes.
//!
//! Creates the single Project node, promotes directories with a package
//! signal to Package (Folder otherwise), and creates File plus Module nodes
//! for every classified source file. No file contents are read here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use codegraph_core::qualified;
use codegraph_core::types::{NodeLabel, NodeRecord, NodeRef, RelKind, RelRecord};
use codegraph_parsers::strategy::LanguageStrategy;
use codegraph_parsers::walker::Discovery;

/// Planned structural emissions plus the file → module mapping the
/// definition phase builds on.
#[derive(Debug, Default)]
pub struct StructurePlan {
    pub nodes: Vec<NodeRecord>,
    pub rels: Vec<RelRecord>,
    /// `(rel_path, module_qn, language)` for every parseable module.
    pub modules: Vec<(PathBuf, String, &'static str)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirKind {
    Folder,
    Package,
}

fn rel_str(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Dotted form of a directory path. Unlike file paths no extension is
/// stripped, so a folder named `v1.2` keeps its dot.
fn dotted_dir(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Builds the structural skeleton from a discovery result.
pub fn build(
    project: &str,
    repo_root: &Path,
    discovery: &Discovery,
    strategies: &[Box<dyn LanguageStrategy>],
) -> StructurePlan {
    let mut plan = StructurePlan::default();

    plan.nodes
        .push(NodeRecord::new(NodeLabel::Project, project).with("name", project));
    let project_ref = NodeRef::new(NodeLabel::Project, project);

    // Classify every directory first so parent lookups are resolved.
    let mut dir_kinds: BTreeMap<PathBuf, DirKind> = BTreeMap::new();
    for dir in &discovery.directories {
        let abs = repo_root.join(dir);
        let kind = if strategies.iter().any(|s| s.package_signal(&abs)) {
            DirKind::Package
        } else {
            DirKind::Folder
        };
        dir_kinds.insert(dir.clone(), kind);
    }

    let dir_ref = |dir: &Path, kinds: &BTreeMap<PathBuf, DirKind>| -> NodeRef {
        match kinds.get(dir) {
            Some(DirKind::Package) => NodeRef::new(
                NodeLabel::Package,
                qualified::join(project, &dotted_dir(dir)),
            ),
            _ => NodeRef::new(NodeLabel::Folder, rel_str(dir)),
        }
    };

    let container_of = |dir: Option<&Path>, kinds: &BTreeMap<PathBuf, DirKind>| -> NodeRef {
        match dir {
            Some(d) if !d.as_os_str().is_empty() => dir_ref(d, kinds),
            _ => project_ref.clone(),
        }
    };

    for (dir, kind) in &dir_kinds {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let parent = container_of(dir.parent(), &dir_kinds);
        match kind {
            DirKind::Package => {
                let qn = qualified::join(project, &dotted_dir(dir));
                plan.nodes.push(
                    NodeRecord::new(NodeLabel::Package, &qn)
                        .with("name", name)
                        .with("path", rel_str(dir)),
                );
                let edge_kind = if parent.label == NodeLabel::Package {
                    RelKind::ContainsSubpackage
                } else {
                    RelKind::ContainsPackage
                };
                plan.rels.push(RelRecord::new(
                    parent,
                    edge_kind,
                    NodeRef::new(NodeLabel::Package, qn),
                ));
            }
            DirKind::Folder => {
                let path = rel_str(dir);
                plan.nodes.push(
                    NodeRecord::new(NodeLabel::Folder, &path).with("name", name),
                );
                plan.rels.push(RelRecord::new(
                    parent,
                    RelKind::ContainsFolder,
                    NodeRef::new(NodeLabel::Folder, path),
                ));
            }
        }
    }

    for file in &discovery.files {
        let path = rel_str(&file.rel_path);
        let name = file
            .rel_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = file
            .rel_path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        let parent = container_of(file.rel_path.parent(), &dir_kinds);

        plan.nodes.push(
            NodeRecord::new(NodeLabel::File, &path)
                .with("name", name.clone())
                .with("extension", extension)
                .with("language", file.language),
        );
        plan.rels.push(RelRecord::new(
            parent.clone(),
            RelKind::ContainsFile,
            NodeRef::new(NodeLabel::File, path.clone()),
        ));

        let Some(strategy) = strategies.iter().find(|s| s.language() == file.language) else {
            continue;
        };
        let segs = strategy.module_path(&file.rel_path);
        let module_qn = qualified::join(project, &segs.join("."));
        let module_name = segs.last().cloned().unwrap_or_else(|| project.to_string());
        plan.nodes.push(
            NodeRecord::new(NodeLabel::Module, &module_qn)
                .with("name", module_name)
                .with("path", path)
                .with("language", file.language),
        );
        plan.rels.push(RelRecord::new(
            parent,
            RelKind::ContainsModule,
            NodeRef::new(NodeLabel::Module, module_qn.clone()),
        ));
        plan.modules
            .push((file.rel_path.clone(), module_qn, file.language));
    }

    plan
}
