//! External dependency scan.
//!
//! Reads the dependency manifests present at the repo root and emits
//! `ExternalPackage` nodes with `DEPENDS_ON_EXTERNAL` edges from the
//! Project. Parsing is line-oriented and intentionally tolerant; a manifest
//! that fails to parse contributes nothing.

use std::collections::BTreeMap;
use std::path::Path;

use codegraph_core::types::{NodeLabel, NodeRecord, NodeRef, RelKind, RelRecord};

/// `name → version_spec` found across all manifests.
pub fn scan(repo_root: &Path) -> BTreeMap<String, String> {
    let mut deps = BTreeMap::new();

    if let Ok(content) = std::fs::read_to_string(repo_root.join("package.json")) {
        parse_package_json(&content, &mut deps);
    }
    if let Ok(content) = std::fs::read_to_string(repo_root.join("requirements.txt")) {
        parse_requirements(&content, &mut deps);
    }
    if let Ok(content) = std::fs::read_to_string(repo_root.join("pyproject.toml")) {
        parse_pyproject(&content, &mut deps);
    }
    if let Ok(content) = std::fs::read_to_string(repo_root.join("Cargo.toml")) {
        parse_cargo(&content, &mut deps);
    }
    if let Ok(content) = std::fs::read_to_string(repo_root.join("go.mod")) {
        parse_go_mod(&content, &mut deps);
    }

    deps
}

/// Emission records for a scanned dependency set.
pub fn emit(project: &str, deps: &BTreeMap<String, String>) -> (Vec<NodeRecord>, Vec<RelRecord>) {
    let project_ref = NodeRef::new(NodeLabel::Project, project);
    let mut nodes = Vec::new();
    let mut rels = Vec::new();
    for (name, version_spec) in deps {
        nodes.push(
            NodeRecord::new(NodeLabel::ExternalPackage, name)
                .with("name", name.clone())
                .with("version_spec", version_spec.clone()),
        );
        rels.push(RelRecord::new(
            project_ref.clone(),
            RelKind::DependsOnExternal,
            NodeRef::new(NodeLabel::ExternalPackage, name),
        ));
    }
    (nodes, rels)
}

fn parse_package_json(content: &str, deps: &mut BTreeMap<String, String>) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(content) else {
        return;
    };
    for section in ["dependencies", "devDependencies"] {
        if let Some(map) = value.get(section).and_then(|v| v.as_object()) {
            for (name, spec) in map {
                deps.insert(
                    name.clone(),
                    spec.as_str().unwrap_or_default().to_string(),
                );
            }
        }
    }
}

fn parse_requirements(content: &str, deps: &mut BTreeMap<String, String>) {
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }
        let split_at = line
            .find(|c| ['=', '<', '>', '!', '~', ';', '['].contains(&c))
            .unwrap_or(line.len());
        let (name, spec) = line.split_at(split_at);
        let name = name.trim();
        if !name.is_empty() {
            deps.insert(name.to_string(), spec.trim().to_string());
        }
    }
}

fn parse_pyproject(content: &str, deps: &mut BTreeMap<String, String>) {
    let mut in_list = false;
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with("dependencies") && line.contains('[') {
            in_list = !line.contains(']');
            for item in line.split('[').nth(1).unwrap_or("").split(',') {
                add_requirement(item, deps);
            }
            continue;
        }
        if in_list {
            if line.starts_with(']') {
                in_list = false;
                continue;
            }
            add_requirement(line, deps);
        }
    }
}

fn add_requirement(raw: &str, deps: &mut BTreeMap<String, String>) {
    let cleaned = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == ',' || c == ']');
    if cleaned.is_empty() {
        return;
    }
    parse_requirements(cleaned, deps);
}

fn parse_cargo(content: &str, deps: &mut BTreeMap<String, String>) {
    let mut in_deps = false;
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_deps = line.trim_matches(['[', ']']).ends_with("dependencies");
            continue;
        }
        if !in_deps || line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((name, spec)) = line.split_once('=') else {
            continue;
        };
        let name = name.trim();
        let spec = spec.trim();
        let version = if spec.starts_with('{') {
            spec.split("version")
                .nth(1)
                .and_then(|v| v.split('"').nth(1))
                .unwrap_or_default()
                .to_string()
        } else {
            spec.trim_matches('"').to_string()
        };
        if !name.is_empty() && !name.contains('.') {
            deps.insert(name.to_string(), version);
        }
    }
}

fn parse_go_mod(content: &str, deps: &mut BTreeMap<String, String>) {
    let mut in_require = false;
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with("require (") {
            in_require = true;
            continue;
        }
        if in_require && line.starts_with(')') {
            in_require = false;
            continue;
        }
        let spec = if in_require {
            Some(line)
        } else {
            line.strip_prefix("require ")
        };
        if let Some(spec) = spec {
            let mut parts = spec.split_whitespace();
            if let (Some(name), Some(version)) = (parts.next(), parts.next()) {
                deps.insert(name.to_string(), version.to_string());
            }
        }
    }
}
