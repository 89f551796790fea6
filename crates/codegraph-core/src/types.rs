use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Node labels in the code knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeLabel {
    Project,
    Package,
    Folder,
    File,
    Module,
    Class,
    Function,
    Method,
    ExternalPackage,
}

impl NodeLabel {
    /// Returns the label string as it appears in the emitted graph.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Project => "Project",
            NodeLabel::Package => "Package",
            NodeLabel::Folder => "Folder",
            NodeLabel::File => "File",
            NodeLabel::Module => "Module",
            NodeLabel::Class => "Class",
            NodeLabel::Function => "Function",
            NodeLabel::Method => "Method",
            NodeLabel::ExternalPackage => "ExternalPackage",
        }
    }

    /// The property that uniquely identifies a node with this label.
    pub fn key_property(&self) -> &'static str {
        match self {
            NodeLabel::Project | NodeLabel::ExternalPackage => "name",
            NodeLabel::Folder | NodeLabel::File => "path",
            NodeLabel::Package
            | NodeLabel::Module
            | NodeLabel::Class
            | NodeLabel::Function
            | NodeLabel::Method => "qualified_name",
        }
    }

    /// Whether this label denotes a callable entity (a valid `CALLS` target).
    pub fn is_callable(&self) -> bool {
        matches!(self, NodeLabel::Function | NodeLabel::Method)
    }
}

impl std::fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship kinds between graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelKind {
    ContainsPackage,
    ContainsFolder,
    ContainsModule,
    ContainsFile,
    ContainsSubpackage,
    DependsOnExternal,
    Defines,
    DefinesMethod,
    Imports,
    Inherits,
    Implements,
    Calls,
    Overrides,
    Overloads,
}

impl RelKind {
    /// Returns the relationship type string as it appears in the emitted graph.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelKind::ContainsPackage => "CONTAINS_PACKAGE",
            RelKind::ContainsFolder => "CONTAINS_FOLDER",
            RelKind::ContainsModule => "CONTAINS_MODULE",
            RelKind::ContainsFile => "CONTAINS_FILE",
            RelKind::ContainsSubpackage => "CONTAINS_SUBPACKAGE",
            RelKind::DependsOnExternal => "DEPENDS_ON_EXTERNAL",
            RelKind::Defines => "DEFINES",
            RelKind::DefinesMethod => "DEFINES_METHOD",
            RelKind::Imports => "IMPORTS",
            RelKind::Inherits => "INHERITS",
            RelKind::Implements => "IMPLEMENTS",
            RelKind::Calls => "CALLS",
            RelKind::Overrides => "OVERRIDES",
            RelKind::Overloads => "OVERLOADS",
        }
    }

    /// Whether this kind participates in the single-parent containment chain.
    pub fn is_containment(&self) -> bool {
        matches!(
            self,
            RelKind::ContainsPackage
                | RelKind::ContainsFolder
                | RelKind::ContainsModule
                | RelKind::ContainsFile
                | RelKind::ContainsSubpackage
                | RelKind::Defines
                | RelKind::DefinesMethod
        )
    }
}

impl std::fmt::Display for RelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property value. Scalars plus homogeneous lists of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::List(v.into_iter().map(Value::Str).collect())
    }
}

/// Ordered attribute map. BTreeMap so emission is deterministic.
pub type Attrs = BTreeMap<String, Value>;

/// A `(label, key)` reference to a node, used as relationship endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub label: NodeLabel,
    pub key: String,
}

impl NodeRef {
    pub fn new(label: NodeLabel, key: impl Into<String>) -> Self {
        Self {
            label,
            key: key.into(),
        }
    }
}

/// A node to be upserted into the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub label: NodeLabel,
    pub key: String,
    pub attrs: Attrs,
}

impl NodeRecord {
    pub fn new(label: NodeLabel, key: impl Into<String>) -> Self {
        Self {
            label,
            key: key.into(),
            attrs: Attrs::new(),
        }
    }

    /// Builder-style attribute insertion.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.label, self.key.clone())
    }
}

/// A relationship to be upserted into the graph.
///
/// Identity is `(source, kind, target)`; attributes (source line, import
/// item/alias) are carried but do not participate in identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelRecord {
    pub source: NodeRef,
    pub kind: RelKind,
    pub target: NodeRef,
    pub attrs: Attrs,
}

impl RelRecord {
    pub fn new(source: NodeRef, kind: RelKind, target: NodeRef) -> Self {
        Self {
            source,
            kind,
            target,
            attrs: Attrs::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }
}

/// Errors surfaced by sink implementations. Sink failures are the only
/// pipeline-fatal error class.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink closed")]
    Closed,
}

impl From<rusqlite::Error> for SinkError {
    fn from(e: rusqlite::Error) -> Self {
        SinkError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_key_properties() {
        assert_eq!(NodeLabel::Project.key_property(), "name");
        assert_eq!(NodeLabel::Folder.key_property(), "path");
        assert_eq!(NodeLabel::Module.key_property(), "qualified_name");
        assert_eq!(NodeLabel::Method.key_property(), "qualified_name");
    }

    #[test]
    fn test_rel_kind_strings() {
        assert_eq!(RelKind::DefinesMethod.as_str(), "DEFINES_METHOD");
        assert_eq!(RelKind::DependsOnExternal.as_str(), "DEPENDS_ON_EXTERNAL");
        assert_eq!(RelKind::Calls.as_str(), "CALLS");
    }

    #[test]
    fn test_containment_classification() {
        assert!(RelKind::ContainsFolder.is_containment());
        assert!(RelKind::Defines.is_containment());
        assert!(!RelKind::Calls.is_containment());
        assert!(!RelKind::Imports.is_containment());
    }

    #[test]
    fn test_node_record_builder() {
        let node = NodeRecord::new(NodeLabel::Function, "proj.mod.f")
            .with("name", "f")
            .with("start_line", 3u32)
            .with("is_async", false);
        assert_eq!(node.attrs.len(), 3);
        assert_eq!(node.attrs["name"], Value::Str("f".into()));
        assert_eq!(node.attrs["start_line"], Value::Int(3));
    }

    #[test]
    fn test_value_serializes_as_scalar() {
        let json = serde_json::to_string(&Value::Int(7)).unwrap();
        assert_eq!(json, "7");
        let json = serde_json::to_string(&Value::from(vec!["a".to_string(), "b".to_string()]))
            .unwrap();
        assert_eq!(json, r#"["a","b"]"#);
    }
}
