use crate::types::{NodeRecord, RelRecord, SinkError};

/// The sink protocol — the only wire format the core owns.
///
/// Implementors must treat both `ensure_*` operations as idempotent upserts:
/// nodes are keyed by `(label, key)`, relationships by
/// `(source, type, target)`. `flush` guarantees that, after return, all
/// previously-queued operations are durable from the consumer's perspective.
pub trait GraphSink: Send {
    fn ensure_node(&mut self, node: &NodeRecord) -> Result<(), SinkError>;

    fn ensure_relationship(&mut self, rel: &RelRecord) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError>;
}

/// In-memory sink that records every emitted operation.
///
/// Used by the test suite to assert on the emission set, and useful as a dry
/// run target.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub nodes: Vec<NodeRecord>,
    pub relationships: Vec<RelRecord>,
    pub flush_count: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes with the given label.
    pub fn nodes_with_label(&self, label: crate::types::NodeLabel) -> Vec<&NodeRecord> {
        self.nodes.iter().filter(|n| n.label == label).collect()
    }

    /// Relationships of the given kind.
    pub fn rels_of_kind(&self, kind: crate::types::RelKind) -> Vec<&RelRecord> {
        self.relationships
            .iter()
            .filter(|r| r.kind == kind)
            .collect()
    }

    /// Whether a relationship `(source_key, kind, target_key)` was emitted.
    pub fn has_rel(&self, source_key: &str, kind: crate::types::RelKind, target_key: &str) -> bool {
        self.relationships.iter().any(|r| {
            r.kind == kind && r.source.key == source_key && r.target.key == target_key
        })
    }
}

impl GraphSink for RecordingSink {
    fn ensure_node(&mut self, node: &NodeRecord) -> Result<(), SinkError> {
        self.nodes.push(node.clone());
        Ok(())
    }

    fn ensure_relationship(&mut self, rel: &RelRecord) -> Result<(), SinkError> {
        self.relationships.push(rel.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.flush_count += 1;
        Ok(())
    }
}

/// Sink that fails every write. Exercises the fatal-error path in tests.
#[derive(Debug, Default)]
pub struct FailingSink;

impl GraphSink for FailingSink {
    fn ensure_node(&mut self, _node: &NodeRecord) -> Result<(), SinkError> {
        Err(SinkError::Closed)
    }

    fn ensure_relationship(&mut self, _rel: &RelRecord) -> Result<(), SinkError> {
        Err(SinkError::Closed)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        Err(SinkError::Closed)
    }
}
