//! Deduplicating, batching sink adapter.
//!
//! Sits between the pipeline and any [`GraphSink`]: operations are
//! deduplicated by identity hash within the run, buffered, and written
//! through in batches. Relationship emission may precede target-node
//! emission within a batch because the underlying sink is keyed and
//! idempotent.

use std::collections::{BTreeMap, HashSet};

use crate::hash::identity64;
use crate::sink::GraphSink;
use crate::types::{NodeRecord, RelRecord, SinkError};

/// Per-run emission counters, split by label and relationship type.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EmissionCounts {
    pub nodes_by_label: BTreeMap<String, u64>,
    pub edges_by_type: BTreeMap<String, u64>,
}

/// Buffered writer over an inner sink. Not thread-safe by itself; the
/// pipeline drives it from a single writer thread fed by a bounded channel.
pub struct BufferedSink<S: GraphSink> {
    inner: S,
    batch_size: usize,
    node_buf: Vec<NodeRecord>,
    rel_buf: Vec<RelRecord>,
    seen_nodes: HashSet<u64>,
    seen_rels: HashSet<u64>,
    counts: EmissionCounts,
    pending: usize,
}

impl<S: GraphSink> BufferedSink<S> {
    pub fn new(inner: S, batch_size: usize) -> Self {
        Self {
            inner,
            batch_size: batch_size.max(1),
            node_buf: Vec::new(),
            rel_buf: Vec::new(),
            seen_nodes: HashSet::new(),
            seen_rels: HashSet::new(),
            counts: EmissionCounts::default(),
            pending: 0,
        }
    }

    /// Queue a node upsert. Duplicate identities within the run are dropped.
    pub fn ensure_node(&mut self, node: NodeRecord) -> Result<(), SinkError> {
        let id = identity64(&[node.label.as_str(), &node.key]);
        if !self.seen_nodes.insert(id) {
            return Ok(());
        }
        *self
            .counts
            .nodes_by_label
            .entry(node.label.as_str().to_string())
            .or_default() += 1;
        self.node_buf.push(node);
        self.bump()
    }

    /// Queue a relationship upsert, keyed by `(source, type, target)`.
    pub fn ensure_relationship(&mut self, rel: RelRecord) -> Result<(), SinkError> {
        let id = identity64(&[
            rel.source.label.as_str(),
            &rel.source.key,
            rel.kind.as_str(),
            rel.target.label.as_str(),
            &rel.target.key,
        ]);
        if !self.seen_rels.insert(id) {
            return Ok(());
        }
        *self
            .counts
            .edges_by_type
            .entry(rel.kind.as_str().to_string())
            .or_default() += 1;
        self.rel_buf.push(rel);
        self.bump()
    }

    fn bump(&mut self) -> Result<(), SinkError> {
        self.pending += 1;
        if self.pending >= self.batch_size {
            self.write_batch()?;
        }
        Ok(())
    }

    fn write_batch(&mut self) -> Result<(), SinkError> {
        for node in self.node_buf.drain(..) {
            self.inner.ensure_node(&node)?;
        }
        for rel in self.rel_buf.drain(..) {
            self.inner.ensure_relationship(&rel)?;
        }
        self.pending = 0;
        self.inner.flush()
    }

    /// Flush all buffered operations through the inner sink.
    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.write_batch()
    }

    /// Best-effort final flush on the failure path. Write errors are
    /// swallowed so the original sink error stays the surfaced one.
    pub fn diagnostic_flush(&mut self) {
        for node in self.node_buf.drain(..) {
            let _ = self.inner.ensure_node(&node);
        }
        for rel in self.rel_buf.drain(..) {
            let _ = self.inner.ensure_relationship(&rel);
        }
        self.pending = 0;
        let _ = self.inner.flush();
    }

    pub fn counts(&self) -> &EmissionCounts {
        &self.counts
    }

    /// Flushes and returns the inner sink together with the emission counts.
    pub fn finish(mut self) -> Result<(S, EmissionCounts), SinkError> {
        self.write_batch()?;
        Ok((self.inner, self.counts))
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }
}
