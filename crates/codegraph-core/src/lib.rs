//! Core types, sink adapters, and configuration for codegraph.
//!
//! This crate provides the foundational data structures used across all
//! codegraph crates:
//! - [`types`] — Node labels, relationship kinds, records, and error types
//! - [`qualified`] — Dotted qualified-name construction and normalization
//! - [`sink`] — The [`GraphSink`](sink::GraphSink) trait and the in-memory
//!   recording sink
//! - [`buffer`] — Deduplicating, batching sink adapter
//! - [`sqlite`] — SQLite-backed implementation of `GraphSink`
//! - [`config`] — Configuration loading from `.codegraph/codegraph.json`
//! - [`summary`] — The structured run summary returned by the pipeline

pub mod buffer;
pub mod config;
pub mod hash;
pub mod qualified;
pub mod sink;
pub mod sqlite;
pub mod summary;
pub mod types;
