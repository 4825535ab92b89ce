//! Task and workflow records consumed by the execution pipeline.
//!
//! Tasks are created by the surrounding CRUD layer; the pipeline only reads
//! them, lazily attaches a workflow, and moves them through their status
//! machine. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
