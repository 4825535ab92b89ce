//! Foreman: language-model task execution pipeline.
//!
//! This crate turns a free-text task into a run: the task is classified into
//! a category, a model proposes a JSON step plan, and each step is executed
//! as a timed simulation. Every milestone is persisted as an execution log
//! entry and pushed to the requesting user as a realtime progress event.
//!
//! # Architecture
//!
//! Foreman follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, APIs, etc.)
//!
//! # Modules
//!
//! - [`task`]: Task and workflow records with their status machines
//! - [`execution`]: Runs, plans, logs, progress events, and the pipeline

pub mod execution;
pub mod task;
