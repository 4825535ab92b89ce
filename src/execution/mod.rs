//! Task execution pipeline.
//!
//! A run classifies a task with a language model, asks the model for a JSON
//! step plan, walks the steps in order as timed simulations, and records
//! every milestone as an execution log entry and a realtime progress event.
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
