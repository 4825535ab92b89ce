//! Adapter implementations for task and workflow persistence.

pub mod memory;
pub mod postgres;
