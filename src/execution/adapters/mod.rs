//! Adapter implementations for execution ports.

mod broadcast;
pub mod http;
pub mod memory;
pub mod postgres;

pub use broadcast::BroadcastProgressHub;
