//! Step definitions for task execution behaviour tests.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
