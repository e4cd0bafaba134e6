//! HTTP handlers for configured endpoints.

pub mod dynamic;
pub use dynamic::*;
