pub mod common;
pub mod dynamic;

pub use common::common_routes;
pub use dynamic::{dynamic_routes, RouterLimits};
