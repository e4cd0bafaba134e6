//! Dynamic routing: table construction from snapshots and the swap that publishes it.

pub mod swap;
pub mod table;

pub use swap::{Published, RouteTableSwap};
pub use table::{
    BoundHandler, RouteKey, RouteTable, RouteTableBuilder, HEALTH_PATH,
    RESERVED_GET_PATHS, VERSION_PATH,
};
