//! Query execution: the per-tenant gateway and the executor seam used by bound routes.

mod executor;
mod gateway;
pub use executor::{LocalExecutor, QueryExecutor, RemoteExecutor};
pub use gateway::{DatabaseGateway, QueryOutcome};
