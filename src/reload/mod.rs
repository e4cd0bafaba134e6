//! Configuration reload: sources produce snapshots, the reloader turns them into published route tables.
//!
//! ```text
//! SnapshotSource::fetch (poll)  ─┐
//!                                ├─> Reloader::apply ─> RouteTableBuilder::build ─> RouteTableSwap::publish
//! mpsc::Receiver (push)         ─┘
//! ```

mod poller;
mod source;

pub use poller::ConfigPoller;
pub use source::{HttpConfigSource, SnapshotSource};

use crate::config::EndpointConfig;
use crate::routing::{RouteTableBuilder, RouteTableSwap};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The only writer of a `RouteTableSwap`.
pub struct Reloader {
    builder: RouteTableBuilder,
    swap: Arc<RouteTableSwap>,
}

impl Reloader {
    pub fn new(builder: RouteTableBuilder, swap: Arc<RouteTableSwap>) -> Self {
        Reloader { builder, swap }
    }

    /// Build a table from `snapshot` and publish both. Returns the new generation.
    pub fn apply(&self, snapshot: Vec<EndpointConfig>) -> u64 {
        let table = self.builder.build(&snapshot);
        let configs = snapshot.len();
        let routes = table.len();
        let generation = self.swap.publish(snapshot, table);
        tracing::info!(generation, configs, routes, "route table published");
        generation
    }

    /// Apply every snapshot pushed on `rx` until the sender side is dropped.
    pub async fn run_push(self, mut rx: mpsc::Receiver<Vec<EndpointConfig>>) {
        while let Some(snapshot) = rx.recv().await {
            self.apply(snapshot);
        }
        tracing::info!("config feed closed");
    }
}
