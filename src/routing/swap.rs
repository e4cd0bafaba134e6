//! Single publication point for the snapshot and route table that requests dispatch against.

use crate::config::EndpointConfig;
use crate::routing::table::RouteTable;
use std::sync::{Arc, RwLock};

/// A snapshot and the table built from it, published together.
pub struct Published {
    pub generation: u64,
    pub snapshot: Arc<Vec<EndpointConfig>>,
    pub table: Arc<RouteTable>,
}

/// Readers hold the lock only to clone an `Arc`; an in-flight request keeps the table it started with.
pub struct RouteTableSwap {
    current: RwLock<Arc<Published>>,
}

impl Default for RouteTableSwap {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTableSwap {
    /// Starts with generation 0: an empty snapshot and no dynamic routes.
    pub fn new() -> Self {
        RouteTableSwap {
            current: RwLock::new(Arc::new(Published {
                generation: 0,
                snapshot: Arc::new(Vec::new()),
                table: Arc::new(RouteTable::default()),
            })),
        }
    }

    pub fn current(&self) -> Arc<Published> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn table(&self) -> Arc<RouteTable> {
        self.current().table.clone()
    }

    pub fn snapshot(&self) -> Arc<Vec<EndpointConfig>> {
        self.current().snapshot.clone()
    }

    /// Install a fully built table. Returns the new generation.
    pub fn publish(&self, snapshot: Vec<EndpointConfig>, table: RouteTable) -> u64 {
        let snapshot = Arc::new(snapshot);
        let table = Arc::new(table);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let generation = guard.generation + 1;
        *guard = Arc::new(Published {
            generation,
            snapshot,
            table,
        });
        generation
    }
}
