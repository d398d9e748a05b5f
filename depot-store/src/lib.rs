//! Storage for the waste capacity network.
//!
//! One [`DepotStore`] owns every durable row — warehouses, organizations,
//! availability edges, and reservations — behind a single lock, persisted as
//! a JSON state file. Mutations go through [`DepotStore::transaction`], which
//! commits all-or-nothing: a closure that errors leaves no trace in memory or
//! on disk.

pub mod config;
pub mod error;
pub mod seed;
pub mod state;
pub mod store;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use state::DepotState;
pub use store::DepotStore;
