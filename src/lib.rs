//! Core of the `reef-tracker` service: a per-tank, per-day ledger of reef
//! water parameters with a rolling water-change aggregate.
//!
//! Follows the Explicit Module Boundary Pattern (EMBP): the binary only
//! talks to `config`, `store` and `routes`, and each of those re-exports
//! what its siblings need.

pub mod analytics;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod schema;
pub mod store;

pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use models::{
    NewTank, ParameterFields, ParameterKey, ParameterRecord, Tank, TankParameterRecord,
    TankUpdate,
};
pub use store::{ParameterLedger, ReefStore, SqliteStore, TankRegistry};
