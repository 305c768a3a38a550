//! Storage interfaces for the tank registry and parameter ledger.
//!
//! The HTTP layer only sees these traits; connection pooling and
//! transaction scoping belong to the implementation ([`SqliteStore`]).

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::analytics::WaterChangeSummary;
use crate::error::StoreResult;
use crate::models::{
    NewTank, ParameterFields, ParameterKey, ParameterRecord, Tank, TankParameterRecord,
    TankUpdate,
};

mod sqlite;

pub use sqlite::SqliteStore;

// ---

/// Owns the set of tanks.
#[async_trait]
pub trait TankRegistry: Send + Sync {
    /// All tanks, ordered by name.
    async fn list_tanks(&self) -> StoreResult<Vec<Tank>>;

    async fn get_tank(&self, id: i64) -> StoreResult<Tank>;

    /// Register a tank. Fails with `Conflict` if the name is taken.
    async fn create_tank(&self, tank: NewTank) -> StoreResult<Tank>;

    /// Apply the provided fields to an existing tank.
    async fn update_tank(&self, id: i64, update: TankUpdate) -> StoreResult<Tank>;

    /// Remove a tank together with its whole parameter history.
    async fn delete_tank(&self, id: i64) -> StoreResult<()>;
}

/// Owns the per-tank, per-day parameter records.
///
/// Every operation scoped to a tank fails with `NotFound` when the tank
/// does not exist, including reads.
#[async_trait]
pub trait ParameterLedger: Send + Sync {
    /// Records of one tank, oldest date first.
    async fn list_parameters(&self, tank_id: i64) -> StoreResult<Vec<ParameterRecord>>;

    /// Records of every tank with the owning tank's name.
    async fn list_all_parameters(&self) -> StoreResult<Vec<TankParameterRecord>>;

    async fn get_parameter(&self, tank_id: i64, date: &str) -> StoreResult<ParameterRecord>;

    /// Insert or fully replace the record at `(tank_id, date)`.
    async fn upsert_parameter(
        &self,
        tank_id: i64,
        date: &str,
        fields: ParameterFields,
    ) -> StoreResult<ParameterKey>;

    async fn delete_parameter(&self, tank_id: i64, date: &str) -> StoreResult<()>;

    /// Remove every record of one tank; returns how many were removed.
    async fn clear_parameters(&self, tank_id: i64) -> StoreResult<u64>;

    /// Remove every record of every tank; returns how many were removed.
    async fn clear_all_parameters(&self) -> StoreResult<u64>;

    /// Percentage of the tank volume changed in the 30 days ending at `as_of`.
    async fn monthly_water_change_percent(&self, tank_id: i64, as_of: NaiveDate)
        -> StoreResult<f64>;

    async fn water_change_summary(
        &self,
        tank_id: i64,
        as_of: NaiveDate,
    ) -> StoreResult<WaterChangeSummary>;
}

/// The full store injected into the router.
pub trait ReefStore: TankRegistry + ParameterLedger {}

impl<T> ReefStore for T where T: TankRegistry + ParameterLedger {}
