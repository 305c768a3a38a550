//! SQLite implementation of [`TankRegistry`] and [`ParameterLedger`].
//!
//! Referential integrity lives in the schema: parameter rows carry a
//! foreign key to `tanks` with `ON DELETE CASCADE`, and every connection
//! runs with `PRAGMA foreign_keys = ON`. Constraint failures are mapped
//! back onto [`StoreError`] variants here.

use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{ParameterLedger, TankRegistry};
use crate::analytics::{self, WaterChangeSummary};
use crate::error::{violated_constraint, Constraint, StoreError, StoreResult};
use crate::models::{
    parse_calendar_date, NewTank, ParameterFields, ParameterKey, ParameterRecord, Tank,
    TankParameterRecord, TankUpdate,
};
use crate::schema;

// ---

const TANK_COLUMNS: &str = "id, name, size_gallons, created_at";

const PARAMETER_COLUMNS: &str =
    "tank_id, date, alk, po4, no3, ca, mg, sg, water_change_gallons, notes, created_at";

/// Pooled SQLite store backing both the registry and the ledger.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `database_url`.
    ///
    /// Idle connections are never reaped so an in-memory database
    /// (`sqlite::memory:`) lives as long as the pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        // ---
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool. Its connections must enforce foreign keys.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables if they do not exist yet.
    pub async fn create_schema(&self) -> StoreResult<()> {
        // ---
        schema::create_schema(&self.pool).await?;
        Ok(())
    }
}

// ---

async fn fetch_tank(conn: &mut SqliteConnection, id: i64) -> StoreResult<Tank> {
    // ---
    let sql = format!("SELECT {TANK_COLUMNS} FROM tanks WHERE id = ?");
    sqlx::query_as::<_, Tank>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| StoreError::tank_not_found(id))
}

async fn fetch_water_changes(
    conn: &mut SqliteConnection,
    tank_id: i64,
) -> StoreResult<Vec<(NaiveDate, Option<f64>)>> {
    // ---
    let changes = sqlx::query_as::<_, (NaiveDate, Option<f64>)>(
        "SELECT date, water_change_gallons FROM parameters WHERE tank_id = ? ORDER BY date ASC",
    )
    .bind(tank_id)
    .fetch_all(conn)
    .await?;
    Ok(changes)
}

fn name_conflict(err: sqlx::Error, name: &str) -> StoreError {
    // ---
    match violated_constraint(&err) {
        Some(Constraint::Unique) => {
            StoreError::Conflict(format!("Tank with name '{name}' already exists"))
        }
        _ => StoreError::Storage(err),
    }
}

fn parameter_not_found(tank_id: i64, date: NaiveDate) -> StoreError {
    StoreError::NotFound(format!("No parameter record for tank {tank_id} on {date}"))
}

#[async_trait]
impl TankRegistry for SqliteStore {
    // ---
    async fn list_tanks(&self) -> StoreResult<Vec<Tank>> {
        // ---
        let sql = format!("SELECT {TANK_COLUMNS} FROM tanks ORDER BY name ASC");
        let tanks = sqlx::query_as::<_, Tank>(&sql).fetch_all(&self.pool).await?;
        debug!("Listed {} tanks", tanks.len());
        Ok(tanks)
    }

    async fn get_tank(&self, id: i64) -> StoreResult<Tank> {
        let mut conn = self.pool.acquire().await?;
        fetch_tank(&mut conn, id).await
    }

    async fn create_tank(&self, tank: NewTank) -> StoreResult<Tank> {
        // ---
        tank.validate()?;
        let name = tank.name.trim();

        let sql = format!(
            "INSERT INTO tanks (name, size_gallons, created_at) VALUES (?, ?, ?) \
             RETURNING {TANK_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Tank>(&sql)
            .bind(name)
            .bind(tank.size_gallons)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| name_conflict(e, name))?;

        info!(
            "Created tank {} '{}' ({} gal)",
            created.id, created.name, created.size_gallons
        );
        Ok(created)
    }

    async fn update_tank(&self, id: i64, update: TankUpdate) -> StoreResult<Tank> {
        // ---
        update.validate()?;
        let mut tx = self.pool.begin().await?;

        let current = fetch_tank(&mut tx, id).await?;
        if update.is_empty() {
            tx.commit().await?;
            return Ok(current);
        }

        let name = update
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(current.name.as_str())
            .to_string();
        let size_gallons = update.size_gallons.unwrap_or(current.size_gallons);

        let sql = format!(
            "UPDATE tanks SET name = ?, size_gallons = ? WHERE id = ? RETURNING {TANK_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Tank>(&sql)
            .bind(&name)
            .bind(size_gallons)
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| name_conflict(e, &name))?;

        tx.commit().await?;

        info!(
            "Updated tank {} to '{}' ({} gal)",
            updated.id, updated.name, updated.size_gallons
        );
        Ok(updated)
    }

    async fn delete_tank(&self, id: i64) -> StoreResult<()> {
        // ---
        let mut tx = self.pool.begin().await?;

        let (records,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM parameters WHERE tank_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        // Parameter rows go with the tank through ON DELETE CASCADE
        let deleted = sqlx::query("DELETE FROM tanks WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(StoreError::tank_not_found(id));
        }

        tx.commit().await?;
        info!("Deleted tank {} and {} parameter records", id, records);
        Ok(())
    }
}

#[async_trait]
impl ParameterLedger for SqliteStore {
    // ---
    async fn list_parameters(&self, tank_id: i64) -> StoreResult<Vec<ParameterRecord>> {
        // ---
        let mut tx = self.pool.begin().await?;
        fetch_tank(&mut tx, tank_id).await?;

        let sql =
            format!("SELECT {PARAMETER_COLUMNS} FROM parameters WHERE tank_id = ? ORDER BY date ASC");
        let records = sqlx::query_as::<_, ParameterRecord>(&sql)
            .bind(tank_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!("Listed {} parameter records for tank {}", records.len(), tank_id);
        Ok(records)
    }

    async fn list_all_parameters(&self) -> StoreResult<Vec<TankParameterRecord>> {
        // ---
        let records = sqlx::query_as::<_, TankParameterRecord>(
            r#"
            SELECT p.tank_id, p.date, p.alk, p.po4, p.no3, p.ca, p.mg, p.sg,
                   p.water_change_gallons, p.notes, p.created_at,
                   t.name AS tank_name
            FROM parameters p
            JOIN tanks t ON p.tank_id = t.id
            ORDER BY p.date ASC, p.tank_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Listed {} parameter records across all tanks", records.len());
        Ok(records)
    }

    async fn get_parameter(&self, tank_id: i64, date: &str) -> StoreResult<ParameterRecord> {
        // ---
        let date = parse_calendar_date(date)?;
        let sql =
            format!("SELECT {PARAMETER_COLUMNS} FROM parameters WHERE tank_id = ? AND date = ?");
        sqlx::query_as::<_, ParameterRecord>(&sql)
            .bind(tank_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| parameter_not_found(tank_id, date))
    }

    async fn upsert_parameter(
        &self,
        tank_id: i64,
        date: &str,
        fields: ParameterFields,
    ) -> StoreResult<ParameterKey> {
        // ---
        let date = parse_calendar_date(date)?;
        fields.validate()?;

        // created_at is left out of the update so it keeps the first insert time
        sqlx::query(
            r#"
            INSERT INTO parameters (
                tank_id, date, alk, po4, no3, ca, mg, sg,
                water_change_gallons, notes, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (tank_id, date) DO UPDATE SET
                alk = excluded.alk,
                po4 = excluded.po4,
                no3 = excluded.no3,
                ca = excluded.ca,
                mg = excluded.mg,
                sg = excluded.sg,
                water_change_gallons = excluded.water_change_gallons,
                notes = excluded.notes
            "#,
        )
        .bind(tank_id)
        .bind(date)
        .bind(fields.alk)
        .bind(fields.po4)
        .bind(fields.no3)
        .bind(fields.ca)
        .bind(fields.mg)
        .bind(fields.sg)
        .bind(fields.water_change_gallons)
        .bind(&fields.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match violated_constraint(&e) {
            Some(Constraint::ForeignKey) => StoreError::tank_not_found(tank_id),
            _ => StoreError::Storage(e),
        })?;

        info!("Upserted parameters for tank {} on {}", tank_id, date);
        Ok(ParameterKey { tank_id, date })
    }

    async fn delete_parameter(&self, tank_id: i64, date: &str) -> StoreResult<()> {
        // ---
        let date = parse_calendar_date(date)?;
        let deleted = sqlx::query("DELETE FROM parameters WHERE tank_id = ? AND date = ?")
            .bind(tank_id)
            .bind(date)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(parameter_not_found(tank_id, date));
        }

        info!("Deleted parameters for tank {} on {}", tank_id, date);
        Ok(())
    }

    async fn clear_parameters(&self, tank_id: i64) -> StoreResult<u64> {
        // ---
        let mut tx = self.pool.begin().await?;
        fetch_tank(&mut tx, tank_id).await?;

        let deleted = sqlx::query("DELETE FROM parameters WHERE tank_id = ?")
            .bind(tank_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        info!("Cleared {} parameter records for tank {}", deleted, tank_id);
        Ok(deleted)
    }

    async fn clear_all_parameters(&self) -> StoreResult<u64> {
        // ---
        let deleted = sqlx::query("DELETE FROM parameters")
            .execute(&self.pool)
            .await?
            .rows_affected();

        info!("Cleared {} parameter records across all tanks", deleted);
        Ok(deleted)
    }

    async fn monthly_water_change_percent(
        &self,
        tank_id: i64,
        as_of: NaiveDate,
    ) -> StoreResult<f64> {
        // ---
        let mut tx = self.pool.begin().await?;
        let tank = fetch_tank(&mut tx, tank_id).await?;
        let changes = fetch_water_changes(&mut tx, tank_id).await?;
        tx.commit().await?;

        let percent =
            analytics::monthly_water_change_percent(changes, tank.size_gallons, as_of);
        debug!("Tank {} water change as of {}: {:.2}%", tank_id, as_of, percent);
        Ok(percent)
    }

    async fn water_change_summary(
        &self,
        tank_id: i64,
        as_of: NaiveDate,
    ) -> StoreResult<WaterChangeSummary> {
        // ---
        let mut tx = self.pool.begin().await?;
        let tank = fetch_tank(&mut tx, tank_id).await?;
        let changes = fetch_water_changes(&mut tx, tank_id).await?;
        tx.commit().await?;

        Ok(analytics::summarize(&changes, tank.size_gallons, as_of))
    }
}
