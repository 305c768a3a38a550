//! Database schema management for `reef-tracker`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use sqlx::SqlitePool;

// ---

/// Create the database schema if it does not exist (idempotent).
///
/// Creates the `tanks` registry and the `parameters` ledger. Each
/// parameter row references its tank with `ON DELETE CASCADE`, and
/// `(tank_id, date)` is unique so there is at most one record per tank
/// per day. Safe to call on every startup.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tanks (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            name          TEXT    NOT NULL UNIQUE,
            size_gallons  REAL    NOT NULL CHECK (size_gallons > 0),
            created_at    TEXT    NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS parameters (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            tank_id               INTEGER NOT NULL
                                  REFERENCES tanks (id) ON DELETE CASCADE,
            date                  TEXT    NOT NULL,
            alk                   REAL,
            po4                   REAL,
            no3                   REAL,
            ca                    REAL,
            mg                    REAL,
            sg                    REAL,
            water_change_gallons  REAL CHECK (water_change_gallons >= 0),
            notes                 TEXT,
            created_at            TEXT    NOT NULL,
            UNIQUE (tank_id, date)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
