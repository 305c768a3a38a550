//! Typed failures returned by the tank registry and parameter ledger.

use thiserror::Error;

/// Result alias used by every store operation.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by store operations.
///
/// Nothing in the store retries; each variant reaches the caller as-is.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed or missing input (empty name, bad size, bad date).
    #[error("{0}")]
    Validation(String),

    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),

    /// The referenced tank or parameter record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Underlying persistence failure.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl StoreError {
    pub fn tank_not_found(tank_id: i64) -> Self {
        // ---
        StoreError::NotFound(format!("Tank {tank_id} not found"))
    }
}

/// Constraint kinds the store maps onto domain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constraint {
    Unique,
    ForeignKey,
}

/// Which constraint, if any, rejected a failed write.
pub(crate) fn violated_constraint(err: &sqlx::Error) -> Option<Constraint> {
    // ---
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if db_err.is_unique_violation() {
        Some(Constraint::Unique)
    } else if db_err.is_foreign_key_violation() {
        Some(Constraint::ForeignKey)
    } else {
        None
    }
}
