//! Data models for tanks and their daily parameter records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

// ---

/// Calendar-day format used for parameter record keys.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A tracked aquarium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tank {
    // ---
    pub id: i64,
    pub name: String,
    pub size_gallons: f64,
    pub created_at: DateTime<Utc>,
}

/// Registration request for a new tank.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTank {
    // ---
    pub name: String,
    pub size_gallons: f64,
}

/// Partial update for an existing tank; `None` leaves the field as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TankUpdate {
    // ---
    pub name: Option<String>,
    pub size_gallons: Option<f64>,
}

/// Measured values for one tank on one day.
///
/// An upsert stores these fields wholesale, so a `None` here overwrites
/// whatever was recorded before for the same key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterFields {
    // ---
    pub alk: Option<f64>,
    pub po4: Option<f64>,
    pub no3: Option<f64>,
    pub ca: Option<f64>,
    pub mg: Option<f64>,
    pub sg: Option<f64>,
    pub water_change_gallons: Option<f64>,
    pub notes: Option<String>,
}

/// A stored parameter record, keyed by `(tank_id, date)`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ParameterRecord {
    // ---
    pub tank_id: i64,
    pub date: NaiveDate,
    pub alk: Option<f64>,
    pub po4: Option<f64>,
    pub no3: Option<f64>,
    pub ca: Option<f64>,
    pub mg: Option<f64>,
    pub sg: Option<f64>,
    pub water_change_gallons: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A parameter record joined with the name of its tank.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct TankParameterRecord {
    // ---
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: ParameterRecord,
    pub tank_name: String,
}

/// Composite identity of a parameter record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParameterKey {
    // ---
    pub tank_id: i64,
    pub date: NaiveDate,
}

impl ParameterRecord {
    /// The measured fields of this record, without its key.
    pub fn fields(&self) -> ParameterFields {
        // ---
        ParameterFields {
            alk: self.alk,
            po4: self.po4,
            no3: self.no3,
            ca: self.ca,
            mg: self.mg,
            sg: self.sg,
            water_change_gallons: self.water_change_gallons,
            notes: self.notes.clone(),
        }
    }
}

// ---

/// Parse a `YYYY-MM-DD` calendar day.
pub fn parse_calendar_date(raw: &str) -> StoreResult<NaiveDate> {
    // ---
    let invalid = || StoreError::Validation(format!("Invalid date '{raw}', expected YYYY-MM-DD"));

    let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| invalid())?;

    // chrono tolerates leading whitespace, signed years and unpadded fields;
    // a key is only valid in its canonical zero-padded form
    if date.format(DATE_FORMAT).to_string() != raw {
        return Err(invalid());
    }
    Ok(date)
}

fn validate_name(name: &str) -> StoreResult<()> {
    if name.trim().is_empty() {
        return Err(StoreError::Validation("Tank name must not be empty".into()));
    }
    Ok(())
}

fn validate_size(size_gallons: f64) -> StoreResult<()> {
    if !size_gallons.is_finite() || size_gallons <= 0.0 {
        return Err(StoreError::Validation(format!(
            "Tank size must be a positive number, got {size_gallons}"
        )));
    }
    Ok(())
}

impl NewTank {
    pub fn validate(&self) -> StoreResult<()> {
        // ---
        validate_name(&self.name)?;
        validate_size(self.size_gallons)
    }
}

impl TankUpdate {
    pub fn validate(&self) -> StoreResult<()> {
        // ---
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(size) = self.size_gallons {
            validate_size(size)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.size_gallons.is_none()
    }
}

impl ParameterFields {
    /// Reject non-finite measurements and negative water changes.
    pub fn validate(&self) -> StoreResult<()> {
        // ---
        let measurements = [
            ("alk", self.alk),
            ("po4", self.po4),
            ("no3", self.no3),
            ("ca", self.ca),
            ("mg", self.mg),
            ("sg", self.sg),
        ];
        for (field, value) in measurements {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(StoreError::Validation(format!("{field} must be a finite number")));
            }
        }

        if let Some(gallons) = self.water_change_gallons {
            if !gallons.is_finite() || gallons < 0.0 {
                return Err(StoreError::Validation(format!(
                    "water_change_gallons must be a non-negative number, got {gallons}"
                )));
            }
        }
        Ok(())
    }
}
