//! Water-change aggregates over a tank's parameter history.
//!
//! Everything here is a pure scan over `(date, water_change_gallons)`
//! pairs so the window arithmetic can be checked without a database.
//!
//! The rolling window is half-open: a record counts toward `as_of` when
//! `as_of - 30 days < date <= as_of`. Records with no water change
//! contribute zero.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

// ---

/// Width of the rolling water-change window, in days.
pub const WINDOW_DAYS: u64 = 30;

/// Number of calendar months reported in the monthly history.
pub const HISTORY_MONTHS: usize = 12;

/// Water-change total over one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterChangeTotal {
    // ---
    pub gallons: f64,
    pub percentage: f64,
}

/// Water-change total for one calendar month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyWaterChange {
    // ---
    pub month: String,
    pub total_gallons: f64,
    pub percentage: f64,
}

/// Dashboard view of a tank's water-change history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterChangeSummary {
    // ---
    pub tank_size: f64,
    pub as_of: NaiveDate,
    pub last_30_days: WaterChangeTotal,
    pub monthly_history: Vec<MonthlyWaterChange>,
}

/// True when `date` falls inside the window ending at `as_of`.
pub fn in_window(date: NaiveDate, as_of: NaiveDate) -> bool {
    // ---
    match as_of.checked_sub_days(Days::new(WINDOW_DAYS)) {
        Some(start) => date > start && date <= as_of,
        None => date <= as_of,
    }
}

/// Gallons changed inside the window ending at `as_of`.
pub fn window_gallons<I>(changes: I, as_of: NaiveDate) -> f64
where
    I: IntoIterator<Item = (NaiveDate, Option<f64>)>,
{
    // ---
    changes
        .into_iter()
        .filter(|(date, _)| in_window(*date, as_of))
        .map(|(_, gallons)| gallons.unwrap_or(0.0))
        .sum()
}

/// Express `gallons` as a percentage of the tank volume.
pub fn percent_of(gallons: f64, size_gallons: f64) -> f64 {
    gallons / size_gallons * 100.0
}

/// Percentage of the tank volume changed inside the window ending at `as_of`.
pub fn monthly_water_change_percent<I>(changes: I, size_gallons: f64, as_of: NaiveDate) -> f64
where
    I: IntoIterator<Item = (NaiveDate, Option<f64>)>,
{
    // ---
    percent_of(window_gallons(changes, as_of), size_gallons)
}

/// Round to one decimal place for display.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Per-month totals, newest month first, limited to [`HISTORY_MONTHS`].
///
/// Months without any recorded water change are omitted.
pub fn monthly_history<I>(changes: I, size_gallons: f64) -> Vec<MonthlyWaterChange>
where
    I: IntoIterator<Item = (NaiveDate, Option<f64>)>,
{
    // ---
    let mut by_month: BTreeMap<String, f64> = BTreeMap::new();
    for (date, gallons) in changes {
        if let Some(gallons) = gallons {
            *by_month.entry(date.format("%Y-%m").to_string()).or_default() += gallons;
        }
    }

    by_month
        .into_iter()
        .rev()
        .take(HISTORY_MONTHS)
        .map(|(month, total_gallons)| MonthlyWaterChange {
            month,
            total_gallons,
            percentage: round1(percent_of(total_gallons, size_gallons)),
        })
        .collect()
}

/// Build the full summary for a tank from its water-change history.
pub fn summarize(
    changes: &[(NaiveDate, Option<f64>)],
    size_gallons: f64,
    as_of: NaiveDate,
) -> WaterChangeSummary {
    // ---
    let gallons = window_gallons(changes.iter().copied(), as_of);

    WaterChangeSummary {
        tank_size: size_gallons,
        as_of,
        last_30_days: WaterChangeTotal {
            gallons,
            percentage: round1(percent_of(gallons, size_gallons)),
        },
        monthly_history: monthly_history(changes.iter().copied(), size_gallons),
    }
}
