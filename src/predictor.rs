//! Next-restock prediction from restock patterns and the current stock state

use crate::analyzer::{get_patterns, PatternSummary, Patterns};
use crate::database::get_latest_observation;
use crate::error::Result;
use crate::models::StockKey;
use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use rusqlite::Connection;
use serde::Serialize;

const MICROS_PER_DAY: f64 = 86_400_000_000.0;

/// Best-effort forecast. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RestockForecast {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likely_day: Option<String>,
    /// Clock label such as "14:00"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likely_time: Option<String>,
}

impl RestockForecast {
    pub fn is_empty(&self) -> bool {
        self.estimated_date.is_none() && self.likely_day.is_none() && self.likely_time.is_none()
    }
}

/// Outcome of a prediction request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "prediction", rename_all = "snake_case")]
pub enum Prediction {
    CurrentlyInStock,
    InsufficientData,
    NoStockData,
    Forecast(RestockForecast),
}

impl Prediction {
    /// Human-readable status for terminal outcomes
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Prediction::CurrentlyInStock => Some("Currently in stock"),
            Prediction::InsufficientData => Some("Insufficient data for prediction"),
            Prediction::NoStockData => Some("No stock data available"),
            Prediction::Forecast(_) => None,
        }
    }
}

/// Predict the next restock for a key
///
/// The latest check decides first: no checks at all means there is no stock
/// data, and an in-stock key has nothing to predict. Only an out-of-stock key
/// consults the restock history.
pub fn predict_next_restock(conn: &Connection, key: &StockKey, tz: Tz) -> Result<Prediction> {
    let Some(latest) = get_latest_observation(conn, key)? else {
        return Ok(Prediction::NoStockData);
    };

    if latest.available {
        return Ok(Prediction::CurrentlyInStock);
    }

    match get_patterns(conn, key)? {
        Patterns::NoHistory => Ok(Prediction::InsufficientData),
        Patterns::Summary(summary) => Ok(Prediction::Forecast(forecast(&summary, tz))),
    }
}

/// Build a forecast from a pattern summary
///
/// The estimated date is the last restock plus the mean restock interval,
/// taken as a calendar date in `tz`.
pub fn forecast(summary: &PatternSummary, tz: Tz) -> RestockForecast {
    let estimated_date = summary.restock_frequency_days.map(|days| {
        let offset = Duration::microseconds((days * MICROS_PER_DAY).round() as i64);
        (summary.last_restock + offset).with_timezone(&tz).date_naive()
    });

    RestockForecast {
        estimated_date,
        likely_day: Some(summary.most_common_day.clone()),
        likely_time: Some(clock_label(summary.average_restock_hour)),
    }
}

/// Round an hour down and format it as "HH:00"
fn clock_label(hour: f64) -> String {
    format!("{:02}:00", hour.floor() as u32)
}
