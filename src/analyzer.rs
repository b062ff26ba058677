//! Restock pattern statistics over a key's restock-event history

use crate::database::get_restock_events;
use crate::error::{Error, Result};
use crate::models::{weekday_name, RestockEvent, StockKey};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Message reported when a key has no restock events yet
pub const NO_HISTORY_MESSAGE: &str = "No restock history available";

/// Aggregate statistics over one key's restock events
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternSummary {
    pub total_restocks: usize,
    /// Weekday name, e.g. "Wednesday"
    pub most_common_day: String,
    pub average_restock_hour: f64,
    pub average_days_out_of_stock: f64,
    pub last_restock: DateTime<Utc>,
    /// Mean whole-day gap between consecutive restocks; needs two events
    pub restock_frequency_days: Option<f64>,
}

/// Analyzer result. Statistics only exist when there is history.
#[derive(Debug, Clone, PartialEq)]
pub enum Patterns {
    NoHistory,
    Summary(PatternSummary),
}

impl Patterns {
    pub fn summary(&self) -> Option<&PatternSummary> {
        match self {
            Patterns::NoHistory => None,
            Patterns::Summary(summary) => Some(summary),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Patterns::NoHistory)
    }
}

impl Serialize for Patterns {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Patterns::NoHistory => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("message", NO_HISTORY_MESSAGE)?;
                map.end()
            }
            Patterns::Summary(summary) => summary.serialize(serializer),
        }
    }
}

/// Load a key's restock events and summarize them
pub fn get_patterns(conn: &Connection, key: &StockKey) -> Result<Patterns> {
    let events = get_restock_events(conn, key)?;
    summarize(&events)
}

/// Summarize restock events given newest first
///
/// Fails on an event whose weekday or hour is out of range.
pub fn summarize(events: &[RestockEvent]) -> Result<Patterns> {
    let Some(latest) = events.first() else {
        return Ok(Patterns::NoHistory);
    };
    if let Some(bad) = events.iter().find(|e| e.hour_of_day > 23) {
        return Err(Error::InvalidRecord(format!(
            "restock at {} has hour_of_day {}",
            bad.timestamp, bad.hour_of_day
        )));
    }
    let most_common_day = most_common_day(events).ok_or_else(|| {
        Error::InvalidRecord("restock history has a day_of_week outside 0..=6".to_string())
    })?;

    let count = events.len() as f64;
    let average_restock_hour =
        events.iter().map(|e| e.hour_of_day as f64).sum::<f64>() / count;
    let average_days_out_of_stock =
        events.iter().map(|e| e.days_out_of_stock as f64).sum::<f64>() / count;

    Ok(Patterns::Summary(PatternSummary {
        total_restocks: events.len(),
        most_common_day: most_common_day.to_string(),
        average_restock_hour,
        average_days_out_of_stock,
        last_restock: latest.timestamp,
        restock_frequency_days: restock_frequency_days(events),
    }))
}

/// Name of the modal `day_of_week`. Ties go to the tied day seen first in
/// the given (newest first) order.
fn most_common_day(events: &[RestockEvent]) -> Option<&'static str> {
    let mut counts = [0usize; 7];
    for event in events {
        *counts.get_mut(event.day_of_week as usize)? += 1;
    }
    let max = counts.iter().copied().max()?;

    events
        .iter()
        .find(|e| counts[e.day_of_week as usize] == max)
        .and_then(|e| weekday_name(e.day_of_week))
}

/// Mean of whole-day gaps between chronologically sorted restocks
fn restock_frequency_days(events: &[RestockEvent]) -> Option<f64> {
    if events.len() < 2 {
        return None;
    }

    let mut timestamps: Vec<DateTime<Utc>> = events.iter().map(|e| e.timestamp).collect();
    timestamps.sort();

    let intervals: Vec<i64> = timestamps
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_days())
        .collect();

    Some(intervals.iter().sum::<i64>() as f64 / intervals.len() as f64)
}
