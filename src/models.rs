//! Core data types: keys, observations, restock events and the per-key stock state

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Full weekday names, indexed Monday = 0
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Name for a weekday index (Monday = 0). Out-of-range values yield `None`.
pub fn weekday_name(day_of_week: u8) -> Option<&'static str> {
    DAY_NAMES.get(day_of_week as usize).copied()
}

/// A monitored (store, product) pickup slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StockKey {
    pub store_id: String,
    pub product_id: String,
}

impl StockKey {
    /// Build a key, rejecting empty or whitespace-only identifiers
    pub fn new(store_id: &str, product_id: &str) -> Result<Self> {
        if store_id.trim().is_empty() {
            return Err(Error::InvalidKey { field: "store_id" });
        }
        if product_id.trim().is_empty() {
            return Err(Error::InvalidKey { field: "product_id" });
        }
        Ok(Self {
            store_id: store_id.to_string(),
            product_id: product_id.to_string(),
        })
    }
}

impl std::fmt::Display for StockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.product_id, self.store_id)
    }
}

/// One availability check result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub store_id: String,
    pub product_id: String,
    pub available: bool,
    /// Opaque diagnostic attachment (prober status, raw response excerpt)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// A detected out-of-stock to in-stock transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestockEvent {
    pub timestamp: DateTime<Utc>,
    pub store_id: String,
    pub product_id: String,
    /// Number of unavailable checks since the key was last seen in stock
    pub days_out_of_stock: u32,
    /// Monday = 0 .. Sunday = 6, in the tracker's timezone
    pub day_of_week: u8,
    pub hour_of_day: u8,
}

/// Stock state of a single key, derived from its most recent observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyState {
    Unseen,
    InStock,
    OutOfStock,
}

impl KeyState {
    /// State implied by the latest observation, if any
    pub fn from_latest(latest: Option<&Observation>) -> Self {
        match latest {
            None => KeyState::Unseen,
            Some(obs) if obs.available => KeyState::InStock,
            Some(_) => KeyState::OutOfStock,
        }
    }

    /// Apply a new check result. Returns the next state and whether the
    /// transition is a restock.
    pub fn transition(self, available: bool) -> (KeyState, bool) {
        let next = if available {
            KeyState::InStock
        } else {
            KeyState::OutOfStock
        };
        (next, self == KeyState::OutOfStock && available)
    }
}

/// Result of recording a single observation
#[derive(Debug, Clone, Serialize)]
pub struct RecordOutcome {
    pub observation: Observation,
    pub previous_state: KeyState,
    pub state: KeyState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restock: Option<RestockEvent>,
}

impl RecordOutcome {
    pub fn is_restock(&self) -> bool {
        self.restock.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_key_rejects_empty_ids() {
        assert!(matches!(
            StockKey::new("", "MU2F3LL/A"),
            Err(Error::InvalidKey { field: "store_id" })
        ));
        assert!(matches!(
            StockKey::new("R090", "   "),
            Err(Error::InvalidKey { field: "product_id" })
        ));
        let key = StockKey::new("R090", "MU2F3LL/A").unwrap();
        assert_eq!(key.to_string(), "MU2F3LL/A@R090");
    }

    #[test]
    fn only_out_of_stock_to_in_stock_is_a_restock() {
        assert_eq!(KeyState::Unseen.transition(true), (KeyState::InStock, false));
        assert_eq!(KeyState::Unseen.transition(false), (KeyState::OutOfStock, false));
        assert_eq!(KeyState::InStock.transition(true), (KeyState::InStock, false));
        assert_eq!(KeyState::InStock.transition(false), (KeyState::OutOfStock, false));
        assert_eq!(KeyState::OutOfStock.transition(false), (KeyState::OutOfStock, false));
        assert_eq!(KeyState::OutOfStock.transition(true), (KeyState::InStock, true));
    }

    #[test]
    fn weekday_names_start_on_monday() {
        assert_eq!(weekday_name(0), Some("Monday"));
        assert_eq!(weekday_name(2), Some("Wednesday"));
        assert_eq!(weekday_name(6), Some("Sunday"));
        assert_eq!(weekday_name(7), None);
    }
}
