//! Restock Tracker - Retail pickup availability history & restock prediction
//!
//! Records availability checks for (store, product) pairs in SQLite, detects
//! restocks (unavailable to available transitions), summarizes restock
//! patterns and predicts the next restock.

pub mod analyzer;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod monitor;
pub mod notifier;
pub mod predictor;
pub mod prober;
pub mod recorder;
pub mod tracker;
pub mod web;

pub use analyzer::{PatternSummary, Patterns};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::MonitorConfig;
pub use error::{Error, RestockError, Result};
pub use models::{KeyState, Observation, RecordOutcome, RestockEvent, StockKey};
pub use monitor::{CheckReport, Monitor};
pub use notifier::{LogNotifier, Notifier, WebhookNotifier};
pub use predictor::{Prediction, RestockForecast};
pub use prober::{PickupMessageProber, ProbeResult, Prober};
pub use tracker::RestockTracker;
