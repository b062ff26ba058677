//! Library entry point tying the log, recorder, analyzer and predictor together
//!
//! A `RestockTracker` is cheap to clone; clones share one SQLite connection.

use crate::analyzer::{self, Patterns};
use crate::clock::{Clock, SystemClock};
use crate::database::{self, init_schema, TrackedKey};
use crate::error::Result;
use crate::models::{Observation, RecordOutcome, RestockEvent, StockKey};
use crate::predictor::{self, Prediction};
use crate::recorder;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct RestockTracker {
    db: Arc<Mutex<Connection>>,
    tz: Tz,
    clock: Arc<dyn Clock>,
}

impl RestockTracker {
    /// Open (or create) the database at `path` and initialize the schema
    pub fn open(path: &Path, tz: Tz) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
                log::info!("Created directory: {}", parent.display());
            }
        }
        let conn = Connection::open(path)?;
        log::info!("Opened database: {}", path.display());
        Self::from_connection(conn, tz)
    }

    /// In-memory tracker, mostly useful for tests
    pub fn open_in_memory(tz: Tz) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, tz)
    }

    pub fn from_connection(conn: Connection, tz: Tz) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            tz,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the time source used by `record_observation`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a check at the clock's current time
    pub fn record_observation(
        &self,
        store_id: &str,
        product_id: &str,
        available: bool,
    ) -> Result<RecordOutcome> {
        self.record_observation_with_metadata(store_id, product_id, available, None)
    }

    /// Record a check at the clock's current time with a diagnostic attachment
    pub fn record_observation_with_metadata(
        &self,
        store_id: &str,
        product_id: &str,
        available: bool,
        metadata: Option<serde_json::Value>,
    ) -> Result<RecordOutcome> {
        let now = self.clock.now();
        self.record_observation_at(store_id, product_id, available, now, metadata)
    }

    /// Record a check at an explicit instant, with an optional diagnostic attachment
    pub fn record_observation_at(
        &self,
        store_id: &str,
        product_id: &str,
        available: bool,
        now: DateTime<Utc>,
        metadata: Option<serde_json::Value>,
    ) -> Result<RecordOutcome> {
        let key = StockKey::new(store_id, product_id)?;
        let mut conn = self.conn();
        recorder::record_observation(&mut conn, &key, available, now, self.tz, metadata)
    }

    pub fn get_patterns(&self, store_id: &str, product_id: &str) -> Result<Patterns> {
        let key = StockKey::new(store_id, product_id)?;
        analyzer::get_patterns(&self.conn(), &key)
    }

    pub fn predict_next_restock(&self, store_id: &str, product_id: &str) -> Result<Prediction> {
        let key = StockKey::new(store_id, product_id)?;
        predictor::predict_next_restock(&self.conn(), &key, self.tz)
    }

    pub fn latest_observation(
        &self,
        store_id: &str,
        product_id: &str,
    ) -> Result<Option<Observation>> {
        let key = StockKey::new(store_id, product_id)?;
        Ok(database::get_latest_observation(&self.conn(), &key)?)
    }

    /// Most recent checks for a key, newest first
    pub fn observation_history(
        &self,
        store_id: &str,
        product_id: &str,
        limit: usize,
    ) -> Result<Vec<Observation>> {
        let key = StockKey::new(store_id, product_id)?;
        Ok(database::get_observations(&self.conn(), &key, limit)?)
    }

    /// Restock events for a key, newest first
    pub fn restock_events(&self, store_id: &str, product_id: &str) -> Result<Vec<RestockEvent>> {
        let key = StockKey::new(store_id, product_id)?;
        Ok(database::get_restock_events(&self.conn(), &key)?)
    }

    pub fn tracked_keys(&self) -> Result<Vec<TrackedKey>> {
        Ok(database::get_tracked_keys(&self.conn())?)
    }
}
