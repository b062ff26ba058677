//! Database operations for the stock-check and restock-event logs
//!
//! Both tables are append-only. Uses parameterized queries exclusively.
//! Timestamps are stored as fixed-width RFC 3339 UTC text so that lexical
//! ordering matches chronological ordering.

use crate::models::{Observation, RestockEvent, StockKey};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

/// Result type for database operations
pub type DbResult<T> = rusqlite::Result<T>;

/// Initialize the database schema
///
/// Creates tables if they don't exist:
/// - `stock_checks`: every availability check, including repeats
/// - `restock_events`: one row per detected out-of-stock to in-stock transition
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS stock_checks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            store_id TEXT NOT NULL,
            product_id TEXT NOT NULL,
            available INTEGER NOT NULL,
            day_of_week INTEGER NOT NULL,
            hour_of_day INTEGER NOT NULL,
            metadata TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_stock_checks_key
            ON stock_checks(store_id, product_id, timestamp);

        CREATE TABLE IF NOT EXISTS restock_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            store_id TEXT NOT NULL,
            product_id TEXT NOT NULL,
            days_out_of_stock INTEGER NOT NULL,
            day_of_week INTEGER NOT NULL,
            hour_of_day INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_restock_events_key
            ON restock_events(store_id, product_id, timestamp);
        ",
    )?;

    log::debug!("Database schema initialized");
    Ok(())
}

/// Format a timestamp for storage (e.g. "2026-10-14T10:00:00.000000Z")
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, text: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Append an observation to the stock-check log
pub fn insert_observation(
    conn: &Connection,
    obs: &Observation,
    day_of_week: u8,
    hour_of_day: u8,
) -> DbResult<i64> {
    let metadata = obs.metadata.as_ref().map(|value| value.to_string());
    conn.execute(
        "INSERT INTO stock_checks
         (timestamp, store_id, product_id, available, day_of_week, hour_of_day, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            format_timestamp(&obs.timestamp),
            &obs.store_id,
            &obs.product_id,
            obs.available,
            day_of_week,
            hour_of_day,
            metadata,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Append a restock event
pub fn insert_restock_event(conn: &Connection, event: &RestockEvent) -> DbResult<i64> {
    conn.execute(
        "INSERT INTO restock_events
         (timestamp, store_id, product_id, days_out_of_stock, day_of_week, hour_of_day)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            format_timestamp(&event.timestamp),
            &event.store_id,
            &event.product_id,
            event.days_out_of_stock,
            event.day_of_week,
            event.hour_of_day,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn map_observation(row: &Row<'_>) -> DbResult<Observation> {
    let timestamp: String = row.get(0)?;
    let metadata: Option<String> = row.get(4)?;
    let metadata = match metadata {
        Some(text) => Some(
            serde_json::from_str(&text)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
        ),
        None => None,
    };
    Ok(Observation {
        timestamp: parse_timestamp(0, &timestamp)?,
        store_id: row.get(1)?,
        product_id: row.get(2)?,
        available: row.get(3)?,
        metadata,
    })
}

/// Read a small integer column and reject values above `max`
fn get_bounded(row: &Row<'_>, idx: usize, max: u8) -> DbResult<u8> {
    let value: u8 = row.get(idx)?;
    if value > max {
        return Err(rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("value {} exceeds {}", value, max).into(),
        ));
    }
    Ok(value)
}

fn map_restock_event(row: &Row<'_>) -> DbResult<RestockEvent> {
    let timestamp: String = row.get(0)?;
    Ok(RestockEvent {
        timestamp: parse_timestamp(0, &timestamp)?,
        store_id: row.get(1)?,
        product_id: row.get(2)?,
        days_out_of_stock: row.get(3)?,
        day_of_week: get_bounded(row, 4, 6)?,
        hour_of_day: get_bounded(row, 5, 23)?,
    })
}

/// Most recent observation for a key (insertion order breaks timestamp ties)
pub fn get_latest_observation(conn: &Connection, key: &StockKey) -> DbResult<Option<Observation>> {
    conn.query_row(
        "SELECT timestamp, store_id, product_id, available, metadata
         FROM stock_checks
         WHERE store_id = ?1 AND product_id = ?2
         ORDER BY timestamp DESC, id DESC
         LIMIT 1",
        params![&key.store_id, &key.product_id],
        map_observation,
    )
    .optional()
}

/// Observations for a key, newest first
pub fn get_observations(conn: &Connection, key: &StockKey, limit: usize) -> DbResult<Vec<Observation>> {
    let mut stmt = conn.prepare(
        "SELECT timestamp, store_id, product_id, available, metadata
         FROM stock_checks
         WHERE store_id = ?1 AND product_id = ?2
         ORDER BY timestamp DESC, id DESC
         LIMIT ?3",
    )?;

    let rows = stmt.query_map(
        params![&key.store_id, &key.product_id, limit as i64],
        map_observation,
    )?;
    rows.collect()
}

/// Count unavailable checks after the key was last seen in stock
///
/// Checks are ordered by (timestamp, id), the same order used for the latest
/// observation. If the key has never been in stock, every unavailable check
/// counts.
pub fn count_out_of_stock_checks(conn: &Connection, key: &StockKey) -> DbResult<u32> {
    conn.query_row(
        "SELECT COUNT(*) FROM stock_checks c
         WHERE c.store_id = ?1 AND c.product_id = ?2 AND c.available = 0
         AND NOT EXISTS (
             SELECT 1 FROM stock_checks t
             WHERE t.store_id = ?1 AND t.product_id = ?2 AND t.available = 1
             AND (t.timestamp > c.timestamp OR (t.timestamp = c.timestamp AND t.id > c.id))
         )",
        params![&key.store_id, &key.product_id],
        |row| row.get(0),
    )
}

/// Restock events for a key, newest first
pub fn get_restock_events(conn: &Connection, key: &StockKey) -> DbResult<Vec<RestockEvent>> {
    let mut stmt = conn.prepare_cached(
        "SELECT timestamp, store_id, product_id, days_out_of_stock, day_of_week, hour_of_day
         FROM restock_events
         WHERE store_id = ?1 AND product_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let rows = stmt.query_map(params![&key.store_id, &key.product_id], map_restock_event)?;
    rows.collect()
}

/// Per-key summary of what has been recorded (for status output)
#[derive(Debug, Clone, Serialize)]
pub struct TrackedKey {
    pub store_id: String,
    pub product_id: String,
    pub checks: i64,
    pub restocks: i64,
    pub last_checked: DateTime<Utc>,
}

/// All keys with at least one recorded check
pub fn get_tracked_keys(conn: &Connection) -> DbResult<Vec<TrackedKey>> {
    let mut stmt = conn.prepare(
        "SELECT c.store_id, c.product_id, COUNT(*), MAX(c.timestamp),
                (SELECT COUNT(*) FROM restock_events r
                 WHERE r.store_id = c.store_id AND r.product_id = c.product_id)
         FROM stock_checks c
         GROUP BY c.store_id, c.product_id
         ORDER BY c.store_id, c.product_id",
    )?;

    let rows = stmt.query_map([], |row| {
        let last_checked: String = row.get(3)?;
        Ok(TrackedKey {
            store_id: row.get(0)?,
            product_id: row.get(1)?,
            checks: row.get(2)?,
            restocks: row.get(4)?,
            last_checked: parse_timestamp(3, &last_checked)?,
        })
    })?;
    rows.collect()
}

/// Total number of stock checks for a key
pub fn get_observation_count(conn: &Connection, key: &StockKey) -> DbResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM stock_checks WHERE store_id = ?1 AND product_id = ?2",
        params![&key.store_id, &key.product_id],
        |row| row.get(0),
    )
}
