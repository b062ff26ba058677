//! Observation recording and restock detection
//!
//! Reading the previous state and appending the new rows happen inside one
//! `IMMEDIATE` transaction, so two writers recording the same key cannot both
//! see the same out-of-stock observation and double-count a restock.

use crate::database::{
    count_out_of_stock_checks, get_latest_observation, insert_observation, insert_restock_event,
};
use crate::error::{Error, Result};
use crate::models::{KeyState, Observation, RecordOutcome, RestockEvent, StockKey};
use chrono::{DateTime, Datelike, SubsecRound, Timelike, Utc};
use chrono_tz::Tz;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Record one availability check and detect a restock
///
/// `now` is truncated to the microsecond precision of the log. It must not be
/// earlier than the key's latest check; equal instants are ordered by
/// insertion. `day_of_week` and `hour_of_day` are derived from `now` in `tz`.
pub fn record_observation(
    conn: &mut Connection,
    key: &StockKey,
    available: bool,
    now: DateTime<Utc>,
    tz: Tz,
    metadata: Option<serde_json::Value>,
) -> Result<RecordOutcome> {
    let now = now.trunc_subsecs(6);
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let outcome = record_observation_tx(&tx, key, available, now, tz, metadata)?;
    tx.commit()?;
    Ok(outcome)
}

fn record_observation_tx(
    tx: &Transaction<'_>,
    key: &StockKey,
    available: bool,
    now: DateTime<Utc>,
    tz: Tz,
    metadata: Option<serde_json::Value>,
) -> Result<RecordOutcome> {
    let latest = get_latest_observation(tx, key)?;
    if let Some(prev) = &latest {
        if now < prev.timestamp {
            log::warn!(
                "Rejecting observation for {} at {}: latest check is at {}",
                key,
                now,
                prev.timestamp
            );
            return Err(Error::OutOfOrder {
                key: key.to_string(),
                latest: prev.timestamp,
                now,
            });
        }
    }

    let previous_state = KeyState::from_latest(latest.as_ref());
    let (state, is_restock) = previous_state.transition(available);

    let local = now.with_timezone(&tz);
    let day_of_week = local.weekday().num_days_from_monday() as u8;
    let hour_of_day = local.hour() as u8;

    let restock = if is_restock {
        let event = RestockEvent {
            timestamp: now,
            store_id: key.store_id.clone(),
            product_id: key.product_id.clone(),
            days_out_of_stock: count_out_of_stock_checks(tx, key)?,
            day_of_week,
            hour_of_day,
        };
        insert_restock_event(tx, &event)?;
        log::info!(
            "Restock detected for {} after {} unavailable check(s)",
            key,
            event.days_out_of_stock
        );
        Some(event)
    } else {
        None
    };

    let observation = Observation {
        timestamp: now,
        store_id: key.store_id.clone(),
        product_id: key.product_id.clone(),
        available,
        metadata,
    };
    insert_observation(tx, &observation, day_of_week, hour_of_day)?;
    log::debug!("Recorded {} available={} ({:?})", key, available, state);

    Ok(RecordOutcome {
        observation,
        previous_state,
        state,
        restock,
    })
}
