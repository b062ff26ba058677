//! Check cycles over every configured (product, store) pair
//!
//! Probe failures are logged and skipped; nothing is recorded for them.
//! Storage failures abort the cycle and are returned to the caller.

use crate::config::MonitorConfig;
use crate::error::{Error, Result};
use std::future::Future;
use crate::models::RestockEvent;
use crate::notifier::{restock_message, LogNotifier, Notifier, WebhookNotifier, ALERT_TITLE};
use crate::prober::{PickupMessageProber, Prober};
use crate::tracker::RestockTracker;
use std::time::Duration;
use tokio::time::{interval, sleep};

/// Summary of one check cycle
#[derive(Debug, Default)]
pub struct CheckReport {
    pub checked: usize,
    pub available: usize,
    pub errors: usize,
    pub restocks: Vec<RestockEvent>,
}

pub struct Monitor {
    tracker: RestockTracker,
    config: MonitorConfig,
    prober: Box<dyn Prober>,
    notifier: Box<dyn Notifier>,
}

impl Monitor {
    pub fn new(
        tracker: RestockTracker,
        config: MonitorConfig,
        prober: Box<dyn Prober>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            tracker,
            config,
            prober,
            notifier,
        }
    }

    /// Monitor using the HTTP prober and the configured webhook (or log output)
    pub fn from_config(tracker: RestockTracker, config: MonitorConfig) -> Self {
        let prober = Box::new(PickupMessageProber::new(&config.location));
        let notifier: Box<dyn Notifier> = match &config.notifications.webhook_url {
            Some(url) => Box::new(WebhookNotifier::new(url)),
            None => Box::new(LogNotifier),
        };
        Self::new(tracker, config, prober, notifier)
    }

    /// Probe every configured pair once, record results and send restock alerts
    pub async fn check_once(&self) -> Result<CheckReport> {
        self.config.validate_for_checks()?;
        log::info!(
            "Checking {} product(s) at {} store(s)...",
            self.config.products_to_monitor.len(),
            self.config.stores_to_monitor.len()
        );

        let delay = Duration::from_millis(self.config.request_delay_ms);
        let mut report = CheckReport::default();
        let mut first = true;

        for product in &self.config.products_to_monitor {
            for store in &self.config.stores_to_monitor {
                if !first && !delay.is_zero() {
                    sleep(delay).await;
                }
                first = false;

                let probe = match self
                    .prober
                    .probe(&product.product_code, &store.store_code)
                    .await
                {
                    Ok(probe) => probe,
                    Err(e) => {
                        log::error!(
                            "Error checking {} at {}: {}",
                            product.product_name,
                            store.store_name,
                            e
                        );
                        report.errors += 1;
                        continue;
                    }
                };

                let outcome = match self.tracker.record_observation_with_metadata(
                    &store.store_code,
                    &product.product_code,
                    probe.available,
                    Some(probe.metadata()),
                ) {
                    Ok(outcome) => outcome,
                    Err(e @ Error::OutOfOrder { .. }) => {
                        log::warn!("Skipping check: {}", e);
                        report.errors += 1;
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                report.checked += 1;

                if probe.available {
                    report.available += 1;
                    log::info!("{} available at {}", product.product_name, store.store_name);
                }

                if let Some(event) = outcome.restock {
                    let message = restock_message(&product.product_name, &store.store_name, &event);
                    if let Err(e) = self.notifier.notify(ALERT_TITLE, &message).await {
                        log::error!("Failed to send notification: {}", e);
                    }
                    report.restocks.push(event);
                }
            }
        }

        log::info!(
            "Check complete: {} checked, {} available, {} restock(s), {} error(s)",
            report.checked,
            report.available,
            report.restocks.len(),
            report.errors
        );
        Ok(report)
    }

    /// Run check cycles until Ctrl+C
    pub async fn run(&self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run check cycles until `shutdown` completes, abandoning a cycle in progress
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) -> Result<()> {
        self.config.validate_for_checks()?;
        let period = Duration::from_secs(self.config.check_interval_minutes * 60);
        let mut ticker = interval(period);
        log::info!(
            "Starting continuous monitoring (every {} minute(s))",
            self.config.check_interval_minutes
        );

        let cycles = async {
            let mut cycle: u64 = 0;
            loop {
                ticker.tick().await;
                cycle += 1;
                log::info!("Monitoring cycle #{}", cycle);
                if let Err(e) = self.check_once().await {
                    log::error!("Check cycle failed: {}", e);
                }
            }
        };

        tokio::select! {
            _ = cycles => {}
            _ = shutdown => {
                log::info!("Monitoring stopped");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prober::ProbeResult;
    use async_trait::async_trait;
    use chrono_tz::Tz;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Returns queued availability values in order; an empty queue is an error
    struct ScriptedProber {
        script: Mutex<VecDeque<bool>>,
    }

    impl ScriptedProber {
        fn new(values: &[bool]) -> Self {
            Self {
                script: Mutex::new(values.iter().copied().collect()),
            }
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn probe(&self, _product_code: &str, _store_code: &str) -> Result<ProbeResult> {
            match self.script.lock().unwrap().pop_front() {
                Some(available) => Ok(ProbeResult {
                    available,
                    status: if available { "available" } else { "unavailable" }.to_string(),
                    store_name: "Washington Square".to_string(),
                    raw: serde_json::Value::Null,
                }),
                None => Err(Error::Config("script exhausted".to_string())),
            }
        }
    }

    /// Never answers
    struct HangingProber;

    #[async_trait]
    impl Prober for HangingProber {
        async fn probe(&self, _product_code: &str, _store_code: &str) -> Result<ProbeResult> {
            std::future::pending().await
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        messages: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, _title: &str, message: &str) -> Result<()> {
            self.messages.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn config() -> MonitorConfig {
        let mut config = MonitorConfig::default();
        config.add_product("MU2F3LL/A", "iPhone 15 Pro");
        config.add_store("R090", "Washington Square");
        config.request_delay_ms = 0;
        config
    }

    fn monitor(values: &[bool], notifier: RecordingNotifier) -> (Monitor, RestockTracker) {
        let tracker = RestockTracker::open_in_memory(Tz::UTC).unwrap();
        let monitor = Monitor::new(
            tracker.clone(),
            config(),
            Box::new(ScriptedProber::new(values)),
            Box::new(notifier),
        );
        (monitor, tracker)
    }

    #[tokio::test]
    async fn restock_triggers_one_notification() {
        let notifier = RecordingNotifier::default();
        let (monitor, tracker) = monitor(&[false, true, true], notifier.clone());

        assert!(monitor.check_once().await.unwrap().restocks.is_empty());
        let report = monitor.check_once().await.unwrap();
        assert_eq!(report.restocks.len(), 1);
        assert_eq!(report.available, 1);
        assert!(monitor.check_once().await.unwrap().restocks.is_empty());

        let messages = notifier.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("iPhone 15 Pro"));
        assert_eq!(tracker.restock_events("R090", "MU2F3LL/A").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn probe_errors_record_nothing() {
        let (monitor, tracker) = monitor(&[], RecordingNotifier::default());

        let report = monitor.check_once().await.unwrap();
        assert_eq!(report.errors, 1);
        assert_eq!(report.checked, 0);
        assert!(tracker.latest_observation("R090", "MU2F3LL/A").unwrap().is_none());
    }

    #[tokio::test]
    async fn observations_carry_probe_metadata() {
        let (monitor, tracker) = monitor(&[false], RecordingNotifier::default());
        monitor.check_once().await.unwrap();

        let latest = tracker.latest_observation("R090", "MU2F3LL/A").unwrap().unwrap();
        assert_eq!(latest.metadata.unwrap()["status"], "unavailable");
    }

    #[tokio::test]
    async fn empty_config_is_rejected() {
        let tracker = RestockTracker::open_in_memory(Tz::UTC).unwrap();
        let monitor = Monitor::new(
            tracker,
            MonitorConfig::default(),
            Box::new(ScriptedProber::new(&[])),
            Box::new(RecordingNotifier::default()),
        );
        assert!(matches!(monitor.check_once().await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_cycle_in_progress() {
        let tracker = RestockTracker::open_in_memory(Tz::UTC).unwrap();
        let monitor = Monitor::new(
            tracker,
            config(),
            Box::new(HangingProber),
            Box::new(RecordingNotifier::default()),
        );

        let stopped = tokio::time::timeout(
            Duration::from_secs(5),
            monitor.run_until(sleep(Duration::from_millis(50))),
        )
        .await;
        assert!(matches!(stopped, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn backdated_clock_skips_the_check() {
        use crate::clock::FixedClock;
        use chrono::{TimeZone, Utc};

        let now = Utc.with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(now));
        let tracker = RestockTracker::open_in_memory(Tz::UTC)
            .unwrap()
            .with_clock(clock.clone());
        let monitor = Monitor::new(
            tracker.clone(),
            config(),
            Box::new(ScriptedProber::new(&[false, true])),
            Box::new(RecordingNotifier::default()),
        );

        monitor.check_once().await.unwrap();
        clock.advance(chrono::Duration::hours(-1));
        let report = monitor.check_once().await.unwrap();

        assert_eq!(report.errors, 1);
        assert!(report.restocks.is_empty());
        assert!(tracker.restock_events("R090", "MU2F3LL/A").unwrap().is_empty());
    }
}
