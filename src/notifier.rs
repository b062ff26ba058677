//! Restock alert delivery

use crate::error::{Error, Result};
use crate::models::RestockEvent;
use async_trait::async_trait;
use serde::Serialize;

pub const ALERT_TITLE: &str = "Stock Alert";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<()>;
}

/// Alert text for a restock
pub fn restock_message(product_name: &str, store_name: &str, event: &RestockEvent) -> String {
    format!(
        "{} is back in stock at {} (unavailable for {} check(s))",
        product_name, store_name, event.days_out_of_stock
    )
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    title: &'a str,
    message: &'a str,
}

/// Posts `{"title", "message"}` JSON to a webhook
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { title, message })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus(response.status()));
        }

        log::info!("Notification sent via webhook");
        Ok(())
    }
}

/// Fallback when no webhook is configured
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        log::info!("{}: {}", title, message);
        Ok(())
    }
}
