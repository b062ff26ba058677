//! Availability lookups against the retailer's pickup-message endpoint
//!
//! The endpoint is undocumented. A lookup for one part returns every store
//! near the given location; the store is matched by `storeNumber` and the
//! part by its key in `partsAvailability`.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

const DEFAULT_BASE_URL: &str = "https://www.apple.com";

/// Status reported when the store or part is missing from the response
pub const STATUS_NOT_FOUND: &str = "not_found";

/// Current availability of one product at one store
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub available: bool,
    /// Raw pickup display value ("available", "unavailable", "ineligible", ...)
    pub status: String,
    pub store_name: String,
    /// The matched store entry from the response, or null
    pub raw: serde_json::Value,
}

impl ProbeResult {
    /// Diagnostic attachment stored alongside the observation
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "status": self.status,
            "store_name": self.store_name,
            "raw": self.raw,
        })
    }
}

#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, product_code: &str, store_code: &str) -> Result<ProbeResult>;
}

#[derive(Debug, Deserialize)]
struct PickupResponse {
    body: Option<PickupBody>,
}

#[derive(Debug, Deserialize)]
struct PickupBody {
    #[serde(default)]
    stores: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PickupStore {
    store_number: String,
    #[serde(default)]
    store_name: String,
    #[serde(default)]
    parts_availability: HashMap<String, PartAvailability>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartAvailability {
    #[serde(default = "unavailable")]
    pickup_display: String,
}

fn unavailable() -> String {
    "unavailable".to_string()
}

/// HTTP prober for the pickup-message endpoint
pub struct PickupMessageProber {
    client: reqwest::Client,
    base_url: String,
    location: String,
}

impl PickupMessageProber {
    pub fn new(location: &str) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, location)
    }

    /// Point the prober at another host (used by tests)
    pub fn with_base_url(base_url: &str, location: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            location: location.to_string(),
        }
    }

    fn url(&self, product_code: &str) -> String {
        format!(
            "{}/shop/retail/pickup-message?parts.0={}&location={}",
            self.base_url,
            urlencoding::encode(product_code),
            urlencoding::encode(&self.location)
        )
    }
}

#[async_trait]
impl Prober for PickupMessageProber {
    async fn probe(&self, product_code: &str, store_code: &str) -> Result<ProbeResult> {
        let url = self.url(product_code);
        log::debug!("Checking {} at {}: {}", product_code, store_code, url);

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "restock_tracker/1.0")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus(response.status()));
        }

        let body: serde_json::Value = response.json().await?;
        parse_pickup_response(body, product_code, store_code)
    }
}

/// Extract one (store, part) availability from a pickup-message response
pub fn parse_pickup_response(
    body: serde_json::Value,
    product_code: &str,
    store_code: &str,
) -> Result<ProbeResult> {
    let response: PickupResponse = serde_json::from_value(body)?;
    let stores = response.body.map(|b| b.stores).unwrap_or_default();

    for raw in stores {
        let store: PickupStore = match serde_json::from_value(raw.clone()) {
            Ok(store) => store,
            Err(e) => {
                log::debug!("Skipping malformed store entry: {}", e);
                continue;
            }
        };
        if store.store_number != store_code {
            continue;
        }
        if let Some(part) = store.parts_availability.get(product_code) {
            return Ok(ProbeResult {
                available: part.pickup_display == "available",
                status: part.pickup_display.clone(),
                store_name: store.store_name,
                raw,
            });
        }
    }

    Ok(ProbeResult {
        available: false,
        status: STATUS_NOT_FOUND.to_string(),
        store_name: String::new(),
        raw: serde_json::Value::Null,
    })
}
