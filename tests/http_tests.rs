//! Prober and notifier against a mock HTTP server

use restock_tracker::error::Error;
use restock_tracker::notifier::{Notifier, WebhookNotifier};
use restock_tracker::prober::{PickupMessageProber, Prober, STATUS_NOT_FOUND};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pickup_body(display: &str) -> serde_json::Value {
    json!({
        "body": {
            "stores": [
                {
                    "storeNumber": "R090",
                    "storeName": "Washington Square",
                    "partsAvailability": {
                        "MU2F3LL/A": {"pickupDisplay": display}
                    }
                }
            ]
        }
    })
}

#[tokio::test]
async fn prober_reports_available_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shop/retail/pickup-message"))
        .and(query_param("parts.0", "MU2F3LL/A"))
        .and(query_param("location", "97223"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pickup_body("available")))
        .expect(1)
        .mount(&server)
        .await;

    let prober = PickupMessageProber::with_base_url(&server.uri(), "97223");
    let result = prober.probe("MU2F3LL/A", "R090").await.unwrap();

    assert!(result.available);
    assert_eq!(result.store_name, "Washington Square");
}

#[tokio::test]
async fn prober_reports_unknown_store_as_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shop/retail/pickup-message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pickup_body("unavailable")))
        .mount(&server)
        .await;

    let prober = PickupMessageProber::with_base_url(&server.uri(), "10001");
    let result = prober.probe("MU2F3LL/A", "R001").await.unwrap();

    assert!(!result.available);
    assert_eq!(result.status, STATUS_NOT_FOUND);
}

#[tokio::test]
async fn prober_surfaces_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let prober = PickupMessageProber::with_base_url(&server.uri(), "10001");
    let err = prober.probe("MU2F3LL/A", "R090").await.unwrap_err();

    assert!(matches!(err, Error::HttpStatus(status) if status.as_u16() == 503));
}

#[tokio::test]
async fn prober_surfaces_invalid_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
        .mount(&server)
        .await;

    let prober = PickupMessageProber::with_base_url(&server.uri(), "10001");
    assert!(prober.probe("MU2F3LL/A", "R090").await.is_err());
}

#[tokio::test]
async fn webhook_notifier_posts_title_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notify"))
        .and(body_json(json!({"title": "Stock Alert", "message": "back in stock"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(&format!("{}/notify", server.uri()));
    notifier.notify("Stock Alert", "back in stock").await.unwrap();
}

#[tokio::test]
async fn webhook_notifier_surfaces_rejections() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(&server.uri());
    assert!(notifier.notify("Stock Alert", "hello").await.is_err());
}
