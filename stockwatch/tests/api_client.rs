//! HTTP client behavior against an in-process inventory service.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::FakeInventory;
use stockwatch::api_client::{Client, InventoryService};
use stockwatch::config::Config;
use stockwatch::error::Error;
use stockwatch::query::{Filters, OverviewParams, Paging, ProductSearchParams, SortBy, SortDir};

const PANTRY: &[(&str, i64, i64)] = &[("Rock Salt", 12, 2), ("Sea Salt", 1, 5), ("Sugar", 0, 3)];

fn client(service: &FakeInventory, token: Option<&str>) -> Client {
    let config = Config {
        api_url: format!("{}/", service.base_url),
        access_token: token.map(str::to_string),
        ..Config::default()
    };
    Client::from_config(&config).unwrap()
}

#[tokio::test]
async fn overview_sends_service_parameter_names() {
    let service = FakeInventory::start(PANTRY).await;
    let filters = Filters {
        low_stock_only: true,
        sort_by: SortBy::Balance,
        sort_dir: SortDir::Desc,
        pin_low_stock_first: true,
    };
    let params = OverviewParams::new(" salt ", filters, Paging::new(50, 25));

    let page = client(&service, None)
        .stock_overview(&params)
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Sea Salt");
    assert!(page.items[0].low_stock);

    let seen = service.seen("/stock/overview");
    let query = &seen[0].query;
    assert_eq!(query["search"], "salt");
    assert_eq!(query["low_stock_only"], "true");
    assert_eq!(query["low_stock_first"], "true");
    assert_eq!(query["sort_by"], "balance");
    assert_eq!(query["sort_dir"], "desc");
    assert_eq!(query["skip"], "50");
    assert_eq!(query["limit"], "25");
}

#[tokio::test]
async fn empty_search_is_not_sent() {
    let service = FakeInventory::start(PANTRY).await;
    let params = ProductSearchParams::new("", Paging::new(0, 200));

    let page = client(&service, None)
        .search_products(&params)
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    // Fields the service left out take their defaults.
    for product in &page.items {
        assert!(product.is_active && product.low_stock_enabled);
    }
    let seen = service.seen("/products");
    assert!(!seen[0].query.contains_key("search"));
    assert_eq!(seen[0].query["limit"], "200");
}

#[tokio::test]
async fn access_token_travels_as_cookie() {
    let service = FakeInventory::start(PANTRY).await;

    client(&service, Some("t0ken")).settings().await.unwrap();
    client(&service, None).settings().await.unwrap();

    let seen = service.seen("/settings");
    assert_eq!(seen[0].cookie.as_deref(), Some("access_token=t0ken"));
    assert_eq!(seen[1].cookie, None);
}

#[tokio::test]
async fn error_message_comes_from_detail() {
    let service = FakeInventory::start(PANTRY).await;
    service.update(|state| {
        let body = json!({ "detail": "Not authenticated" });
        state.failure = Some((StatusCode::UNAUTHORIZED, body));
    });

    let err = client(&service, None).low_stock_count().await.unwrap_err();

    assert!(matches!(err, Error::Api { status: 401, .. }));
    assert_eq!(err.to_string(), "Not authenticated");
}

#[tokio::test]
async fn error_without_string_detail_uses_status() {
    let service = FakeInventory::start(PANTRY).await;
    service.update(|state| {
        state.failure = Some((
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "detail": [{ "loc": ["query", "search"], "msg": "too short" }] }),
        ));
    });

    let err = client(&service, None).settings().await.unwrap_err();

    assert_eq!(err.to_string(), "Request failed with status 422");
}

#[tokio::test]
async fn missing_fields_decode_as_defaults() {
    let service = FakeInventory::start(PANTRY).await;
    service.update(|state| {
        state.settings = json!({ "popup_cooldown_hours": 0 });
        state.count = json!({});
    });
    let client = client(&service, None);

    let settings = client.settings().await.unwrap();
    let policy = stockwatch::alert::AlertPolicy::from(settings);
    assert!(policy.popup_enabled);
    assert!(policy.pin_enabled);
    assert_eq!(policy.cooldown_hours, 1);

    assert_eq!(client.low_stock_count().await.unwrap().count, 0);
}

#[tokio::test]
async fn unreachable_service_is_an_http_error() {
    // Nothing listens on the discard port.
    let client = Client::with_base_url("http://127.0.0.1:9");

    let err = client.low_stock_count().await.unwrap_err();

    assert!(matches!(err, Error::Http(_)));
}
