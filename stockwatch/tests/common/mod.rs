//! In-process HTTP stand-in for the inventory service.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// A request as the service saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub path: &'static str,
    pub query: HashMap<String, String>,
    pub cookie: Option<String>,
}

#[derive(Default)]
pub struct ServiceState {
    /// Rows as `(name, balance, min_stock)`.
    pub stock: Vec<(String, i64, i64)>,
    /// Raw `/settings` body.
    pub settings: Value,
    /// Raw `/stock/low/count` body.
    pub count: Value,
    /// Status and body returned by every endpoint instead of data.
    pub failure: Option<(StatusCode, Value)>,
    pub seen: Vec<Seen>,
}

pub type Shared = Arc<Mutex<ServiceState>>;

pub struct FakeInventory {
    pub state: Shared,
    pub base_url: String,
}

impl FakeInventory {
    pub async fn start(stock: &[(&str, i64, i64)]) -> Self {
        let state: Shared = Arc::new(Mutex::new(ServiceState {
            stock: stock
                .iter()
                .map(|(name, balance, min)| (name.to_string(), *balance, *min))
                .collect(),
            settings: json!({}),
            count: json!({ "count": 0 }),
            ..ServiceState::default()
        }));

        let app = Router::new()
            .route("/stock/overview", get(stock_overview))
            .route("/products", get(products))
            .route("/settings", get(settings))
            .route("/stock/low/count", get(low_stock_count))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{addr}"),
        }
    }

    pub fn seen(&self, path: &str) -> Vec<Seen> {
        self.state
            .lock()
            .seen
            .iter()
            .filter(|seen| seen.path == path)
            .cloned()
            .collect()
    }

    pub fn update(&self, f: impl FnOnce(&mut ServiceState)) {
        f(&mut self.state.lock());
    }
}

fn record(
    state: &Shared,
    path: &'static str,
    query: HashMap<String, String>,
    headers: &HeaderMap,
) -> Option<Response> {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let mut state = state.lock();
    state.seen.push(Seen {
        path,
        query,
        cookie,
    });
    state
        .failure
        .clone()
        .map(|(status, body)| (status, Json(body)).into_response())
}

fn matching(state: &ServiceState, query: &HashMap<String, String>) -> Vec<Value> {
    let search = query.get("search").map(|s| s.to_lowercase());
    let low_only = query.get("low_stock_only").is_some_and(|v| v == "true");
    state
        .stock
        .iter()
        .enumerate()
        .filter(|(_, (name, _, _))| {
            search
                .as_ref()
                .is_none_or(|s| name.to_lowercase().contains(s))
        })
        .filter(|(_, (_, balance, min))| !low_only || balance <= min)
        .map(|(i, (name, balance, min))| {
            json!({
                "id": i + 1,
                "name": name,
                "unit": "kg",
                "balance": balance,
                "min_stock": min,
                "low_stock": balance <= min,
            })
        })
        .collect()
}

async fn stock_overview(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Some(failure) = record(&state, "/stock/overview", query.clone(), &headers) {
        return failure;
    }
    let items = matching(&state.lock(), &query);
    Json(json!({ "total": items.len(), "items": items })).into_response()
}

fn as_product(row: Value) -> Value {
    json!({ "id": row["id"], "name": row["name"], "unit": row["unit"] })
}

async fn products(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Some(failure) = record(&state, "/products", query.clone(), &headers) {
        return failure;
    }
    let items: Vec<Value> = matching(&state.lock(), &query)
        .into_iter()
        .map(as_product)
        .collect();
    Json(json!({ "total": items.len(), "items": items })).into_response()
}

async fn settings(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Some(failure) = record(&state, "/settings", HashMap::new(), &headers) {
        return failure;
    }
    let body = state.lock().settings.clone();
    Json(body).into_response()
}

async fn low_stock_count(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Some(failure) = record(&state, "/stock/low/count", HashMap::new(), &headers) {
        return failure;
    }
    let body = state.lock().count.clone();
    Json(body).into_response()
}
