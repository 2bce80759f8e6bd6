//! In-process stand-in for the marketplace API, bound to an ephemeral port.

use crate::marketplace::MarketplaceConfig;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;

#[derive(Default)]
struct Fixtures {
    search: Option<Value>,
    items: HashMap<String, Value>,
    descriptions: HashMap<String, String>,
    categories: HashMap<String, Value>,
}

#[derive(Clone)]
struct FakeState {
    fixtures: Arc<Fixtures>,
    last_search: Arc<Mutex<Option<HashMap<String, String>>>>,
    category_hits: Arc<Mutex<Vec<String>>>,
}

#[derive(Default)]
pub struct FakeMarketplace {
    fixtures: Fixtures,
}

pub struct RunningMarketplace {
    base_url: String,
    state: FakeState,
}

impl FakeMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, body: Value) -> Self {
        self.fixtures.search = Some(body);
        self
    }

    pub fn with_item(mut self, body: Value) -> Self {
        let id = body["id"].as_str().unwrap_or_default().to_string();
        self.fixtures.items.insert(id, body);
        self
    }

    pub fn with_description(mut self, item_id: &str, text: &str) -> Self {
        self.fixtures
            .descriptions
            .insert(item_id.to_string(), text.to_string());
        self
    }

    pub fn with_category(self, id: &str, names: &[&str]) -> Self {
        let path: Vec<Value> = names
            .iter()
            .enumerate()
            .map(|(idx, name)| json!({"id": format!("{id}-{idx}"), "name": name}))
            .collect();
        self.with_raw_category(id, json!({"id": id, "path_from_root": path}))
    }

    pub fn with_raw_category(mut self, id: &str, body: Value) -> Self {
        self.fixtures.categories.insert(id.to_string(), body);
        self
    }

    pub async fn spawn(self) -> RunningMarketplace {
        let state = FakeState {
            fixtures: Arc::new(self.fixtures),
            last_search: Arc::new(Mutex::new(None)),
            category_hits: Arc::new(Mutex::new(Vec::new())),
        };
        let app = Router::new()
            .route("/sites/{site}/search", get(search))
            .route("/items/{id}", get(item))
            .route("/items/{id}/description", get(description))
            .route("/categories/{id}", get(category))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake marketplace");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        RunningMarketplace {
            base_url: format!("http://{addr}"),
            state,
        }
    }
}

impl RunningMarketplace {
    pub fn config(&self) -> MarketplaceConfig {
        MarketplaceConfig::default().with_base_url(&self.base_url)
    }

    pub async fn last_search_query(&self) -> Option<HashMap<String, String>> {
        self.state.last_search.lock().await.clone()
    }

    pub async fn category_hits(&self) -> Vec<String> {
        self.state.category_hits.lock().await.clone()
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"message": "not_found", "status": 404})),
    )
        .into_response()
}

async fn search(
    State(state): State<FakeState>,
    Path(_site): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    *state.last_search.lock().await = Some(params);
    match &state.fixtures.search {
        Some(body) => Json(body.clone()).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "search unavailable").into_response(),
    }
}

async fn item(State(state): State<FakeState>, Path(id): Path<String>) -> Response {
    match state.fixtures.items.get(&id) {
        Some(body) => Json(body.clone()).into_response(),
        None => not_found(),
    }
}

async fn description(State(state): State<FakeState>, Path(id): Path<String>) -> Response {
    match state.fixtures.descriptions.get(&id) {
        Some(text) => Json(json!({"text": "", "plain_text": text})).into_response(),
        None => not_found(),
    }
}

async fn category(State(state): State<FakeState>, Path(id): Path<String>) -> Response {
    state.category_hits.lock().await.push(id.clone());
    match state.fixtures.categories.get(&id) {
        Some(body) => Json(body.clone()).into_response(),
        None => not_found(),
    }
}
