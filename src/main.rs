mod assembler;
mod http;
mod marketplace;
mod metrics;
mod models;
#[cfg(test)]
mod testing;

use assembler::{Assembler, AssemblyError, AssemblyErrorKind};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{
        HeaderName, HeaderValue, Method, StatusCode,
        header::{ACCEPT, ACCESS_CONTROL_ALLOW_HEADERS, CONTENT_TYPE, ORIGIN},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use marketplace::{MarketplaceClient, MarketplaceConfig};
use models::{ResponseEnvelope, SearchParams};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_PORT: u16 = 9090;
const ALLOWED_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept";

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(target = "items.api", "server crashed: {err}");
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = MarketplaceConfig::from_env();
    info!(
        target = "items.api",
        base_url = %config.base_url,
        site_id = %config.site_id,
        "marketplace configured"
    );
    let state = AppState::new(config);
    let app = build_router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    info!(target = "items.api", "Server running on http://localhost:{port}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[derive(Clone)]
struct AppState {
    assembler: Assembler,
    openapi: Arc<serde_json::Value>,
}

impl AppState {
    fn new(config: MarketplaceConfig) -> Self {
        let openapi = serde_yaml::from_str(include_str!("../docs/openapi.yaml"))
            .unwrap_or(json!({"openapi": "3.0.3"}));
        Self {
            assembler: Assembler::new(MarketplaceClient::new(config)),
            openapi: Arc::new(openapi),
        }
    }
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([
            ORIGIN,
            HeaderName::from_static("x-requested-with"),
            CONTENT_TYPE,
            ACCEPT,
        ]);

    Router::new()
        .route("/health", get(health))
        .route("/openapi.json", get(openapi_json))
        .route("/docs", get(swagger_ui))
        .route("/api/items", get(search_items))
        .route("/api/items/{id}", get(item_detail))
        .with_state(state)
        .layer(cors)
        // CorsLayer only sends this on preflight responses.
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Health check.
///
/// - Method: `GET`
/// - Path: `/health`
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "items-api-rs",
    }))
}

async fn openapi_json(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json((*state.openapi).clone())
}

async fn swagger_ui() -> Response {
    let html = r#"<!doctype html>
<html>
<head>
  <meta charset='utf-8'/>
  <title>Items API Docs</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: '/openapi.json', dom_id: '#swagger-ui' });
    };
  </script>
</body>
</html>"#;
    (
        [(CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
        .into_response()
}

/// Search listings and reshape them.
///
/// - Method: `GET`
/// - Path: `/api/items?q=<text>&limit=<n>`
/// - Response: `ResponseEnvelope` with `items`
async fn search_items(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ResponseEnvelope>, AppError> {
    crate::metrics::inc_requests("/api/items");
    let envelope = state.assembler.search(&params).await?;
    Ok(Json(envelope))
}

/// Single item with description and category breadcrumb.
///
/// - Method: `GET`
/// - Path: `/api/items/{id}`
/// - Response: `ResponseEnvelope` with `item`
async fn item_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResponseEnvelope>, AppError> {
    crate::metrics::inc_requests("/api/items/{id}");
    let envelope = state.assembler.detail(&id).await?;
    Ok(Json(envelope))
}

#[derive(Debug)]
enum AppError {
    Assembly(AssemblyError),
}

impl From<AssemblyError> for AppError {
    fn from(value: AssemblyError) -> Self {
        Self::Assembly(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Assembly(err) => {
                let kind = match err.kind() {
                    AssemblyErrorKind::Upstream => "upstream",
                    AssemblyErrorKind::MissingField => "missing_field",
                };
                error!(
                    target = "items.api",
                    stage = err.stage(),
                    kind = kind,
                    detail = err.detail(),
                    "assembly failed"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("error: {err}"),
                )
                    .into_response()
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let _ = fmt().with_env_filter(filter).try_init();
}
