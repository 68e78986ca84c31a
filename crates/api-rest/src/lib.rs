//! # API REST
//!
//! Read-only REST API over the quote store.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialisation, CORS, status-code mapping)
//!
//! Uses `api-shared` for response schemas and `quotes-core` for data access. The router is
//! built here so both the workspace's `quotes-run` binary and the standalone
//! `quotes-api-rest` binary serve identical routes.

#![warn(rust_2018_idioms)]

use api_shared::{CountRes, HealthRes, HealthService, QuoteRes};
use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use quotes_core::{QuoteError, QuoteId, QuoteStore};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

type ApiError = (StatusCode, &'static str);

/// Application state shared across REST API handlers.
///
/// Holds the API's own store handle; the ingestion loop writes through a separate one. Store
/// calls are short indexed SQLite reads and run inline in the handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<QuoteStore>,
}

impl AppState {
    pub fn new(store: Arc<QuoteStore>) -> Self {
        Self { store }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, random_quote, count_quotes, get_quote),
    components(schemas(HealthRes, QuoteRes, CountRes)),
    info(title = "Quotes API", version = "1.0")
)]
pub struct ApiDoc;

/// Build the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/quotes/random", get(random_quote))
        .route("/quotes/count", get(count_quotes))
        .route("/quotes/:id", get(get_quote))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn internal_error(context: &str, e: &QuoteError) -> ApiError {
    tracing::error!("{} error: {:?}", context, e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/quotes/random",
    responses(
        (status = 200, description = "A randomly selected quote", body = QuoteRes),
        (status = 404, description = "No quotes available"),
        (status = 500, description = "Internal server error")
    )
)]
/// Return one uniformly selected stored quote
///
/// # Errors
/// Returns `404 Not Found` when the store is empty and `500 Internal Server Error` if the
/// store cannot be read.
#[axum::debug_handler]
pub async fn random_quote(State(state): State<AppState>) -> Result<Json<QuoteRes>, ApiError> {
    match state.store.random() {
        Ok(quote) => Ok(Json(quote.into())),
        Err(QuoteError::NotFound) => Err((StatusCode::NOT_FOUND, "No quotes available")),
        Err(e) => Err(internal_error("Random quote", &e)),
    }
}

#[utoipa::path(
    get,
    path = "/quotes/count",
    responses(
        (status = 200, description = "Number of stored quotes", body = CountRes),
        (status = 500, description = "Internal server error")
    )
)]
/// Return how many quotes are stored
#[axum::debug_handler]
pub async fn count_quotes(State(state): State<AppState>) -> Result<Json<CountRes>, ApiError> {
    state
        .store
        .count()
        .map(|total| Json(CountRes { total }))
        .map_err(|e| internal_error("Count quotes", &e))
}

#[utoipa::path(
    get,
    path = "/quotes/{id}",
    params(
        ("id" = String, Path, description = "64-character quote fingerprint")
    ),
    responses(
        (status = 200, description = "The quote with this fingerprint", body = QuoteRes),
        (status = 400, description = "Malformed fingerprint"),
        (status = 404, description = "Quote not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Look up a quote by its fingerprint
#[axum::debug_handler]
pub async fn get_quote(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<QuoteRes>, ApiError> {
    let id = QuoteId::parse(&id).map_err(|_| (StatusCode::BAD_REQUEST, "Invalid quote id"))?;

    match state.store.get(&id) {
        Ok(Some(quote)) => Ok(Json(quote.into())),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Quote not found")),
        Err(e) => Err(internal_error("Get quote", &e)),
    }
}
