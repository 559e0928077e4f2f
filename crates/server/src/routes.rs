pub mod auth;
pub mod categories;
pub mod products;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::observability;
use crate::openapi::ApiDoc;
use auth::ServerState;

/// Liveness plus a database ping.
#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse), (status = 503, description = "Database unreachable")))]
pub async fn health(State(state): State<ServerState>) -> (StatusCode, Json<Health>) {
    match state.db.ping().await {
        Ok(()) => (StatusCode::OK, Json(Health { status: "ok" })),
        Err(e) => {
            warn!(err = %e, "database ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(Health { status: "unavailable" }))
        }
    }
}

async fn metrics() -> (StatusCode, String) {
    observability::encode_metrics()
}

/// Build the full application router: infrastructure, auth, and catalog routes
/// behind the access-policy middleware.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/Auth", post(auth::login));

    let product_routes = Router::new()
        .route("/Products", get(products::list).post(products::create))
        .route(
            "/Products/:sku",
            get(products::get).put(products::update).delete(products::delete),
        )
        .route("/Products/:sku/info", get(products::info));

    let category_routes = Router::new()
        .route("/Categories", get(categories::list).post(categories::create))
        .route("/Categories/:id", get(categories::get))
        .route("/Categories/:id/products", post(categories::link))
        .route(
            "/ProductCategories",
            get(categories::with_products).post(categories::add_link),
        )
        .route("/ProductCategories/add", post(categories::add));

    public
        .merge(product_routes)
        .merge(category_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_access))
        .layer(middleware::from_fn(observability::track_metrics))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
