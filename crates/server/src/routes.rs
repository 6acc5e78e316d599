pub mod restaurants;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;
use service::store::JsonDocumentStore;
use service::RestaurantService;

use crate::errors::JsonApiError;
use crate::openapi::ApiDoc;

const IMAGE_BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct ServerState {
    pub restaurants: Arc<RestaurantService<JsonDocumentStore>>,
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics() -> Result<impl IntoResponse, JsonApiError> {
    let body = common::metrics::render().map_err(|e| {
        JsonApiError::new(axum::http::StatusCode::INTERNAL_SERVER_ERROR, "METRICS_UNAVAILABLE", Some(e.to_string()))
    })?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}

/// Build the full application router: restaurant API, health, metrics and docs
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/restaurants", post(restaurants::create).get(restaurants::list))
        .route("/restaurants/search", get(restaurants::search))
        .route(
            "/restaurants/:id",
            get(restaurants::get).put(restaurants::update).delete(restaurants::delete),
        )
        .route("/restaurants/:id/scores", post(restaurants::add_score).get(restaurants::list_scores))
        .route("/restaurants/:id/scores/mine", get(restaurants::my_score))
        .route("/restaurants/:id/comments", post(restaurants::add_comment).get(restaurants::list_comments))
        .route(
            "/restaurants/:id/images",
            post(restaurants::add_image).layer(DefaultBodyLimit::max(IMAGE_BODY_LIMIT)),
        )
        .with_state(state);

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .merge(api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // status code and latency
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
