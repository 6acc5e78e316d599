use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use common::metrics::record_operation;
use models::feedback::{CommentList, ScoreList, ScoreLookup};
use models::restaurant::{Restaurant, RestaurantList};
use service::RestaurantError;

use crate::errors::JsonApiError;
use crate::extract::Author;
use crate::routes::ServerState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// JSON filter object; `location` + `maxDistance` run a proximity search
    pub filter: Option<String>,
}

/// Count the outcome and turn a service error into its HTTP form.
fn observe<T>(operation: &'static str, result: Result<T, RestaurantError>) -> Result<T, JsonApiError> {
    match &result {
        Ok(_) => record_operation(operation, "ok"),
        Err(e) => record_operation(operation, e.kind()),
    }
    result.map_err(JsonApiError::from)
}

fn body_field(raw: &str, field: &str) -> Result<Value, RestaurantError> {
    let body: Value = serde_json::from_str(raw).map_err(|_| RestaurantError::UnparsableJson)?;
    body.get(field).cloned().ok_or_else(|| RestaurantError::missing(field))
}

fn visible(mut list: RestaurantList) -> RestaurantList {
    list.restaurants.retain(|r| !r.deleted);
    list
}

#[utoipa::path(
    post, path = "/restaurants", tag = "restaurants",
    request_body = crate::openapi::RestaurantInputDoc,
    params(("X-User-Email" = String, Header, description = "caller identity")),
    responses(
        (status = 201, description = "Created", body = crate::openapi::CreatedResponse),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorBody),
        (status = 500, description = "Store Failure", body = crate::openapi::ErrorBody)
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Author(author): Author,
    body: String,
) -> Result<(StatusCode, Json<Value>), JsonApiError> {
    let id = observe("add", state.restaurants.add(&body, &author).await)?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

#[utoipa::path(get, path = "/restaurants", tag = "restaurants", responses((status = 200, description = "Restaurants not deleted")))]
pub async fn list(State(state): State<ServerState>) -> Result<Json<RestaurantList>, JsonApiError> {
    let all = observe("get_all", state.restaurants.get_all().await)?;
    Ok(Json(visible(all)))
}

#[utoipa::path(
    get, path = "/restaurants/search", tag = "restaurants",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching restaurants, nearest first for proximity searches"),
        (status = 400, description = "Invalid Filter", body = crate::openapi::ErrorBody)
    )
)]
pub async fn search(
    State(state): State<ServerState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<RestaurantList>, JsonApiError> {
    let filter = q.filter.unwrap_or_else(|| "{}".to_string());
    let found = observe("query", state.restaurants.query(&filter).await)?;
    debug!(count = found.restaurants.len(), "search finished");
    Ok(Json(visible(found)))
}

#[utoipa::path(
    get, path = "/restaurants/{id}", tag = "restaurants",
    params(("id" = String, Path, description = "restaurant id")),
    responses(
        (status = 200, description = "Restaurant"),
        (status = 404, description = "Unknown or deleted", body = crate::openapi::ErrorBody)
    )
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<String>) -> Result<Json<Restaurant>, JsonApiError> {
    let found = state.restaurants.get(&id).await.and_then(|r| {
        if r.deleted {
            Err(RestaurantError::UnknownRestaurantId)
        } else {
            Ok(r)
        }
    });
    observe("get", found).map(Json)
}

#[utoipa::path(
    put, path = "/restaurants/{id}", tag = "restaurants",
    params(("id" = String, Path, description = "restaurant id")),
    request_body = crate::openapi::RestaurantInputDoc,
    responses(
        (status = 204, description = "Updated"),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorBody),
        (status = 404, description = "Unknown restaurant", body = crate::openapi::ErrorBody)
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    body: String,
) -> Result<StatusCode, JsonApiError> {
    observe("update", state.restaurants.update(&id, &body).await)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete, path = "/restaurants/{id}", tag = "restaurants",
    params(("id" = String, Path, description = "restaurant id")),
    responses(
        (status = 204, description = "Marked deleted"),
        (status = 404, description = "Unknown restaurant", body = crate::openapi::ErrorBody)
    )
)]
pub async fn delete(State(state): State<ServerState>, Path(id): Path<String>) -> Result<StatusCode, JsonApiError> {
    observe("delete", state.restaurants.delete(&id).await)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post, path = "/restaurants/{id}/scores", tag = "scores",
    params(
        ("id" = String, Path, description = "restaurant id"),
        ("X-User-Email" = String, Header, description = "caller identity")
    ),
    request_body = crate::openapi::ScoreInputDoc,
    responses(
        (status = 200, description = "New average", body = crate::openapi::ScoreResponse),
        (status = 400, description = "Invalid score", body = crate::openapi::ErrorBody),
        (status = 404, description = "Unknown restaurant", body = crate::openapi::ErrorBody)
    )
)]
pub async fn add_score(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Author(author): Author,
    body: String,
) -> Result<Json<Value>, JsonApiError> {
    let result = match body_field(&body, "score") {
        Ok(raw) => state.restaurants.add_score(&id, &raw, &author).await,
        Err(e) => Err(e),
    };
    let average = observe("add_score", result)?;
    Ok(Json(json!({ "score": average })))
}

#[utoipa::path(
    get, path = "/restaurants/{id}/scores", tag = "scores",
    params(("id" = String, Path, description = "restaurant id")),
    responses((status = 200, description = "All scores"), (status = 404, description = "Unknown restaurant", body = crate::openapi::ErrorBody))
)]
pub async fn list_scores(State(state): State<ServerState>, Path(id): Path<String>) -> Result<Json<ScoreList>, JsonApiError> {
    observe("get_scores", state.restaurants.get_scores(&id).await).map(Json)
}

#[utoipa::path(
    get, path = "/restaurants/{id}/scores/mine", tag = "scores",
    params(
        ("id" = String, Path, description = "restaurant id"),
        ("X-User-Email" = String, Header, description = "caller identity")
    ),
    responses((status = 200, description = "Caller's score, null when absent"))
)]
pub async fn my_score(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Author(author): Author,
) -> Result<Json<ScoreLookup>, JsonApiError> {
    observe("get_score", state.restaurants.get_score(&id, &author).await).map(Json)
}

#[utoipa::path(
    post, path = "/restaurants/{id}/comments", tag = "comments",
    params(
        ("id" = String, Path, description = "restaurant id"),
        ("X-User-Email" = String, Header, description = "caller identity")
    ),
    request_body = crate::openapi::CommentInputDoc,
    responses(
        (status = 201, description = "Created", body = crate::openapi::CreatedResponse),
        (status = 404, description = "Unknown restaurant", body = crate::openapi::ErrorBody)
    )
)]
pub async fn add_comment(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Author(author): Author,
    body: String,
) -> Result<(StatusCode, Json<Value>), JsonApiError> {
    let text = body_field(&body, "text")
        .and_then(|v| v.as_str().map(str::to_string).ok_or_else(|| RestaurantError::wrong_type("text")));
    let result = match text {
        Ok(text) => state.restaurants.add_comment(&id, &text, &author).await,
        Err(e) => Err(e),
    };
    let comment_id = observe("add_comment", result)?;
    Ok((StatusCode::CREATED, Json(json!({ "id": comment_id }))))
}

#[utoipa::path(
    get, path = "/restaurants/{id}/comments", tag = "comments",
    params(("id" = String, Path, description = "restaurant id")),
    responses((status = 200, description = "All comments"), (status = 404, description = "Unknown restaurant", body = crate::openapi::ErrorBody))
)]
pub async fn list_comments(State(state): State<ServerState>, Path(id): Path<String>) -> Result<Json<CommentList>, JsonApiError> {
    observe("get_comments", state.restaurants.get_comments(&id).await).map(Json)
}

#[utoipa::path(
    post, path = "/restaurants/{id}/images", tag = "images",
    params(("id" = String, Path, description = "restaurant id")),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Uploaded", body = crate::openapi::ImageResponse),
        (status = 404, description = "Unknown restaurant", body = crate::openapi::ErrorBody),
        (status = 502, description = "Image host failure", body = crate::openapi::ErrorBody)
    )
)]
pub async fn add_image(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), JsonApiError> {
    let url = observe("add_image", state.restaurants.add_image(&id, body.to_vec()).await)?;
    Ok((StatusCode::CREATED, Json(json!({ "url": url }))))
}
