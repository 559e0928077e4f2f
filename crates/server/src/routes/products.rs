use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use service::catalog::domain::{ProductInfo, ProductInput, ProductView};

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Exact product name; no match is a 404.
    pub name: Option<String>,
}

#[utoipa::path(get, path = "/Products", tag = "products", params(ProductQuery), responses((status = 200, description = "Products", body = [crate::openapi::ProductDoc]), (status = 404, description = "No product with that name")))]
pub async fn list(
    State(state): State<ServerState>,
    Query(q): Query<ProductQuery>,
) -> Result<Json<Vec<ProductView>>, JsonApiError> {
    Ok(Json(state.catalog.list_products(q.name.as_deref()).await?))
}

#[utoipa::path(get, path = "/Products/{sku}", tag = "products", params(("sku" = String, Path, description = "Product SKU")), responses((status = 200, description = "Product", body = crate::openapi::ProductDoc), (status = 404, description = "Not Found")))]
pub async fn get(State(state): State<ServerState>, Path(sku): Path<String>) -> Result<Json<ProductView>, JsonApiError> {
    Ok(Json(state.catalog.find_by_sku(&sku).await?))
}

#[utoipa::path(get, path = "/Products/{sku}/info", tag = "products", params(("sku" = String, Path, description = "Product SKU")), responses((status = 200, description = "Id, SKU and name", body = crate::openapi::ProductInfoDoc), (status = 404, description = "Not Found")))]
pub async fn info(State(state): State<ServerState>, Path(sku): Path<String>) -> Result<Json<ProductInfo>, JsonApiError> {
    Ok(Json(state.catalog.product_info(&sku).await?))
}

#[utoipa::path(post, path = "/Products", tag = "products", request_body = crate::openapi::ProductDoc, responses((status = 201, description = "Created", body = crate::openapi::ProductDoc), (status = 400, description = "Bad Request"), (status = 401, description = "Unauthorized"), (status = 403, description = "Forbidden"), (status = 409, description = "Conflict")), security(("bearer" = [])))]
pub async fn create(
    State(state): State<ServerState>,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<ProductView>), JsonApiError> {
    let Json(input) = body?;
    let created = state.catalog.create_product(input).await?;
    Ok((StatusCode::CREATED, [(header::LOCATION, created.location)], Json(created.value)))
}

#[utoipa::path(put, path = "/Products/{sku}", tag = "products", params(("sku" = String, Path, description = "Product SKU")), request_body = crate::openapi::ProductDoc, responses((status = 204, description = "Updated"), (status = 400, description = "Bad Request"), (status = 404, description = "Not Found")), security(("bearer" = [])))]
pub async fn update(
    State(state): State<ServerState>,
    Path(sku): Path<String>,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> Result<StatusCode, JsonApiError> {
    let Json(input) = body?;
    state.catalog.update_product(&sku, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(delete, path = "/Products/{sku}", tag = "products", params(("sku" = String, Path, description = "Product SKU")), responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found")), security(("bearer" = [])))]
pub async fn delete(State(state): State<ServerState>, Path(sku): Path<String>) -> Result<StatusCode, JsonApiError> {
    state.catalog.delete_product(&sku).await?;
    Ok(StatusCode::NO_CONTENT)
}
