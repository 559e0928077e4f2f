use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use service::catalog::domain::{
    category_location, CategoryInput, CategoryListing, CategoryView, CategoryWithProducts, LinkInput, ProductLink,
};
use service::errors::ServiceError;

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

type CreatedResponse<T> = (StatusCode, [(header::HeaderName, String); 1], Json<T>);

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQuery {
    /// Return only `{"Name"}` objects.
    #[serde(default)]
    pub names_only: bool,
}

#[utoipa::path(get, path = "/Categories", tag = "categories", params(CategoryQuery), responses((status = 200, description = "Categories", body = [crate::openapi::CategoryDoc])), security(("bearer" = [])))]
pub async fn list(
    State(state): State<ServerState>,
    Query(q): Query<CategoryQuery>,
) -> Result<Json<CategoryListing>, JsonApiError> {
    Ok(Json(state.catalog.list_categories(q.names_only).await?))
}

#[utoipa::path(get, path = "/Categories/{id}", tag = "categories", params(("id" = i32, Path, description = "Category id")), responses((status = 200, description = "Category", body = crate::openapi::CategoryDoc), (status = 404, description = "Not Found")), security(("bearer" = [])))]
pub async fn get(State(state): State<ServerState>, Path(id): Path<i32>) -> Result<Json<CategoryView>, JsonApiError> {
    Ok(Json(state.catalog.find_category(id).await?))
}

#[utoipa::path(post, path = "/Categories", tag = "categories", request_body = crate::openapi::CategoryRequest, responses((status = 201, description = "Created", body = crate::openapi::CategoryDoc), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")), security(("bearer" = [])))]
pub async fn create(
    State(state): State<ServerState>,
    body: Result<Json<CategoryInput>, JsonRejection>,
) -> Result<CreatedResponse<CategoryView>, JsonApiError> {
    let Json(input) = body?;
    let created = state.catalog.create_category(input).await?;
    Ok((StatusCode::CREATED, [(header::LOCATION, created.location)], Json(created.value)))
}

/// `POST /Categories/{id}/products`: the category comes from the path.
#[utoipa::path(post, path = "/Categories/{id}/products", tag = "categories", params(("id" = i32, Path, description = "Category id")), request_body = crate::openapi::LinkRequest, responses((status = 201, description = "Linked", body = crate::openapi::ProductLinkDoc), (status = 400, description = "Bad Request"), (status = 404, description = "Category or product not found"), (status = 409, description = "Already linked")), security(("bearer" = [])))]
pub async fn link(
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    body: Result<Json<LinkInput>, JsonRejection>,
) -> Result<CreatedResponse<ProductLink>, JsonApiError> {
    let Json(mut input) = body?;
    match input.category_id {
        Some(other) if other != id => {
            return Err(ServiceError::Validation("CategoryId does not match the route".into()).into());
        }
        _ => input.category_id = Some(id),
    }
    add_link_inner(&state, input).await
}

#[utoipa::path(post, path = "/ProductCategories", tag = "categories", request_body = crate::openapi::LinkRequest, responses((status = 201, description = "Linked", body = crate::openapi::ProductLinkDoc), (status = 400, description = "Bad Request"), (status = 404, description = "Category or product not found"), (status = 409, description = "Already linked")), security(("bearer" = [])))]
pub async fn add_link(
    State(state): State<ServerState>,
    body: Result<Json<LinkInput>, JsonRejection>,
) -> Result<CreatedResponse<ProductLink>, JsonApiError> {
    let Json(input) = body?;
    add_link_inner(&state, input).await
}

#[utoipa::path(post, path = "/ProductCategories/add", tag = "categories", request_body = crate::openapi::LinkRequest, responses((status = 201, description = "Linked", body = crate::openapi::ProductLinkDoc), (status = 400, description = "Bad Request"), (status = 404, description = "Category or product not found"), (status = 409, description = "Already linked")), security(("bearer" = [])))]
pub async fn add(
    State(state): State<ServerState>,
    body: Result<Json<LinkInput>, JsonRejection>,
) -> Result<CreatedResponse<ProductLink>, JsonApiError> {
    let Json(input) = body?;
    add_link_inner(&state, input).await
}

async fn add_link_inner(state: &ServerState, input: LinkInput) -> Result<CreatedResponse<ProductLink>, JsonApiError> {
    let link = state.catalog.link_product(input).await?;
    Ok((StatusCode::CREATED, [(header::LOCATION, category_location(link.category_id))], Json(link)))
}

#[utoipa::path(get, path = "/ProductCategories", tag = "categories", responses((status = 200, description = "Categories with their products", body = [crate::openapi::CategoryWithProductsDoc]), (status = 500, description = "Internal Server Error")), security(("bearer" = [])))]
pub async fn with_products(
    State(state): State<ServerState>,
) -> Result<Json<Vec<CategoryWithProducts>>, JsonApiError> {
    Ok(Json(state.catalog.categories_with_products().await?))
}
