use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

// Document-only mirrors of the wire types; prices are shown as numbers.

#[derive(Serialize, ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(Serialize, ToSchema)]
pub struct ErrorDoc { pub title: String, pub status: u16, pub detail: Option<String> }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct LoginRequest { pub user_name: String, pub password: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct TokenDoc { pub token: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ProductDoc {
    pub name: String,
    #[serde(rename = "SKU")]
    pub sku: String,
    pub description: String,
    pub image: String,
    #[schema(example = 19.99)]
    pub price: f64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ProductInfoDoc {
    pub id: i32,
    #[serde(rename = "SKU")]
    pub sku: String,
    pub name: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CategoryDoc { pub id: i32, pub name: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CategoryRequest { pub name: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct LinkRequest {
    pub category_id: Option<i32>,
    pub product_id: Option<i32>,
    #[serde(rename = "ProductSKU")]
    pub product_sku: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ProductLinkDoc { pub category_id: i32, pub product_id: i32 }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ProductSummaryDoc { pub product_id: i32, pub product_name: String, pub product_price: f64 }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CategoryWithProductsDoc {
    pub category_id: i32,
    pub category_name: String,
    pub products: Vec<ProductSummaryDoc>,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::products::list,
        crate::routes::products::get,
        crate::routes::products::info,
        crate::routes::products::create,
        crate::routes::products::update,
        crate::routes::products::delete,
        crate::routes::categories::list,
        crate::routes::categories::get,
        crate::routes::categories::create,
        crate::routes::categories::link,
        crate::routes::categories::add_link,
        crate::routes::categories::add,
        crate::routes::categories::with_products,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorDoc,
            LoginRequest,
            TokenDoc,
            ProductDoc,
            ProductInfoDoc,
            CategoryDoc,
            CategoryRequest,
            LinkRequest,
            ProductLinkDoc,
            ProductSummaryDoc,
            CategoryWithProductsDoc,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "products"),
        (name = "categories")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/health", "/Auth", "/Products", "/Products/{sku}", "/Products/{sku}/info", "/Categories", "/Categories/{id}", "/Categories/{id}/products", "/ProductCategories", "/ProductCategories/add"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"SKU\""));
        assert!(json.contains("bearer"));
    }
}
