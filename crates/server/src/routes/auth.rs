use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use service::auth::domain::{LoginInput, TokenResponse};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::auth::StaticKeyProvider;
use service::catalog::repo::seaorm::SeaOrmCatalogRepository;
use service::catalog::service::CatalogService;

use crate::errors::JsonApiError;
use crate::observability::{AUTH_FAILURES_TOTAL, LOGINS_TOTAL};

/// Cookie carrying the session token for browser clients.
pub const AUTH_COOKIE: &str = "auth_token";

pub type Catalog = CatalogService<SeaOrmCatalogRepository>;
pub type Auth = AuthService<SeaOrmAuthRepository, StaticKeyProvider>;

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub catalog: Arc<Catalog>,
    pub auth: Arc<Auth>,
    /// When false every route is public.
    pub auth_enabled: bool,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, keys: Arc<StaticKeyProvider>, cfg: AuthConfig, auth_enabled: bool) -> Self {
        let catalog = CatalogService::new(Arc::new(SeaOrmCatalogRepository { db: db.clone() }));
        let auth = AuthService::new(Arc::new(SeaOrmAuthRepository { db: db.clone() }), keys, cfg);
        Self { db, catalog: Arc::new(catalog), auth: Arc::new(auth), auth_enabled }
    }
}

#[utoipa::path(post, path = "/Auth", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in", body = crate::openapi::TokenDoc), (status = 400, description = "Malformed body"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    body: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<TokenResponse>), JsonApiError> {
    let Json(input) = body?;
    let session = match state.auth.authenticate(input).await {
        Ok(s) => s,
        Err(e) => {
            LOGINS_TOTAL.with_label_values(&["failure"]).inc();
            return Err(e.into());
        }
    };
    LOGINS_TOTAL.with_label_values(&["success"]).inc();
    info!(user = %session.user.user_name, "login succeeded");

    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    Ok((jar.add(cookie), Json(TokenResponse { token: session.token })))
}

/// What a route requires from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Admin,
}

/// Access rule for a request. Unknown paths need a token.
pub fn access_policy(method: &Method, path: &str) -> Access {
    if method == Method::OPTIONS {
        return Access::Public;
    }
    let read = method == Method::GET || method == Method::HEAD;
    let first = path.trim_start_matches('/').split('/').next().unwrap_or("").to_ascii_lowercase();
    match first.as_str() {
        "health" | "metrics" | "auth" | "docs" | "api-docs" => Access::Public,
        "products" if read => Access::Public,
        "products" => Access::Admin,
        "categories" | "productcategories" if read => Access::Authenticated,
        "categories" | "productcategories" => Access::Admin,
        _ => Access::Authenticated,
    }
}

/// Bearer token from `Authorization`, falling back to the session cookie.
/// `Err` when the header is present but not a bearer credential.
fn extract_token(headers: &HeaderMap) -> Result<Option<String>, ()> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let value = value.to_str().map_err(|_| ())?;
        let (scheme, token) = value.split_once(' ').ok_or(())?;
        if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
            return Err(());
        }
        return Ok(Some(token.trim().to_string()));
    }
    let jar = CookieJar::from_headers(headers);
    Ok(jar.get(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|t| !t.is_empty()))
}

fn reject(reason: &'static str, path: &str) -> JsonApiError {
    AUTH_FAILURES_TOTAL.with_label_values(&[reason]).inc();
    warn!(%path, reason, "request rejected");
    match reason {
        "forbidden" => JsonApiError::forbidden(),
        _ => JsonApiError::unauthorized(),
    }
}

/// Global middleware: applies `access_policy` and attaches the verified
/// `Principal` to the request extensions.
pub async fn require_access(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    if !state.auth_enabled {
        return Ok(next.run(req).await);
    }
    let path = req.uri().path().to_string();
    let access = access_policy(req.method(), &path);
    if access == Access::Public {
        return Ok(next.run(req).await);
    }

    let token = match extract_token(req.headers()) {
        Ok(Some(t)) => t,
        Ok(None) => return Err(reject("missing_token", &path)),
        Err(()) => return Err(reject("bad_scheme", &path)),
    };
    let principal = state.auth.verify(&token).map_err(|e| {
        warn!(%path, err = %e, "token validation failed");
        reject("invalid_token", &path)
    })?;
    if access == Access::Admin && !principal.is_admin() {
        return Err(reject("forbidden", &path));
    }

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn products_are_public_to_read_and_admin_to_write() {
        assert_eq!(access_policy(&Method::GET, "/Products"), Access::Public);
        assert_eq!(access_policy(&Method::GET, "/Products/SKU-1/info"), Access::Public);
        assert_eq!(access_policy(&Method::POST, "/Products"), Access::Admin);
        assert_eq!(access_policy(&Method::PUT, "/Products/SKU-1"), Access::Admin);
        assert_eq!(access_policy(&Method::DELETE, "/Products/SKU-1"), Access::Admin);
    }

    #[test]
    fn categories_need_a_token() {
        assert_eq!(access_policy(&Method::GET, "/Categories"), Access::Authenticated);
        assert_eq!(access_policy(&Method::GET, "/ProductCategories"), Access::Authenticated);
        assert_eq!(access_policy(&Method::POST, "/Categories"), Access::Admin);
        assert_eq!(access_policy(&Method::POST, "/Categories/3/products"), Access::Admin);
        assert_eq!(access_policy(&Method::POST, "/ProductCategories/add"), Access::Admin);
    }

    #[test]
    fn infrastructure_routes_are_public() {
        for path in ["/health", "/metrics", "/Auth", "/docs/", "/api-docs/openapi.json"] {
            assert_eq!(access_policy(&Method::GET, path), Access::Public, "{path}");
        }
        assert_eq!(access_policy(&Method::POST, "/Auth"), Access::Public);
        assert_eq!(access_policy(&Method::OPTIONS, "/Categories"), Access::Public);
        assert_eq!(access_policy(&Method::GET, "/somewhere"), Access::Authenticated);
    }

    #[test]
    fn token_comes_from_header_or_cookie() {
        let mut h = HeaderMap::new();
        assert_eq!(extract_token(&h), Ok(None));

        h.insert(header::COOKIE, HeaderValue::from_static("theme=dark; auth_token=from-cookie"));
        assert_eq!(extract_token(&h), Ok(Some("from-cookie".into())));

        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_token(&h), Ok(Some("from-header".into())));

        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(extract_token(&h), Err(()));
    }
}
