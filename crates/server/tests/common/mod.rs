#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response};
use axum::Router;
use configs::{AppConfig, DatabaseConfig};
use serde_json::Value;
use tower::Service;

use server::routes::auth::ServerState;
use service::auth::domain::{AuthUser, RegisterInput};

pub const SECRET: &str = "integration-test-secret-0123456789";

pub fn test_config(auth_enabled: bool) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.database = DatabaseConfig::sqlite_memory();
    cfg.auth.jwt_secret = SECRET.into();
    cfg.auth.enabled = auth_enabled;
    cfg
}

pub async fn build_app_with(cfg: &AppConfig) -> anyhow::Result<(Router, ServerState)> {
    let state = server::startup::build_state(cfg).await?;
    Ok((server::startup::build_app(state.clone()), state))
}

pub async fn build_app() -> anyhow::Result<(Router, ServerState)> {
    build_app_with(&test_config(true)).await
}

/// Token for a user that only exists in the claims; skips password hashing.
pub fn token_for(state: &ServerState, user_name: &str, roles: &[&str]) -> String {
    let user = AuthUser {
        id: 1,
        user_name: user_name.into(),
        first_name: "Test".into(),
        last_name: "User".into(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    };
    state.auth.issue_token(&user).expect("issue token")
}

pub fn admin_token(state: &ServerState) -> String { token_for(state, "admin", &["Admin"]) }

pub fn user_token(state: &ServerState) -> String { token_for(state, "clerk", &["User"]) }

pub async fn register(state: &ServerState, user_name: &str, password: &str, roles: &[&str]) -> anyhow::Result<AuthUser> {
    Ok(state
        .auth
        .register(RegisterInput {
            user_name: user_name.into(),
            password: password.into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        })
        .await?)
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> anyhow::Result<Request<Body>> {
    let mut b = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(v) => b.header(header::CONTENT_TYPE, "application/json").body(Body::from(serde_json::to_vec(&v)?))?,
        None => b.body(Body::empty())?,
    };
    Ok(req)
}

pub async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<Response<Body>> {
    Ok(app.clone().call(req).await?)
}

pub async fn body_json(resp: Response<Body>) -> anyhow::Result<Value> {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn product(name: &str, sku: &str, price: f64) -> Value {
    serde_json::json!({
        "Name": name,
        "SKU": sku,
        "Description": format!("{name} description"),
        "Image": "img/p.png",
        "Price": price,
    })
}
