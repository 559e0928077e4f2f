mod common;

use axum::http::{header, StatusCode};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

use common::*;

#[tokio::test]
async fn login_returns_token_and_cookie() -> anyhow::Result<()> {
    let (app, state) = build_app().await?;
    register(&state, "ada", "S3curePass!", &["Admin", "User"]).await?;

    let body = json!({"UserName": "ada", "Password": "S3curePass!"});
    let resp = send(&app, request("POST", "/Auth", None, Some(body))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers().get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));

    let token = body_json(resp).await?["Token"].as_str().expect("token").to_string();
    let principal = state.auth.verify(&token)?;
    assert_eq!(principal.user_name, "ada");
    assert_eq!(principal.given_name, "Ada");
    assert_eq!(principal.family_name, "Lovelace");
    assert!(principal.is_admin());
    assert!(principal.is_in_role("User"));

    // the issued token opens admin routes
    let resp = send(&app, request("POST", "/Categories", Some(&token), Some(json!({"Name": "Tools"})))?).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() -> anyhow::Result<()> {
    let (app, state) = build_app().await?;
    register(&state, "grace", "CorrectHorse1", &[]).await?;

    for body in [
        json!({"UserName": "grace", "Password": "wrong-password"}),
        json!({"UserName": "nobody", "Password": "CorrectHorse1"}),
        json!({"UserName": "", "Password": ""}),
    ] {
        let resp = send(&app, request("POST", "/Auth", None, Some(body))?).await?;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
    }

    let resp = send(&app, request("POST", "/Auth", None, Some(json!({"UserName": "grace"})))?).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn cookie_stands_in_for_bearer_header() -> anyhow::Result<()> {
    let (app, state) = build_app().await?;
    let token = user_token(&state);

    let req = axum::http::Request::builder()
        .method("GET")
        .uri("/Categories")
        .header(header::COOKIE, format!("auth_token={token}"))
        .body(axum::body::Body::empty())?;
    let resp = send(&app, req).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = axum::http::Request::builder()
        .method("GET")
        .uri("/Categories")
        .header(header::AUTHORIZATION, format!("Basic {token}"))
        .body(axum::body::Body::empty())?;
    let resp = send(&app, req).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn foreign_and_expired_tokens_are_rejected() -> anyhow::Result<()> {
    let mut cfg = test_config(true);
    cfg.auth.token_ttl_secs = Some(3600);
    let (app, _state) = build_app_with(&cfg).await?;

    let claims = json!({"sub": "mallory", "given_name": "M", "family_name": "X", "role": ["Admin"], "iat": 1, "exp": 2});
    let mut header = Header::default();
    header.kid = Some("primary".into());

    let expired = encode(&header, &claims, &EncodingKey::from_secret(SECRET.as_bytes()))?;
    let resp = send(&app, request("POST", "/Categories", Some(&expired), Some(json!({"Name": "Nope"})))?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let claims = json!({"sub": "mallory", "given_name": "M", "family_name": "X", "role": ["Admin"], "iat": 1, "exp": 4_000_000_000u64});
    let forged = encode(&header, &claims, &EncodingKey::from_secret(b"some-other-secret-of-enough-length"))?;
    let resp = send(&app, request("POST", "/Categories", Some(&forged), Some(json!({"Name": "Nope"})))?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn rotated_keys_keep_old_tokens_valid() -> anyhow::Result<()> {
    let (app, state) = build_app().await?;
    let old = user_token(&state);

    state.auth.keys().rotate(service::auth::SigningKey::new("next", "n".repeat(32)));
    let new = user_token(&state);

    for token in [&old, &new] {
        let resp = send(&app, request("GET", "/Categories", Some(token), None)?).await?;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    assert!(state.auth.keys().drop_retired("primary"));
    let resp = send(&app, request("GET", "/Categories", Some(&old), None)?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
