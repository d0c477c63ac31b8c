//! Test utilities and common setup.
#![allow(dead_code)]

use std::fs;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response},
};
use h2static::StaticServerConfig;
use h2static::auth::Credentials;
use h2static::routes::build_app;
use tempfile::TempDir;
use tower::ServiceExt;

/// Password hash for `bar`.
pub const BAR_HASH: &str = "d82c4eb5261cb9c8aa9855edd67d1bd10482f41529858d925094d173fa662aa91ff39bc5b188615273484021dfb16fd8284cf684ccf0fc795be3aa2fc1e6c181";

/// Create a served directory with `foo` (9 bytes), `bar` (6 bytes) and an
/// empty `baz/` directory.
pub fn test_dir() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("foo"), "foofoofoo").unwrap();
    fs::write(temp_dir.path().join("bar"), "barbar").unwrap();
    fs::create_dir(temp_dir.path().join("baz")).unwrap();
    temp_dir
}

pub fn test_config(temp_dir: &TempDir) -> StaticServerConfig {
    StaticServerConfig {
        dir: temp_dir.path().to_path_buf(),
        ..Default::default()
    }
}

/// Build the app for a config, with credentials for user `foo` (password
/// `bar`) if `with_auth` is set.
pub fn test_app(config: &StaticServerConfig, with_auth: bool) -> Router {
    let credentials = with_auth.then(|| {
        Credentials::new([("foo".to_string(), BAR_HASH.to_string())].into())
    });
    build_app(config, credentials)
}

pub async fn request(
    app: Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    request(app, Method::GET, uri, &[]).await
}

pub async fn body_string(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}
