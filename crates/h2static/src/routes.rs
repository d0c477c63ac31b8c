use std::path::Path;

use axum::{
    Router,
    http::{HeaderValue, StatusCode, header},
    middleware,
    response::Response,
    routing::{get, get_service},
};
use tower_http::services::ServeFile;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::assets::{self, ASSETS_CACHE_CONTROL, ASSETS_PREFIX, CSS_ASSET};
use crate::auth::{self, Credentials};
use crate::error::http_error;
use crate::handlers;
use crate::middleware::access_log;
use crate::{AppState, SERVER_IDENTIFIER, StaticServerConfig};

/// Create file server routes
///
/// Builtin assets are served under [`ASSETS_PREFIX`] and cached by clients
/// for a day. Every other path goes to the file handler. If `css` is set,
/// it replaces the builtin stylesheet.
pub fn file_routes(state: AppState, css: Option<&Path>) -> Router {
    let assets_route = get(assets::serve_asset).fallback(method_not_allowed);
    let mut router = Router::new()
        .route(&format!("{ASSETS_PREFIX}/{{name}}"), assets_route)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(ASSETS_CACHE_CONTROL),
        ));

    if let Some(css) = css {
        let css_route = get_service(ServeFile::new(css)).fallback(method_not_allowed);
        router = router.route(CSS_ASSET, css_route);
    }

    router.fallback(handlers::serve_path).with_state(state)
}

/// Build the full application for a server configuration.
///
/// Layers are applied inside out: path prefix, Basic-Auth (if credentials
/// are given), access log (if enabled), `Server` header, tracing.
pub fn build_app(config: &StaticServerConfig, credentials: Option<Credentials>) -> Router {
    let state = AppState::from_config(config);
    let prefix = state.path_prefix.clone();

    let mut app = file_routes(state, config.css.as_deref());
    if !prefix.is_empty() {
        app = Router::new().nest(&prefix, app).fallback(not_found);
    }

    if let Some(credentials) = credentials {
        app = app.layer(middleware::from_fn_with_state(credentials, auth::basic_auth));
    }

    if config.log {
        app = app.layer(middleware::from_fn(access_log));
    }

    app.layer(SetResponseHeaderLayer::overriding(
        header::SERVER,
        HeaderValue::from_static(SERVER_IDENTIFIER),
    ))
    .layer(TraceLayer::new_for_http())
}

async fn not_found() -> Response {
    http_error(StatusCode::NOT_FOUND)
}

async fn method_not_allowed() -> Response {
    http_error(StatusCode::METHOD_NOT_ALLOWED)
}
