//! Builtin assets used by the directory listing page.

use axum::{
    extract::Path,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::error::http_error;

/// URL path under which builtin assets are served.
pub const ASSETS_PREFIX: &str = "/.h2static-assets";

/// Path of the stylesheet asset, relative to the application root.
pub const CSS_ASSET: &str = "/.h2static-assets/style.css";

/// Cache-Control value for builtin assets (24 hours).
pub const ASSETS_CACHE_CONTROL: &str = "public, max-age=86400";

const STYLE_CSS: &str = include_str!("../assets/style.css");
const LOGO_SVG: &str = include_str!("../assets/logo.svg");

/// Content type and body of a builtin asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub content_type: &'static str,
    pub content: &'static str,
}

/// Look up a builtin asset by exact name.
pub fn lookup(name: &str) -> Option<Asset> {
    match name {
        "style.css" => Some(Asset {
            content_type: "text/css; charset=utf-8",
            content: STYLE_CSS,
        }),
        "logo.svg" => Some(Asset {
            content_type: "image/svg+xml",
            content: LOGO_SVG,
        }),
        _ => None,
    }
}

/// Serve a builtin asset.
pub async fn serve_asset(Path(name): Path<String>) -> Response {
    match lookup(&name) {
        Some(asset) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, asset.content_type)],
            asset.content,
        )
            .into_response(),
        None => http_error(StatusCode::NOT_FOUND),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_assets() {
        let css = lookup("style.css").unwrap();
        assert_eq!(css.content_type, "text/css; charset=utf-8");
        assert!(css.content.contains(".type-dir-up"));

        let logo = lookup("logo.svg").unwrap();
        assert_eq!(logo.content_type, "image/svg+xml");
        assert!(logo.content.contains("<svg"));
    }

    #[test]
    fn test_lookup_requires_exact_name() {
        assert!(lookup("style").is_none());
        assert!(lookup("sub/style.css").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_css_asset_is_under_prefix() {
        assert!(CSS_ASSET.starts_with(ASSETS_PREFIX));
    }

    #[tokio::test]
    async fn test_serve_unknown_asset() {
        let response = serve_asset(Path("missing.js".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
