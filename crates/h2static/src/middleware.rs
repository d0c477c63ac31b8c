//! Request logging middleware.

use std::net::SocketAddr;

use axum::{
    body::HttpBody,
    extract::{ConnectInfo, Request},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::info;

/// Log a line for each request once the response is produced.
///
/// The line has the format
/// `<proto> <method> <url> <req-length> <status> <resp-length> <remote> "<user-agent>"`.
pub async fn access_log(req: Request, next: Next) -> Response {
    let version = req.version();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let content_length = request_length(&req);
    let remote = remote_addr(
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr),
        req.headers(),
    );
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let response = next.run(req).await;

    let length = response
        .body()
        .size_hint()
        .exact()
        .filter(|&n| n > 0)
        .or_else(|| header_length(response.headers()))
        .unwrap_or(0);

    info!(
        "{:?} {} {} {} {} {} {} \"{}\"",
        version,
        method,
        uri,
        content_length,
        response.status().as_u16(),
        length,
        remote,
        user_agent
    );
    response
}

fn request_length(req: &Request) -> i64 {
    header_length(req.headers())
        .or_else(|| req.body().size_hint().exact())
        .and_then(|n| i64::try_from(n).ok())
        .unwrap_or(-1)
}

fn header_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Remote peer address, with the last `X-Forwarded-For` hop in brackets.
pub fn remote_addr(peer: Option<SocketAddr>, headers: &HeaderMap) -> String {
    let addr = peer.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string());
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());
    match forwarded.and_then(|v| v.rsplit(',').next()) {
        Some(hop) => format!("{} [{}]", addr, hop.trim()),
        None => addr,
    }
}
