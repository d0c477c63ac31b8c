use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use mime_guess::mime::{self, Mime};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

use crate::AppState;
use crate::entry::Entry;
use crate::error::ServerError;
use crate::filesystem::clean_path;
use crate::listing::{DirInfo, ListingQuery, ListingSort};

const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Bytes read from a file to guess its type when the name gives no hint.
const SNIFF_LEN: u64 = 512;

/// What a request path resolved to.
enum Target {
    File(PathBuf),
    Redirect(String),
    Listing,
}

/// Serve a file, an index file or a listing for a request path.
pub async fn serve_path(State(state): State<AppState>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    match resolve(&state, &parts).await {
        Ok(Target::File(path)) => serve_file(path, Request::from_parts(parts, body)).await,
        Ok(Target::Redirect(location)) => redirect(&location),
        Ok(Target::Listing) => match render_listing(&state, &parts).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        },
        Err(err) => err.into_response(),
    }
}

async fn resolve(state: &AppState, req: &Parts) -> Result<Target, ServerError> {
    if req.method != Method::GET && req.method != Method::HEAD {
        return Err(ServerError::MethodNotAllowed);
    }

    let raw_path = req.uri.path();
    let url_path = decode_path(raw_path)?;
    let base_path = clean_path(&url_path);

    let entry = open(state, base_path.clone()).await?;
    if !entry.is_dir() {
        return Ok(Target::File(entry.abs_path().to_path_buf()));
    }

    if !url_path.ends_with('/') {
        let mut location = format!("{}{}/", state.path_prefix, ensure_leading_slash(raw_path));
        if let Some(query) = req.uri.query() {
            location.push('?');
            location.push_str(query);
        }
        debug!("Redirecting directory {} to {}", base_path, location);
        return Ok(Target::Redirect(location));
    }

    if let Some(index) = find_index(state, &base_path).await? {
        debug!("Serving index file {}", index.display());
        return Ok(Target::File(index));
    }

    if !state.directory_index {
        debug!("Directory listing disabled for {}", base_path);
        return Err(ServerError::Forbidden);
    }
    Ok(Target::Listing)
}

async fn render_listing(state: &AppState, req: &Parts) -> Result<Response, ServerError> {
    let url_path = decode_path(req.uri.path())?;
    let base_path = clean_path(&url_path);
    let pairs = Query::<Vec<(String, String)>>::try_from_uri(&req.uri)
        .map(|Query(pairs)| pairs)
        .unwrap_or_default();
    let sort = ListingSort::from(&ListingQuery::from_pairs(pairs));

    let filesystem = state.filesystem.clone();
    let path = base_path.clone();
    let dir = tokio::task::spawn_blocking(move || {
        let entry = filesystem.open(&path)?;
        DirInfo::build(&path, &entry, sort)
    })
    .await?
    .map_err(|err| ServerError::Internal(err.to_string()))?;

    if accepts_json(&req.headers) {
        let json = dir
            .to_json()
            .map_err(|err| ServerError::Internal(err.to_string()))?;
        Ok(([(header::CONTENT_TYPE, "application/json")], json).into_response())
    } else {
        let html = state.template.render(&dir, sort);
        Ok(([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html).into_response())
    }
}

async fn open(state: &AppState, path: String) -> Result<Entry, ServerError> {
    let filesystem = state.filesystem.clone();
    let entry = tokio::task::spawn_blocking(move || filesystem.open(&path)).await??;
    Ok(entry)
}

async fn find_index(state: &AppState, dir_path: &str) -> Result<Option<PathBuf>, ServerError> {
    let filesystem = state.filesystem.clone();
    let dir_path = dir_path.trim_end_matches('/').to_string();
    let index = tokio::task::spawn_blocking(move || {
        INDEX_FILES.iter().find_map(|name| {
            filesystem
                .open_file(&format!("{dir_path}/{name}"))
                .ok()
                .map(|entry| entry.abs_path().to_path_buf())
        })
    })
    .await?;
    Ok(index)
}

async fn serve_file(path: PathBuf, req: Request) -> Response {
    let mime = match content_type(path.clone()).await {
        Ok(mime) => mime,
        Err(err) => return err.into_response(),
    };
    match ServeFile::new_with_mime(path, &mime).oneshot(req).await {
        Ok(response) => response.map(Body::new),
        Err(err) => match err {},
    }
}

/// Content type for a file, from its extension or else from its first bytes.
async fn content_type(path: PathBuf) -> Result<Mime, ServerError> {
    let guessed = match mime_guess::from_path(&path).first() {
        Some(guessed) => guessed,
        None => tokio::task::spawn_blocking(move || sniff(&path)).await?,
    };
    Ok(with_utf8_charset(guessed))
}

fn sniff(path: &Path) -> Mime {
    match read_head(path) {
        Ok(head) => sniff_bytes(&head),
        Err(err) => {
            debug!("Could not read {} to detect its type: {}", path.display(), err);
            mime::APPLICATION_OCTET_STREAM
        }
    }
}

fn read_head(path: &Path) -> io::Result<Vec<u8>> {
    let mut head = Vec::new();
    File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;
    Ok(head)
}

fn sniff_bytes(head: &[u8]) -> Mime {
    if head.iter().any(|&b| is_binary_byte(b)) {
        return mime::APPLICATION_OCTET_STREAM;
    }
    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    let text = &head[start..];
    let is_html = ["<!doctype html", "<html"].iter().any(|tag| {
        text.len() >= tag.len() && text[..tag.len()].eq_ignore_ascii_case(tag.as_bytes())
    });
    if is_html {
        mime::TEXT_HTML_UTF_8
    } else {
        mime::TEXT_PLAIN_UTF_8
    }
}

/// Control bytes that never show up in text files.
fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

fn with_utf8_charset(essence: Mime) -> Mime {
    if essence.type_() != mime::TEXT || essence.get_param(mime::CHARSET).is_some() {
        return essence;
    }
    format!("{essence}; charset=utf-8")
        .parse()
        .unwrap_or(essence)
}

fn redirect(location: &str) -> Response {
    match HeaderValue::try_from(location) {
        Ok(value) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response(),
        Err(err) => ServerError::Internal(err.to_string()).into_response(),
    }
}

/// Percent-decode a request path, making sure it starts with `/`.
fn decode_path(raw_path: &str) -> Result<String, ServerError> {
    let decoded = urlencoding::decode(raw_path).map_err(|_| ServerError::NotFound)?;
    Ok(ensure_leading_slash(&decoded).into_owned())
}

fn ensure_leading_slash(path: &str) -> std::borrow::Cow<'_, str> {
    if path.starts_with('/') {
        path.into()
    } else {
        format!("/{path}").into()
    }
}

fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("application/json"))
}
