use std::io;
use std::path::PathBuf;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Outcome of a failed lookup in the guarded filesystem.
#[derive(Error, Debug)]
pub enum FsError {
    /// Missing, hidden by the dotfile policy, unreadable, or a directory
    /// where a file was required.
    #[error("file not found")]
    NotFound,

    /// The entry resolves outside the root and escapes are not allowed.
    #[error("path resolves outside root directory")]
    PermissionDenied,

    #[error("IO error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for FsError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            // Unreadable entries are reported like missing ones so their
            // existence does not leak.
            io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::NotADirectory => FsError::NotFound,
            _ => FsError::Io(err),
        }
    }
}

/// Errors surfaced to HTTP clients by the file handler.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<FsError> for ServerError {
    fn from(err: FsError) -> Self {
        match err {
            FsError::NotFound => ServerError::NotFound,
            FsError::PermissionDenied => ServerError::Forbidden,
            FsError::Io(err) => ServerError::Internal(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Forbidden => StatusCode::FORBIDDEN,
            ServerError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ServerError::Internal(detail) => {
                error!("Error: {}", detail);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        http_error(status)
    }
}

/// Build a plain-text error response with a fixed `"<code> <reason>"` body.
pub fn http_error(status: StatusCode) -> Response {
    let body = format!(
        "{} {}\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    );
    (
        status,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        body,
    )
        .into_response()
}

/// Fatal errors raised while validating configuration at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("is a directory: {}", .0.display())]
    IsADirectory(PathBuf),

    #[error("invalid listen address: {0}")]
    InvalidAddr(String),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors raised while loading the Basic-Auth credentials file.
#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("failed to read credentials file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
