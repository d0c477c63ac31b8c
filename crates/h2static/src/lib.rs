//! Tiny static web server with TLS and HTTP/2 support.
//!
//! This crate provides the filesystem guard, directory listing, handlers and
//! routes behind the `h2static` binary. The router can also be embedded in
//! another application.

pub mod assets;
pub mod auth;
pub mod config;
pub mod entry;
pub mod error;
pub mod filesystem;
pub mod handlers;
pub mod listing;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod template;
pub mod tls;

pub use config::StaticServerConfig;
pub use error::{ConfigError, FsError, ServerError};
pub use filesystem::GuardedFilesystem;
pub use server::StaticServer;

use template::ListingTemplate;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Value of the `Server` header, `<name>/<version>`.
pub const SERVER_IDENTIFIER: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Filesystem files are served from
    pub filesystem: GuardedFilesystem,
    /// List directories without an index file
    pub directory_index: bool,
    /// Prefix prepended to redirect locations
    pub path_prefix: String,
    /// Directory listing page
    pub template: ListingTemplate,
}

impl AppState {
    pub fn with_options(
        filesystem: GuardedFilesystem,
        directory_index: bool,
        path_prefix: String,
    ) -> Self {
        Self {
            filesystem,
            directory_index,
            template: ListingTemplate::new(path_prefix.clone()),
            path_prefix,
        }
    }

    /// Create the state for a server configuration.
    pub fn from_config(config: &StaticServerConfig) -> Self {
        Self::with_options(
            config.filesystem(),
            !config.disable_index,
            config.path_prefix(),
        )
    }
}
