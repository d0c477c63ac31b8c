use std::fs;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::filesystem::GuardedFilesystem;

/// Static server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticServerConfig {
    /// Address and port to listen on; a bare `:port` listens on all interfaces
    pub addr: String,

    /// Directory to serve
    pub dir: PathBuf,

    /// Follow symlinks resolving outside the served directory
    pub allow_outside_symlinks: bool,

    /// Stylesheet served instead of the builtin one
    pub css: Option<PathBuf>,

    /// Only negotiate HTTP/1.1 over TLS
    pub disable_h2: bool,

    /// Return 403 instead of listing directories without an index file
    pub disable_index: bool,

    /// Don't look up `.html`/`.htm` files for paths without suffix
    pub disable_lookup_with_suffix: bool,

    /// Log each request
    pub log: bool,

    /// File with `user:sha512hex` credentials enabling Basic-Auth
    pub password_file: Option<PathBuf>,

    /// Prefix all served paths are expected to start with
    pub request_path_prefix: String,

    /// Serve and list dotfiles
    pub show_dot_files: bool,

    /// Certificate file for TLS connections
    pub tls_cert: Option<PathBuf>,

    /// Key file for TLS connections
    pub tls_key: Option<PathBuf>,
}

impl Default for StaticServerConfig {
    fn default() -> Self {
        Self {
            addr: ":8080".to_string(),
            dir: PathBuf::from("."),
            allow_outside_symlinks: false,
            css: None,
            disable_h2: false,
            disable_index: false,
            disable_lookup_with_suffix: false,
            log: false,
            password_file: None,
            request_path_prefix: String::new(),
            show_dot_files: false,
            tls_cert: None,
            tls_key: None,
        }
    }
}

impl StaticServerConfig {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Whether both TLS certificate and key are configured.
    pub fn is_https(&self) -> bool {
        self.tls_cert.is_some() && self.tls_key.is_some()
    }

    /// Resolve the listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = if self.addr.starts_with(':') {
            format!("0.0.0.0{}", self.addr)
        } else {
            self.addr.clone()
        };
        addr.to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ConfigError::InvalidAddr(self.addr.clone()))
    }

    /// Check that configured paths exist and have the right type.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_file(&self.dir, true)?;
        if let Some(css) = &self.css {
            check_file(css, false)?;
        }
        if let (Some(cert), Some(key)) = (&self.tls_cert, &self.tls_key) {
            check_file(cert, false)?;
            check_file(key, false)?;
        }
        if let Some(password_file) = &self.password_file {
            check_file(password_file, false)?;
        }
        Ok(())
    }

    /// Request path prefix with a leading slash and no trailing one.
    ///
    /// Empty if no prefix is configured.
    pub fn path_prefix(&self) -> String {
        let prefix = self.request_path_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            String::new()
        } else if prefix.starts_with('/') {
            prefix.to_string()
        } else {
            format!("/{prefix}")
        }
    }

    /// Filesystem view of the served directory.
    pub fn filesystem(&self) -> GuardedFilesystem {
        GuardedFilesystem {
            root: self.dir.clone(),
            resolve_html: !self.disable_lookup_with_suffix,
            hide_dot_files: !self.show_dot_files,
            allow_outside_symlinks: self.allow_outside_symlinks,
        }
    }
}

fn check_file(path: &Path, as_dir: bool) -> Result<(), ConfigError> {
    let metadata = fs::metadata(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match (as_dir, metadata.is_dir()) {
        (true, false) => Err(ConfigError::NotADirectory(path.to_path_buf())),
        (false, true) => Err(ConfigError::IsADirectory(path.to_path_buf())),
        _ => Ok(()),
    }
}
