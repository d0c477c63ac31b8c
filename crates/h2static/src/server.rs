use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum_server::Handle;
use tracing::{error, info};

use crate::APP_VERSION;
use crate::auth::Credentials;
use crate::config::StaticServerConfig;
use crate::error::ConfigError;
use crate::routes::build_app;
use crate::tls::rustls_config;

const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// A static HTTP(S) server.
#[derive(Debug, Clone)]
pub struct StaticServer {
    pub config: StaticServerConfig,
}

impl StaticServer {
    /// Validate the configuration and resolve the served directory to an
    /// absolute path. An empty directory means the current one.
    pub fn new(mut config: StaticServerConfig) -> Result<Self, ConfigError> {
        if config.dir.as_os_str().is_empty() {
            config.dir = PathBuf::from(".");
        }
        config.validate()?;
        config.dir = std::path::absolute(&config.dir).map_err(|source| ConfigError::Io {
            path: config.dir.clone(),
            source,
        })?;
        Ok(Self { config })
    }

    pub fn scheme(&self) -> &'static str {
        if self.config.is_https() { "https" } else { "http" }
    }

    /// Build the application router, loading credentials if configured.
    pub fn router(&self) -> Result<Router> {
        let credentials = self
            .config
            .password_file
            .as_deref()
            .map(Credentials::load)
            .transpose()
            .context("loading credentials")?;
        Ok(build_app(&self.config, credentials))
    }

    /// Serve until SIGINT or SIGTERM is received.
    pub async fn run(&self) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let app = self
            .router()?
            .into_make_service_with_connect_info::<SocketAddr>();

        info!(
            "Starting h2static {} {} server on {}, serving path {}",
            APP_VERSION,
            self.scheme().to_uppercase(),
            self.config.addr,
            self.config.dir.display()
        );

        let handle = Handle::new();
        tokio::spawn(shutdown_signal(handle.clone()));

        match (&self.config.tls_cert, &self.config.tls_key) {
            (Some(cert), Some(key)) => {
                let tls_config = rustls_config(cert, key, self.config.disable_h2)?;
                axum_server::bind_rustls(addr, tls_config)
                    .handle(handle)
                    .serve(app)
                    .await
                    .context("running server")?;
            }
            _ => {
                axum_server::bind(addr)
                    .handle(handle)
                    .serve(app)
                    .await
                    .context("running server")?;
            }
        }

        info!("Server shutdown");
        Ok(())
    }
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("failed to install signal handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_makes_dir_absolute() {
        let server = StaticServer::new(StaticServerConfig::default()).unwrap();
        assert!(server.config.dir.is_absolute());
    }

    #[test]
    fn test_new_empty_dir_is_current() {
        let config = StaticServerConfig {
            dir: PathBuf::new(),
            ..Default::default()
        };
        let server = StaticServer::new(config).unwrap();
        assert_eq!(server.config.dir, std::env::current_dir().unwrap());
    }

    #[test]
    fn test_new_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = StaticServerConfig {
            dir: temp_dir.path().join("missing"),
            ..Default::default()
        };
        assert!(StaticServer::new(config).is_err());
    }

    #[test]
    fn test_scheme() {
        let temp_dir = TempDir::new().unwrap();
        let cert = temp_dir.path().join("cert.pem");
        let key = temp_dir.path().join("key.pem");
        std::fs::write(&cert, "").unwrap();
        std::fs::write(&key, "").unwrap();

        let mut config = StaticServerConfig {
            dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        assert_eq!(StaticServer::new(config.clone()).unwrap().scheme(), "http");

        config.tls_cert = Some(cert);
        config.tls_key = Some(key);
        assert_eq!(StaticServer::new(config).unwrap().scheme(), "https");
    }

    #[test]
    fn test_router_missing_credentials() {
        let temp_dir = TempDir::new().unwrap();
        let server = StaticServer {
            config: StaticServerConfig {
                dir: temp_dir.path().to_path_buf(),
                password_file: Some(temp_dir.path().join("passwords")),
                ..Default::default()
            },
        };
        assert!(server.router().is_err());
    }
}
