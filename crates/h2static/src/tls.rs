//! TLS configuration for HTTPS.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use axum_server::tls_rustls::RustlsConfig;
use rustls::ServerConfig;

/// ALPN protocols advertised to clients.
pub fn alpn_protocols(disable_h2: bool) -> Vec<Vec<u8>> {
    if disable_h2 {
        vec![b"http/1.1".to_vec()]
    } else {
        vec![b"h2".to_vec(), b"http/1.1".to_vec()]
    }
}

/// Build a rustls server config from PEM certificate chain and key files.
pub fn load_server_config(
    cert_path: &Path,
    key_path: &Path,
    disable_h2: bool,
) -> Result<ServerConfig> {
    let cert_file = File::open(cert_path)
        .with_context(|| format!("opening certificate {}", cert_path.display()))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(cert_file))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("reading certificate {}", cert_path.display()))?;
    if certs.is_empty() {
        return Err(anyhow!("no certificate found in {}", cert_path.display()));
    }

    let key_file =
        File::open(key_path).with_context(|| format!("opening key {}", key_path.display()))?;
    let key = rustls_pemfile::private_key(&mut BufReader::new(key_file))
        .with_context(|| format!("reading key {}", key_path.display()))?
        .ok_or_else(|| anyhow!("no private key found in {}", key_path.display()))?;

    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("invalid certificate or key")?;
    config.alpn_protocols = alpn_protocols(disable_h2);
    Ok(config)
}

/// TLS config for `axum_server::bind_rustls`.
pub fn rustls_config(cert_path: &Path, key_path: &Path, disable_h2: bool) -> Result<RustlsConfig> {
    let config = load_server_config(cert_path, key_path, disable_h2)?;
    Ok(RustlsConfig::from_config(Arc::new(config)))
}
