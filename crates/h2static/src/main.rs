use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use h2static::{StaticServer, StaticServerConfig};

#[derive(Parser, Debug)]
#[command(name = "h2static")]
#[command(about = "Tiny static web server with TLS and HTTP/2 support")]
#[command(version)]
struct Cli {
    /// Address and port to listen on [default: :8080]
    #[arg(long, env = "H2STATIC_ADDR")]
    addr: Option<String>,

    /// Directory to serve [default: .]
    #[arg(long, env = "H2STATIC_DIR")]
    dir: Option<PathBuf>,

    /// Allow symlinks pointing outside the served directory
    #[arg(long, env = "H2STATIC_ALLOW_OUTSIDE_SYMLINKS")]
    allow_outside_symlinks: bool,

    /// File with `user:sha512hex` credentials, enables Basic-Auth
    #[arg(long, env = "H2STATIC_BASIC_AUTH")]
    basic_auth: Option<PathBuf>,

    /// Stylesheet to use instead of the builtin one
    #[arg(long, env = "H2STATIC_CSS")]
    css: Option<PathBuf>,

    /// Disable HTTP/2 support
    #[arg(long, env = "H2STATIC_DISABLE_H2")]
    disable_h2: bool,

    /// Disable directory listing
    #[arg(long, env = "H2STATIC_DISABLE_INDEX")]
    disable_index: bool,

    /// Disable matching files with .htm(l) suffix for paths without suffix
    #[arg(long, env = "H2STATIC_DISABLE_LOOKUP_WITH_SUFFIX")]
    disable_lookup_with_suffix: bool,

    /// Log requests
    #[arg(long, env = "H2STATIC_LOG")]
    log: bool,

    /// Prefix to strip from request paths
    #[arg(long, env = "H2STATIC_REQUEST_PATH_PREFIX")]
    request_path_prefix: Option<String>,

    /// Show and serve dotfiles
    #[arg(long, env = "H2STATIC_SHOW_DOTFILES")]
    show_dotfiles: bool,

    /// Certificate file for TLS connections
    #[arg(long, env = "H2STATIC_TLS_CERT")]
    tls_cert: Option<PathBuf>,

    /// Key file for TLS connections
    #[arg(long, env = "H2STATIC_TLS_KEY")]
    tls_key: Option<PathBuf>,

    /// Config file path (optional)
    #[arg(short, long, env = "H2STATIC_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, env = "H2STATIC_VERBOSE")]
    verbose: bool,
}

impl Cli {
    /// Apply command line flags on top of a config.
    fn apply(self, mut config: StaticServerConfig) -> StaticServerConfig {
        if let Some(addr) = self.addr {
            config.addr = addr;
        }
        if let Some(dir) = self.dir {
            config.dir = dir;
        }
        if let Some(password_file) = self.basic_auth {
            config.password_file = Some(password_file);
        }
        if let Some(css) = self.css {
            config.css = Some(css);
        }
        if let Some(prefix) = self.request_path_prefix {
            config.request_path_prefix = prefix;
        }
        if let Some(cert) = self.tls_cert {
            config.tls_cert = Some(cert);
        }
        if let Some(key) = self.tls_key {
            config.tls_key = Some(key);
        }
        config.allow_outside_symlinks |= self.allow_outside_symlinks;
        config.disable_h2 |= self.disable_h2;
        config.disable_index |= self.disable_index;
        config.disable_lookup_with_suffix |= self.disable_lookup_with_suffix;
        config.log |= self.log;
        config.show_dot_files |= self.show_dotfiles;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "h2static=debug,tower_http=debug"
    } else {
        "h2static=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config from file if provided, otherwise use defaults
    let config = match &cli.config {
        Some(path) => StaticServerConfig::from_file(path)?,
        None => StaticServerConfig::default(),
    };

    let server = StaticServer::new(cli.apply(config))?;
    server.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["h2static"]);
        let config = cli.apply(StaticServerConfig::default());
        assert_eq!(config, StaticServerConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "h2static",
            "--addr",
            "localhost:9090",
            "--dir",
            "/srv",
            "--basic-auth",
            "/etc/h2static/passwords",
            "--request-path-prefix",
            "/static",
            "--disable-index",
            "--show-dotfiles",
            "--log",
        ]);
        let config = cli.apply(StaticServerConfig {
            disable_h2: true,
            ..Default::default()
        });

        assert_eq!(config.addr, "localhost:9090");
        assert_eq!(config.dir, PathBuf::from("/srv"));
        assert_eq!(
            config.password_file,
            Some(PathBuf::from("/etc/h2static/passwords"))
        );
        assert_eq!(config.request_path_prefix, "/static");
        assert!(config.disable_index);
        assert!(config.show_dot_files);
        assert!(config.log);
        assert!(config.disable_h2);
        assert!(!config.disable_lookup_with_suffix);
    }

    #[test]
    fn test_cli_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
