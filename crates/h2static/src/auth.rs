//! Basic-Auth support.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Basic};
use sha2::{Digest, Sha512};
use tracing::{debug, warn};

use crate::APP_NAME;
use crate::error::{CredentialsError, http_error};

/// Usernames mapped to the hex SHA-512 digest of their password.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    users: Arc<HashMap<String, String>>,
}

impl Credentials {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self {
            users: Arc::new(users),
        }
    }

    /// Load credentials from a file with one `username:sha512hex` pair per
    /// line.
    ///
    /// Blank lines and lines starting with `#` are ignored. Lines that don't
    /// have exactly two fields are logged and skipped.
    pub fn load(path: &Path) -> Result<Self, CredentialsError> {
        let content = fs::read_to_string(path).map_err(|source| CredentialsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut users = HashMap::new();
        for (index, line) in content.lines().enumerate() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split(':').collect();
            match fields.as_slice() {
                [user, hash] => {
                    users.insert(user.to_string(), hash.to_string());
                }
                _ => {
                    let abs_path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
                    warn!(
                        "Skipping invalid credentials at {}:{}",
                        abs_path.display(),
                        index + 1
                    );
                }
            }
        }
        Ok(Self::new(users))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Check a username and clear-text password.
    ///
    /// Unknown users and wrong passwords are not distinguished.
    pub fn verify(&self, user: &str, password: &str) -> bool {
        if user.is_empty() {
            return false;
        }
        match self.users.get(user) {
            Some(hash) => *hash == hash_password(password),
            None => false,
        }
    }
}

/// Hex-encoded SHA-512 digest of a password.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha512::digest(password.as_bytes()))
}

/// Reject requests without valid Basic-Auth credentials.
pub async fn basic_auth(
    State(credentials): State<Credentials>,
    req: Request,
    next: Next,
) -> Response {
    let authorized = req
        .headers()
        .typed_get::<Authorization<Basic>>()
        .is_some_and(|auth| credentials.verify(auth.username(), auth.password()));

    if authorized {
        return next.run(req).await;
    }

    debug!("Unauthorized request for {}", req.uri());
    auth_required_response()
}

fn auth_required_response() -> Response {
    let mut response = http_error(StatusCode::UNAUTHORIZED);
    let challenge = format!(r#"Basic realm="{APP_NAME}", charset="UTF-8""#);
    if let Ok(value) = HeaderValue::from_str(&challenge) {
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, value);
    }
    response
}
