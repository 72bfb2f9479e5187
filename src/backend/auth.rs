//! Admin login checked against credentials from the config file.
//!
//! The password is never stored in clear: the config holds the SHA-256 hex digest and a login
//! attempt is hashed the same way before comparing.

use super::Auth;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

#[must_use]
/// Lowercase hex SHA-256 digest of a password.
pub fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Login gate for one configured admin account.
pub struct ConfigAuth {
    email: String,
    password_sha256: String,
    session: Mutex<Option<String>>,
}

impl ConfigAuth {
    /// Gate accepting `email` with a password hashing to `password_sha256`.
    ///
    /// An empty email disables login altogether.
    pub fn new(email: impl Into<String>, password_sha256: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_sha256: password_sha256.into().to_ascii_lowercase(),
            session: Mutex::new(None),
        }
    }

    #[must_use]
    /// Email of the logged-in admin, if any.
    pub fn current_user(&self) -> Option<String> {
        self.session.lock().clone()
    }
}

impl Auth for ConfigAuth {
    fn login(&self, email: &str, password: &str) -> bool {
        if self.email.is_empty() {
            warn!("login attempted but no admin account is configured");
            return false;
        }
        let ok = email.trim() == self.email && password_digest(password) == self.password_sha256;
        if ok {
            *self.session.lock() = Some(self.email.clone());
            info!(email, "admin logged in");
        } else {
            warn!(email, "login rejected");
        }
        ok
    }

    fn logout(&self) -> bool {
        let ended = self.session.lock().take().is_some();
        if ended {
            info!("admin logged out");
        }
        ended
    }

    fn is_admin(&self) -> bool {
        self.session.lock().is_some()
    }
}

#[cfg(test)]
#[path = "../tests/auth.rs"]
mod tests;
