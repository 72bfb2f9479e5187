use super::{password_digest, ConfigAuth};
use crate::backend::Auth;

const SECRET_DIGEST: &str = "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b";

#[test]
fn test_password_digest_is_sha256_hex() {
    assert_eq!(password_digest("secret"), SECRET_DIGEST);
}

#[test]
fn test_login_logout_cycle() {
    let auth = ConfigAuth::new("admin@example.com", SECRET_DIGEST);
    assert!(!auth.is_admin());

    assert!(auth.login("admin@example.com", "secret"));
    assert!(auth.is_admin());
    assert_eq!(auth.current_user().as_deref(), Some("admin@example.com"));

    assert!(auth.logout());
    assert!(!auth.is_admin());
    assert!(!auth.logout());
}

#[test]
fn test_wrong_credentials_rejected() {
    let auth = ConfigAuth::new("admin@example.com", SECRET_DIGEST);
    assert!(!auth.login("admin@example.com", "guess"));
    assert!(!auth.login("other@example.com", "secret"));
    assert!(!auth.is_admin());
}

#[test]
fn test_uppercase_digest_accepted() {
    let auth = ConfigAuth::new("admin@example.com", SECRET_DIGEST.to_uppercase());
    assert!(auth.login("admin@example.com", "secret"));
}

#[test]
fn test_empty_email_disables_login() {
    let auth = ConfigAuth::new("", password_digest(""));
    assert!(!auth.login("", ""));
    assert!(!auth.is_admin());
}
