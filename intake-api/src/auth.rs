//! Admin Authentication
//!
//! The admin pages are protected by HTTP Basic authentication against one
//! configured username/password pair. There is no lockout and no rate limit.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::{ExposeSecret, SecretString};

use crate::constants::DEFAULT_ADMIN_PASS;
use crate::error::{ApiError, ApiResult};

/// Configured admin username and password.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password: SecretString,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn uses_default_password(&self) -> bool {
        self.password.expose_secret() == DEFAULT_ADMIN_PASS
    }

    /// Plain equality on both parts.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password.expose_secret() == password
    }

    /// Check an `Authorization` header value against these credentials.
    pub fn authenticate(&self, auth_header: Option<&str>) -> ApiResult<()> {
        let header = auth_header
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
        let (username, password) = parse_basic_auth(header)
            .ok_or_else(|| ApiError::unauthorized("Malformed Basic credentials"))?;

        if self.matches(&username, &password) {
            Ok(())
        } else {
            tracing::warn!(username = %username, "Rejected admin credentials");
            Err(ApiError::unauthorized("Invalid credentials"))
        }
    }
}

/// Decode `Basic <base64(user:pass)>` into its two parts.
///
/// The password may itself contain colons; only the first one splits.
pub fn parse_basic_auth(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Build a `Basic` header value; used by tests and tooling.
pub fn basic_auth_header(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_basic_auth() {
        let header = basic_auth_header("admin", "pa:ss");
        assert_eq!(
            parse_basic_auth(&header),
            Some(("admin".to_string(), "pa:ss".to_string()))
        );
        assert_eq!(parse_basic_auth("Bearer abc"), None);
        assert_eq!(parse_basic_auth("Basic !!!"), None);
        assert_eq!(parse_basic_auth("Basic"), None);
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let header = basic_auth_header("admin", "x").replacen("Basic", "basic", 1);
        assert!(parse_basic_auth(&header).is_some());
    }

    #[test]
    fn test_authenticate() {
        let creds = AdminCredentials::new("admin", "secret");

        assert!(creds
            .authenticate(Some(&basic_auth_header("admin", "secret")))
            .is_ok());

        let wrong = creds.authenticate(Some(&basic_auth_header("admin", "nope")));
        assert!(matches!(wrong, Err(e) if e.code == ErrorCode::Unauthorized));

        let missing = creds.authenticate(None);
        assert!(matches!(missing, Err(e) if e.code == ErrorCode::Unauthorized));
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = AdminCredentials::new("admin", "hunter2");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
