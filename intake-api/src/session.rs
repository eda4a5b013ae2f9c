//! Visitor sessions
//!
//! Wizard answers are buffered server-side in a `PendingStore`, keyed by a
//! random id. The visitor only holds that id in a cookie, signed with
//! HMAC-SHA256 so a forged or altered value never resolves to a record.
//!
//! Cookie format: `intake_session=<uuid>.<hex hmac of uuid>`.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use intake_core::{PendingSubmission, Timestamp};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use uuid::Uuid;

use crate::constants::SESSION_COOKIE_NAME;
use crate::error::{ApiError, ApiResult};

type HmacSha256 = Hmac<Sha256>;

/// Server-side id of a visitor's pending submission.
pub type SessionId = Uuid;

// ============================================================================
// TOKEN SIGNING
// ============================================================================

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct SessionSigner {
    secret: SecretString,
    max_age: Duration,
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("secret", &"[REDACTED]")
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl SessionSigner {
    pub fn new(secret: SecretString, max_age: Duration) -> Self {
        Self { secret, max_age }
    }

    fn mac(&self) -> ApiResult<HmacSha256> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| ApiError::internal_error("Failed to initialize HMAC"))
    }

    /// `<uuid>.<hex signature>`
    pub fn sign(&self, id: SessionId) -> ApiResult<String> {
        let mut mac = self.mac()?;
        let id = id.to_string();
        mac.update(id.as_bytes());
        Ok(format!("{}.{}", id, hex::encode(mac.finalize().into_bytes())))
    }

    /// Session id of a token, if its signature checks out.
    pub fn verify(&self, token: &str) -> Option<SessionId> {
        let (id, signature) = token.split_once('.')?;
        let expected = hex::decode(signature).ok()?;

        let mut mac = self.mac().ok()?;
        mac.update(id.as_bytes());
        mac.verify_slice(&expected).ok()?;

        Uuid::parse_str(id).ok()
    }

    /// Verified session id from the request's `Cookie` headers.
    pub fn session_from_headers(&self, headers: &HeaderMap) -> Option<SessionId> {
        let id = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| *name == SESSION_COOKIE_NAME)
            .find_map(|(_, token)| self.verify(token));

        if id.is_none() && headers.contains_key(header::COOKIE) {
            tracing::trace!("No valid session cookie on request");
        }
        id
    }

    /// `Set-Cookie` value carrying a signed token for `id`.
    pub fn issue_cookie(&self, id: SessionId) -> ApiResult<HeaderValue> {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE_NAME,
            self.sign(id)?,
            self.max_age.as_secs()
        );
        HeaderValue::from_str(&cookie)
            .map_err(|_| ApiError::internal_error("Invalid session cookie"))
    }

    /// `Set-Cookie` value that makes the browser drop the session cookie.
    pub fn expired_cookie() -> ApiResult<HeaderValue> {
        let cookie = format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            SESSION_COOKIE_NAME
        );
        HeaderValue::from_str(&cookie)
            .map_err(|_| ApiError::internal_error("Invalid session cookie"))
    }
}

// ============================================================================
// PENDING SUBMISSIONS
// ============================================================================

/// Result of `PendingStore::modify`.
#[derive(Debug)]
pub struct Modified<R> {
    pub value: R,
    /// An expired record that was replaced by a fresh one.
    pub displaced: Option<PendingSubmission>,
}

/// Concurrent map of pending wizard submissions.
///
/// A record older than the TTL (by last touch) is treated as absent by
/// readers even before the sweep removes it.
#[derive(Clone)]
pub struct PendingStore {
    entries: Arc<DashMap<SessionId, PendingSubmission>>,
    ttl: chrono::Duration,
}

impl std::fmt::Debug for PendingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingStore")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl PendingStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl: chrono::Duration::from_std(ttl)
                .unwrap_or_else(|_| chrono::Duration::days(36_500)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.entries.contains_key(id)
    }

    /// Snapshot of a live record; never creates or touches one.
    pub fn get_live(&self, id: &SessionId, now: Timestamp) -> Option<PendingSubmission> {
        self.entries
            .get(id)
            .filter(|entry| !entry.is_expired(now, self.ttl))
            .map(|entry| entry.value().clone())
    }

    /// Apply `f` to the record for `id`, creating it on first write.
    ///
    /// `f` runs while the map shard is locked and must not block.
    pub fn modify<R>(
        &self,
        id: SessionId,
        now: Timestamp,
        f: impl FnOnce(&mut PendingSubmission) -> R,
    ) -> Modified<R> {
        let mut entry = self
            .entries
            .entry(id)
            .or_insert_with(|| PendingSubmission::new(now));

        let displaced = if entry.is_expired(now, self.ttl) {
            Some(std::mem::replace(
                entry.value_mut(),
                PendingSubmission::new(now),
            ))
        } else {
            None
        };

        let value = f(entry.value_mut());
        Modified { value, displaced }
    }

    pub fn remove(&self, id: &SessionId) -> Option<PendingSubmission> {
        self.entries.remove(id).map(|(_, record)| record)
    }

    /// Remove every record idle past the TTL and return them.
    pub fn remove_expired(&self, now: Timestamp) -> Vec<PendingSubmission> {
        let expired: Vec<SessionId> = self
            .entries
            .iter()
            .filter(|entry| entry.is_expired(now, self.ttl))
            .map(|entry| *entry.key())
            .collect();

        // A record touched since the scan survives the re-check.
        expired
            .into_iter()
            .filter_map(|id| {
                self.entries
                    .remove_if(&id, |_, record| record.is_expired(now, self.ttl))
                    .map(|(_, record)| record)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use intake_core::PendingFile;

    fn signer() -> SessionSigner {
        SessionSigner::new(
            SecretString::from("test-session-secret".to_string()),
            Duration::from_secs(3600),
        )
    }

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_sign_and_verify() -> ApiResult<()> {
        let signer = signer();
        let id = Uuid::new_v4();
        let token = signer.sign(id)?;
        assert_eq!(signer.verify(&token), Some(id));
        Ok(())
    }

    #[test]
    fn test_tampered_tokens_are_rejected() -> ApiResult<()> {
        let signer = signer();
        let token = signer.sign(Uuid::new_v4())?;

        let (_, signature) = token.split_once('.').unwrap_or_default();
        let swapped = format!("{}.{}", Uuid::new_v4(), signature);
        assert_eq!(signer.verify(&swapped), None);

        let other = SessionSigner::new(
            SecretString::from("another-secret".to_string()),
            Duration::from_secs(3600),
        );
        assert_eq!(other.verify(&token), None);

        assert_eq!(signer.verify("not-a-token"), None);
        assert_eq!(signer.verify(&format!("{}.zz", Uuid::new_v4())), None);
        Ok(())
    }

    #[test]
    fn test_session_from_cookie_header() -> ApiResult<()> {
        let signer = signer();
        let id = Uuid::new_v4();

        let mut headers = HeaderMap::new();
        let cookie = format!("theme=dark; {}={}", SESSION_COOKIE_NAME, signer.sign(id)?);
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&cookie).map_err(|e| ApiError::internal_error(e.to_string()))?,
        );
        assert_eq!(signer.session_from_headers(&headers), Some(id));

        let mut forged = HeaderMap::new();
        forged.insert(
            header::COOKIE,
            HeaderValue::from_static("intake_session=00000000-0000-0000-0000-000000000000.abcd"),
        );
        assert_eq!(signer.session_from_headers(&forged), None);
        Ok(())
    }

    #[test]
    fn test_issued_cookie_attributes() -> ApiResult<()> {
        let cookie = signer().issue_cookie(Uuid::new_v4())?;
        let cookie = cookie.to_str().map_err(|e| ApiError::internal_error(e.to_string()))?;
        assert!(cookie.starts_with("intake_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=3600"));

        let expired = SessionSigner::expired_cookie()?;
        let expired = expired.to_str().map_err(|e| ApiError::internal_error(e.to_string()))?;
        assert!(expired.starts_with(&format!("{}=;", SESSION_COOKIE_NAME)));
        assert!(expired.contains("Max-Age=0"));
        Ok(())
    }

    #[test]
    fn test_get_live_never_creates() {
        let store = PendingStore::new(Duration::from_secs(60));
        let id = Uuid::new_v4();
        assert!(store.get_live(&id, Utc::now()).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_modify_creates_and_merges() {
        let store = PendingStore::new(Duration::from_secs(60));
        let id = Uuid::new_v4();
        let now = Utc::now();

        store.modify(id, now, |record| record.merge(vec![pair("phone", "1")], now));
        store.modify(id, now, |record| record.merge(vec![pair("email", "a@b.co")], now));

        let record = store.get_live(&id, now).unwrap_or_else(|| PendingSubmission::new(now));
        assert_eq!(record.fields.len(), 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_expired_record_is_invisible_and_displaced() {
        let store = PendingStore::new(Duration::from_secs(60));
        let id = Uuid::new_v4();
        let start = Utc::now();

        store.modify(id, start, |record| {
            record.merge(vec![pair("business_name", "Old")], start);
            record.replace_files(
                vec![PendingFile {
                    filename: "a.pdf".into(),
                    stored_path: "uploads/a.pdf".into(),
                }],
                start,
            );
        });

        let later = start + chrono::Duration::seconds(120);
        assert!(store.get_live(&id, later).is_none());

        let modified = store.modify(id, later, |record| record.fields.len());
        assert_eq!(modified.value, 0);
        let displaced = modified.displaced.map(|r| r.stored_paths().count());
        assert_eq!(displaced, Some(1));
    }

    #[test]
    fn test_remove_expired_keeps_fresh_records() {
        let store = PendingStore::new(Duration::from_secs(60));
        let start = Utc::now();
        let stale = Uuid::new_v4();
        let fresh = Uuid::new_v4();

        store.modify(stale, start, |_| ());
        store.modify(fresh, start + chrono::Duration::seconds(100), |_| ());

        let removed = store.remove_expired(start + chrono::Duration::seconds(130));
        assert_eq!(removed.len(), 1);
        assert!(!store.contains(&stale));
        assert!(store.contains(&fresh));
    }
}
