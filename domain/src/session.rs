//! Cookie-carried sessions and the authentication gate.
//!
//! A [`Session`] is serialized to JSON and sealed with AES-256-GCM before it
//! is handed to the browser, so the cookie is both confidential and
//! tamper-evident. Sessions are never mutated: logging in again issues a new
//! one, and logging out replaces the cookie with a removal cookie.

use crate::encryption::{EncryptionError, EncryptionKey};
use crate::error::Error;
use crate::Id;
use chrono::{DateTime, Duration, Utc};
use log::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Id,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Why a request could not be tied to a user.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NotAuthenticated {
    #[error("no session cookie present")]
    Missing,
    #[error("session cookie is malformed")]
    Malformed,
    #[error("session cookie failed verification")]
    Invalid,
    #[error("session has expired")]
    Expired,
}

impl From<EncryptionError> for NotAuthenticated {
    fn from(err: EncryptionError) -> Self {
        match err {
            EncryptionError::DecryptionFailed => NotAuthenticated::Invalid,
            _ => NotAuthenticated::Malformed,
        }
    }
}

/// Issues and verifies sealed session tokens.
#[derive(Debug, Clone)]
pub struct SessionStore {
    key: EncryptionKey,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(key: EncryptionKey, ttl: Duration) -> Self {
        Self { key, ttl }
    }

    /// Session lifetime from configured seconds. Zero, or a lifetime that
    /// would push an expiry past the representable date range, is a
    /// configuration error.
    pub fn ttl_from_seconds(seconds: u64) -> Result<Duration, Error> {
        i64::try_from(seconds)
            .ok()
            .filter(|seconds| *seconds > 0)
            .and_then(Duration::try_seconds)
            .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
            .ok_or_else(|| {
                warn!("Session expiry of {seconds} seconds is out of range");
                Error::config()
            })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A new session for `user_id`, valid for the configured lifetime.
    pub fn issue(&self, user_id: Id) -> Result<Session, Error> {
        let issued_at = Utc::now();
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(Error::config)?;

        Ok(Session {
            user_id,
            issued_at,
            expires_at,
        })
    }

    /// Seals `session` into a cookie-safe token.
    pub fn encode(&self, session: &Session) -> Result<String, Error> {
        let plaintext = serde_json::to_vec(session)?;
        Ok(self.key.seal(&plaintext)?)
    }

    /// Verifies integrity and expiry of `token`.
    pub fn decode(&self, token: &str) -> Result<Session, NotAuthenticated> {
        self.decode_at(token, Utc::now())
    }

    fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Session, NotAuthenticated> {
        let plaintext = self.key.open(token)?;
        let session: Session =
            serde_json::from_slice(&plaintext).map_err(|_| NotAuthenticated::Malformed)?;

        if session.is_expired_at(now) {
            return Err(NotAuthenticated::Expired);
        }

        Ok(session)
    }

    /// The authentication gate: resolves the session cookie value of a request
    /// into a verified session, or says why it cannot.
    pub fn resolve(&self, token: Option<&str>) -> Result<Session, NotAuthenticated> {
        let token = token
            .filter(|token| !token.is_empty())
            .ok_or(NotAuthenticated::Missing)?;

        self.decode(token).inspect_err(|reason| {
            debug!("Rejecting session cookie: {reason}");
        })
    }

    /// Shorthand for [`SessionStore::resolve`] when only the identity matters.
    pub fn resolve_identity(&self, token: Option<&str>) -> Result<Id, NotAuthenticated> {
        self.resolve(token).map(|session| session.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainErrorKind;

    fn store() -> SessionStore {
        SessionStore::new(EncryptionKey::generate(), Duration::hours(24))
    }

    #[test]
    fn issued_session_resolves_to_its_user() {
        let store = store();
        let user_id = Id::new_v4();
        let session = store.issue(user_id).unwrap();
        let token = store.encode(&session).unwrap();

        assert_eq!(store.resolve(Some(&token)), Ok(session));
        assert_eq!(store.resolve_identity(Some(&token)), Ok(user_id));
    }

    #[test]
    fn session_lifetime_follows_ttl() {
        let store = SessionStore::new(EncryptionKey::generate(), Duration::seconds(90));
        let session = store.issue(Id::new_v4()).unwrap();
        assert_eq!(session.expires_at - session.issued_at, Duration::seconds(90));
    }

    #[test]
    fn missing_or_empty_cookie_is_not_authenticated() {
        assert_eq!(store().resolve(None), Err(NotAuthenticated::Missing));
        assert_eq!(store().resolve(Some("")), Err(NotAuthenticated::Missing));
    }

    #[test]
    fn garbage_cookie_is_malformed() {
        assert_eq!(
            store().resolve(Some("%%%not-a-token%%%")),
            Err(NotAuthenticated::Malformed)
        );
    }

    #[test]
    fn cookie_from_another_key_is_invalid() {
        let issuer = store();
        let token = issuer.encode(&issuer.issue(Id::new_v4()).unwrap()).unwrap();
        assert_eq!(store().resolve(Some(&token)), Err(NotAuthenticated::Invalid));
    }

    #[test]
    fn expired_session_is_rejected() {
        let store = store();
        let session = store.issue(Id::new_v4()).unwrap();
        let token = store.encode(&session).unwrap();

        let later = session.expires_at + Duration::seconds(1);
        assert_eq!(store.decode_at(&token, later), Err(NotAuthenticated::Expired));
        assert_eq!(
            store.decode_at(&token, session.expires_at),
            Err(NotAuthenticated::Expired)
        );
    }

    #[test]
    fn lifetime_past_the_calendar_is_an_error_not_a_panic() {
        let store = SessionStore::new(
            EncryptionKey::generate(),
            Duration::seconds(1_000_000_000_000_000),
        );

        let error = store.issue(Id::new_v4()).unwrap_err();
        assert_eq!(error.error_kind, DomainErrorKind::Config);
    }

    #[test]
    fn configured_lifetime_is_bounded() {
        assert_eq!(
            SessionStore::ttl_from_seconds(86_400).unwrap(),
            Duration::hours(24)
        );

        for seconds in [0, 1_000_000_000_000_000, 10_000_000_000_000_000, u64::MAX] {
            assert_eq!(
                SessionStore::ttl_from_seconds(seconds).unwrap_err().error_kind,
                DomainErrorKind::Config,
                "{seconds}"
            );
        }
    }

    #[test]
    fn sealed_non_session_payload_is_malformed() {
        let key = EncryptionKey::generate();
        let store = SessionStore::new(key.clone(), Duration::hours(1));
        let token = key.seal(br#"{"user":"nope"}"#).unwrap();
        assert_eq!(store.resolve(Some(&token)), Err(NotAuthenticated::Malformed));
    }
}
