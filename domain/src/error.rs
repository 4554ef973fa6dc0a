//! Error types for the `domain` layer.
use crate::encryption::EncryptionError;
use crate::session::NotAuthenticated;
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer.
/// The `source` field is used to hold the original error that caused
/// the domain error. Ultimately the various `error_kind`s are used
/// by `web` to return appropriate HTTP status codes and messages to the client.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Entity(EntityErrorKind),
    Config,
    Other(String),
}

/// Enum representing the various kinds of errors about users, sessions and records.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    NotFound,
    Invalid,
    Unauthenticated,
    Conflict,
}

impl Error {
    pub fn entity(kind: EntityErrorKind) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Entity(kind),
        }
    }

    pub fn not_found() -> Self {
        Self::entity(EntityErrorKind::NotFound)
    }

    pub fn invalid() -> Self {
        Self::entity(EntityErrorKind::Invalid)
    }

    pub fn unauthenticated() -> Self {
        Self::entity(EntityErrorKind::Unauthenticated)
    }

    pub fn config() -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Config,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<EncryptionError> for Error {
    fn from(err: EncryptionError) -> Self {
        let error_kind = match err {
            EncryptionError::InvalidKey | EncryptionError::HexDecodeError(_) => {
                DomainErrorKind::Config
            }
            _ => DomainErrorKind::Other("Session encryption failed".to_string()),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<NotAuthenticated> for Error {
    fn from(err: NotAuthenticated) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Entity(EntityErrorKind::Unauthenticated),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Other("Serialization failed".to_string()),
        }
    }
}
