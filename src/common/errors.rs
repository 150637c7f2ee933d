use std::error::Error as StdError;
use std::fmt::{Display, Formatter, Result as FmtResult};
use thiserror::Error;

/// Error categories raised by the storage adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation deadline exceeded
    Timeout,
    /// Internal system error
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ErrorKind::Timeout => write!(f, "Timeout"),
            ErrorKind::InternalError => write!(f, "Internal Error"),
        }
    }
}

/// Base domain error carrying the affected entity and an optional source
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct DomainError {
    /// Error category
    pub kind: ErrorKind,
    /// Affected entity type (e.g. "ConfigRecord", "CacheBlob")
    pub entity_type: &'static str,
    /// Entity identifier when available
    pub entity_id: Option<String>,
    /// Human readable message
    pub message: String,
    /// Underlying error
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl DomainError {
    pub fn new<S: Into<String>>(kind: ErrorKind, entity_type: &'static str, message: S) -> Self {
        Self {
            kind,
            entity_type,
            entity_id: None,
            message: message.into(),
            source: None,
        }
    }

    /// Deadline exceeded
    pub fn timeout<S: Into<String>>(entity_type: &'static str, message: S) -> Self {
        Self::new(ErrorKind::Timeout, entity_type, message)
    }

    /// Internal failure
    pub fn internal_error<S: Into<String>>(entity_type: &'static str, message: S) -> Self {
        Self::new(ErrorKind::InternalError, entity_type, message)
    }

    /// Sets the entity identifier
    pub fn with_id<S: Into<String>>(mut self, entity_id: S) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Sets the source error
    pub fn with_source<E: StdError + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}
