//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (guard
/// violations, validation, stale versions). Infrastructure concerns belong
/// elsewhere. Every variant is a caller-visible outcome, never retried and
/// never used for ordinary control flow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A status change was attempted that is not allowed from the current state.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// An item or shipping edit was attempted outside the editable window,
    /// or the edit would violate an order invariant.
    #[error("invalid order edit: {0}")]
    InvalidOrderEdit(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced order or variant does not exist.
    #[error("not found")]
    NotFound,

    /// Optimistic version check failed (concurrent mutation of the same order).
    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn invalid_edit(msg: impl Into<String>) -> Self {
        Self::InvalidOrderEdit(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn concurrent(msg: impl Into<String>) -> Self {
        Self::ConcurrentModification(msg.into())
    }
}
