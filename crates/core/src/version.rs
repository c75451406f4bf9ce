//! Optimistic concurrency primitives.
//!
//! Two staff members editing the same order must not interleave; every
//! mutating operation states which revision it expects and fails fast when
//! the stored revision has moved on.

use crate::error::{DomainError, DomainResult};

/// Optimistic concurrency expectation for an order revision.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (useful for idempotent callers, migrations, etc.).
    Any,
    /// Require the order to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::concurrent(format!(
                "expected version {self:?}, actual {actual}"
            )))
        }
    }
}
