//! Domain primitives shared by the services and the HTTP layer.
//!
//! Holds strongly typed identifiers, the capability checks used for
//! authorization, and the field validators for account and loan input.

pub mod access;
pub mod validation;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use access::{AccessDenied, Action, Caller, authorize};
pub use validation::FieldErrors;

/// Unique identifier for a loan application.
///
/// Wrapping the raw integer keeps loan ids from being mixed up with fraud flag
/// or token row ids.
///
/// # Examples
///
/// ```rust
/// use quickcheck::domain::LoanId;
///
/// let id = LoanId::new(42);
/// assert_eq!(id.value(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LoanId(i32);

impl LoanId {
    /// Creates a new `LoanId` from a raw i32 value.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `id` is negative.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        debug_assert!(id >= 0, "LoanId should be non-negative");
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<LoanId> for i32 {
    fn from(id: LoanId) -> Self {
        id.0
    }
}

impl Serialize for LoanId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for LoanId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i32::deserialize(deserializer)?;
        Ok(Self::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loan_id_conversions() {
        let id = LoanId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i32::from(id), 42);
    }

    #[test]
    fn loan_id_serialization() {
        let id = LoanId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let deserialized: LoanId = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, id);
    }
}
