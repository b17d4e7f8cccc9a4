//! Anchor identity and correlation types
//!
//! The anchor identifier is minted by the external identity authority and
//! is opaque here. The engine never mints or rewrites one. Requests that
//! still carry the deprecated per-tenant identifier are representable so
//! the guard can reject them with a typed doctrine violation.

use serde::{Deserialize, Serialize};

/// The canonical spine anchor identifier
///
/// Opaque and immutable. Every engine record references exactly one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnchorId(String);

impl AnchorId {
    /// Create an anchor ID from the externally minted value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AnchorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AnchorId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The identity a request presents
///
/// Only `Spine` passes the guard. `LegacyTenant` exists to make the
/// deprecated identifier representable so its rejection is typed and
/// auditable, not a silent coercion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum IdentityRef {
    /// The canonical spine anchor
    Spine(AnchorId),
    /// REJECTED: deprecated per-tenant identifier
    LegacyTenant(String),
}

impl IdentityRef {
    /// Check whether this is the canonical spine anchor
    pub fn is_spine(&self) -> bool {
        matches!(self, Self::Spine(_))
    }

    /// The identifier exactly as presented, for audit records
    pub fn presented(&self) -> &str {
        match self {
            Self::Spine(anchor) => anchor.as_str(),
            Self::LegacyTenant(id) => id.as_str(),
        }
    }
}

/// Correlation identifier carried by every mutating request
///
/// Doubles as the idempotency key: replaying a mutation with the same
/// correlation id yields the identical score record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Create a correlation ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether the id is empty (guard rule 2 rejects these)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ref_spine() {
        let identity = IdentityRef::Spine(AnchorId::new("anchor-1"));
        assert!(identity.is_spine());
        assert_eq!(identity.presented(), "anchor-1");
    }

    #[test]
    fn test_identity_ref_legacy() {
        let identity = IdentityRef::LegacyTenant("tenant-42".to_string());
        assert!(!identity.is_spine());
        assert_eq!(identity.presented(), "tenant-42");
    }

    #[test]
    fn test_correlation_empty() {
        assert!(CorrelationId::new("").is_empty());
        assert!(!CorrelationId::new("corr-1").is_empty());
    }

    #[test]
    fn test_identity_serialization() {
        let identity = IdentityRef::Spine(AnchorId::new("anchor-1"));
        let json = serde_json::to_string(&identity).unwrap();
        let back: IdentityRef = serde_json::from_str(&json).unwrap();
        assert_eq!(identity, back);
    }
}
