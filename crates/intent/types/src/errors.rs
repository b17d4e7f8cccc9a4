//! Error taxonomy for the buyer-intent engine
//!
//! Four families with different contracts:
//! - doctrine violations are fatal and must not be caught-and-continued;
//! - policy rejections are retryable after fixing the request;
//! - transient failures are safe to retry whole via the correlation id;
//! - invariant failures indicate an engine defect.

use thiserror::Error;

/// Errors raised by the buyer-intent engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    // =========================================================================
    // Doctrine violations (fatal, never silently swallowed)
    // =========================================================================
    /// **DOCTRINE**: the request carries the deprecated per-tenant
    /// identifier instead of the canonical spine anchor
    #[error("DOCTRINE VIOLATION: '{presented}' is a deprecated per-tenant identifier; the engine accepts only the canonical spine anchor")]
    SpineViolation {
        /// The identifier as presented
        presented: String,
    },

    /// **DOCTRINE**: the mutating request has no usable correlation id
    #[error("DOCTRINE VIOLATION: mutation for '{anchor}' is missing a correlation id")]
    MissingCorrelation {
        /// The anchor the request addressed
        anchor: String,
    },

    // =========================================================================
    // Policy rejections (caller fixes the request and resubmits)
    // =========================================================================
    /// Proposed delta exceeds the per-operation cap
    #[error("delta cap exceeded: proposed {proposed}, cap {cap}")]
    DeltaCapExceeded {
        /// The rejected delta
        proposed: i64,
        /// The configured cap
        cap: i64,
    },

    /// Manual override named something that is not an enumerated band
    #[error("invalid tier '{value}': not one of the enumerated bands")]
    InvalidTier {
        /// The rejected band value
        value: String,
    },

    // =========================================================================
    // Transient failures (whole-operation retry is safe)
    // =========================================================================
    /// A durable store was unavailable mid-operation; no partial effect
    #[error("durable store unavailable: {0}")]
    StoreUnavailable(String),

    // =========================================================================
    // Invariant failures (engine defects)
    // =========================================================================
    /// An out-of-range score reached the classifier
    #[error("score {score} outside valid range {floor}..={ceiling}: score engine defect")]
    ScoreOutOfRange {
        /// The defective score
        score: i64,
        /// Configured floor
        floor: i64,
        /// Configured ceiling
        ceiling: i64,
    },

    // =========================================================================
    // Store and shape errors
    // =========================================================================
    /// No score history exists for the anchor
    #[error("anchor not tracked: {0}")]
    AnchorUnknown(String),

    /// Movement event not found
    #[error("movement not found: {0}")]
    MovementUnknown(String),

    /// Error sink record not found
    #[error("error record not found: {0}")]
    ErrorRecordUnknown(String),

    /// Signal with this id was already appended
    #[error("signal '{0}' already recorded")]
    DuplicateSignal(String),

    /// A writer lost the per-anchor version race
    #[error("score version conflict for '{anchor}': expected {expected}, got {got}")]
    VersionConflict {
        /// The contested anchor
        anchor: String,
        /// Version the store expected next
        expected: u64,
        /// Version the writer supplied
        got: u64,
    },

    /// Signal failed shape validation
    #[error("invalid signal: {reason}")]
    InvalidSignal {
        /// Why the shape is invalid
        reason: String,
    },

    /// Configuration failed validation
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Why the configuration is invalid
        reason: String,
    },
}

impl EngineError {
    /// Check if this is a fatal doctrine violation
    ///
    /// Callers must not catch-and-continue past these.
    pub fn is_doctrine_violation(&self) -> bool {
        matches!(
            self,
            Self::SpineViolation { .. } | Self::MissingCorrelation { .. }
        )
    }

    /// Check if this is a policy rejection the caller can fix and resubmit
    pub fn is_policy_rejection(&self) -> bool {
        matches!(
            self,
            Self::DeltaCapExceeded { .. } | Self::InvalidTier { .. }
        )
    }

    /// Check if retrying the whole operation is safe
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StoreUnavailable(_) | Self::VersionConflict { .. } => true,
            other => other.is_policy_rejection(),
        }
    }

    /// Check if this indicates an engine defect
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::ScoreOutOfRange { .. })
    }

    /// Stable rule name persisted in error sink records
    pub fn rule_name(&self) -> &'static str {
        match self {
            Self::SpineViolation { .. } => "spine_violation",
            Self::MissingCorrelation { .. } => "missing_correlation",
            Self::DeltaCapExceeded { .. } => "delta_cap_exceeded",
            Self::InvalidTier { .. } => "invalid_tier",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::ScoreOutOfRange { .. } => "score_out_of_range",
            Self::AnchorUnknown(_) => "anchor_unknown",
            Self::MovementUnknown(_) => "movement_unknown",
            Self::ErrorRecordUnknown(_) => "error_record_unknown",
            Self::DuplicateSignal(_) => "duplicate_signal",
            Self::VersionConflict { .. } => "version_conflict",
            Self::InvalidSignal { .. } => "invalid_signal",
            Self::InvalidConfiguration { .. } => "invalid_configuration",
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doctrine_violations_are_fatal() {
        let spine = EngineError::SpineViolation {
            presented: "tenant-42".to_string(),
        };
        assert!(spine.is_doctrine_violation());
        assert!(!spine.is_retryable());
        assert!(spine.to_string().contains("DOCTRINE VIOLATION"));
        assert!(spine.to_string().contains("tenant-42"));

        let missing = EngineError::MissingCorrelation {
            anchor: "anchor-1".to_string(),
        };
        assert!(missing.is_doctrine_violation());
        assert!(!missing.is_retryable());
    }

    #[test]
    fn test_policy_rejections_are_retryable() {
        let cap = EngineError::DeltaCapExceeded {
            proposed: 75,
            cap: 50,
        };
        assert!(cap.is_policy_rejection());
        assert!(cap.is_retryable());
        assert!(!cap.is_doctrine_violation());

        let tier = EngineError::InvalidTier {
            value: "platinum".to_string(),
        };
        assert!(tier.is_policy_rejection());
        assert!(tier.is_retryable());
    }

    #[test]
    fn test_invariant_failures_are_defects() {
        let err = EngineError::ScoreOutOfRange {
            score: 1500,
            floor: 0,
            ceiling: 1000,
        };
        assert!(err.is_defect());
        assert!(!err.is_retryable());
        assert!(!err.is_doctrine_violation());
    }

    #[test]
    fn test_rule_names() {
        let err = EngineError::SpineViolation {
            presented: "x".to_string(),
        };
        assert_eq!(err.rule_name(), "spine_violation");

        let err = EngineError::DeltaCapExceeded {
            proposed: 75,
            cap: 50,
        };
        assert_eq!(err.rule_name(), "delta_cap_exceeded");
    }
}
