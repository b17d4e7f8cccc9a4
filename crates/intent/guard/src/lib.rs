//! Intent Guard - pre-commit validation of every mutating request
//!
//! **CRITICAL INVARIANT**: Every rejection is written to the error sink
//! before the caller is told. The guard never swallows a violation.
//!
//! Rules, each short-circuiting:
//! 1. identity must be the canonical spine anchor (doctrine)
//! 2. a non-empty correlation id must be present (doctrine)
//! 3. score mutations must respect the delta cap (policy)
//! 4. manual overrides must name an enumerated band (policy)
//!
//! Doctrine violations are fatal; callers must not catch-and-continue
//! past them. Policy rejections are fixed and resubmitted.

#![deny(unsafe_code)]

use intent_store::ErrorSink;
use intent_types::{
    AnchorId, Band, CorrelationId, EngineConfig, EngineError, EngineResult, IdentityRef,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// What a mutating request wants to do
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardRequestKind {
    /// Signal ingest or request-shape validation; rules 1-2 only
    Ingest,
    /// A score mutation with its pre-commit delta; rules 1-3
    ScoreMutation { proposed_delta: i64 },
    /// A manual band override; rules 1-2 and 4
    ManualOverride { band: String },
}

/// A mutating request presented to the guard
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardRequest {
    pub identity: IdentityRef,
    pub correlation_id: Option<CorrelationId>,
    pub kind: GuardRequestKind,
}

impl GuardRequest {
    /// Build a request
    pub fn new(
        identity: IdentityRef,
        correlation_id: Option<CorrelationId>,
        kind: GuardRequestKind,
    ) -> Self {
        Self {
            identity,
            correlation_id,
            kind,
        }
    }
}

/// The guard layer
///
/// Stateless apart from the sink append; safe to call from any number of
/// threads concurrently.
pub struct GuardLayer {
    sink: Arc<ErrorSink>,
    config: EngineConfig,
}

impl GuardLayer {
    /// Create a guard over an error sink with a validated configuration
    pub fn new(sink: Arc<ErrorSink>, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { sink, config })
    }

    /// Validate a mutating request
    ///
    /// Returns the canonical anchor on success. On rejection, exactly one
    /// error sink record is written before the error is returned.
    pub fn validate(&self, request: &GuardRequest) -> EngineResult<AnchorId> {
        match self.check(request) {
            Ok(anchor) => Ok(anchor),
            Err(err) => {
                self.persist_rejection(request, &err)?;
                Err(err)
            }
        }
    }

    /// The error sink this guard writes to
    pub fn sink(&self) -> &Arc<ErrorSink> {
        &self.sink
    }

    fn check(&self, request: &GuardRequest) -> EngineResult<AnchorId> {
        // Rule 1: canonical spine anchor only
        let anchor = match &request.identity {
            IdentityRef::Spine(anchor) => anchor.clone(),
            IdentityRef::LegacyTenant(id) => {
                return Err(EngineError::SpineViolation {
                    presented: id.clone(),
                })
            }
        };

        // Rule 2: correlation id present and non-empty
        match &request.correlation_id {
            Some(correlation) if !correlation.is_empty() => {}
            _ => {
                return Err(EngineError::MissingCorrelation {
                    anchor: anchor.as_str().to_string(),
                })
            }
        }

        match &request.kind {
            GuardRequestKind::Ingest => {}
            // Rule 3: bounded delta
            GuardRequestKind::ScoreMutation { proposed_delta } => {
                if proposed_delta.abs() > self.config.delta_cap {
                    return Err(EngineError::DeltaCapExceeded {
                        proposed: *proposed_delta,
                        cap: self.config.delta_cap,
                    });
                }
            }
            // Rule 4: enumerated band values only
            GuardRequestKind::ManualOverride { band } => {
                Band::parse(band)?;
            }
        }

        Ok(anchor)
    }

    fn persist_rejection(&self, request: &GuardRequest, err: &EngineError) -> EngineResult<()> {
        let snapshot = serde_json::to_value(request)
            .unwrap_or_else(|_| serde_json::json!({"unserializable": true}));

        if err.is_doctrine_violation() {
            warn!(
                identity = request.identity.presented(),
                rule = err.rule_name(),
                "doctrine violation rejected"
            );
        } else {
            debug!(
                identity = request.identity.presented(),
                rule = err.rule_name(),
                "policy rejection"
            );
        }

        self.sink.record(
            request.identity.presented(),
            request.correlation_id.clone(),
            err.rule_name(),
            snapshot,
        )?;
        Ok(())
    }
}
