//! Engine configuration - explicit, versioned data
//!
//! The whole configuration travels with the engine and its version is
//! stamped onto every score record, so historical recomputation stays
//! deterministic after configuration changes.
//!
//! The intra-band reversal threshold has no sanctioned default; it is a
//! required constructor input and `EngineConfig` deliberately has no
//! `Default` impl.

use crate::band::BandThresholds;
use crate::errors::{EngineError, EngineResult};
use crate::signal::SignalType;
use serde::{Deserialize, Serialize};

/// Weight for one signal type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalWeight {
    pub signal_type: SignalType,
    pub weight: i64,
}

/// Signal-type → weight table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalWeightTable {
    entries: Vec<SignalWeight>,
}

impl Default for SignalWeightTable {
    fn default() -> Self {
        Self {
            entries: vec![
                SignalWeight {
                    signal_type: SignalType::Hiring,
                    weight: 1,
                },
                SignalWeight {
                    signal_type: SignalType::Funding,
                    weight: 2,
                },
                SignalWeight {
                    signal_type: SignalType::TechAdoption,
                    weight: 1,
                },
                SignalWeight {
                    signal_type: SignalType::Expansion,
                    weight: 1,
                },
                SignalWeight {
                    signal_type: SignalType::LeadershipChange,
                    weight: 2,
                },
                SignalWeight {
                    signal_type: SignalType::WebEngagement,
                    weight: 1,
                },
            ],
        }
    }
}

impl SignalWeightTable {
    /// Build a table from explicit entries
    pub fn new(entries: Vec<SignalWeight>) -> Self {
        Self { entries }
    }

    /// Weight for a signal type; unlisted types weigh zero
    pub fn weight(&self, signal_type: SignalType) -> i64 {
        self.entries
            .iter()
            .find(|e| e.signal_type == signal_type)
            .map(|e| e.weight)
            .unwrap_or(0)
    }

    /// Replace the weight for one signal type
    pub fn set(&mut self, signal_type: SignalType, weight: i64) {
        match self.entries.iter_mut().find(|e| e.signal_type == signal_type) {
            Some(entry) => entry.weight = weight,
            None => self.entries.push(SignalWeight {
                signal_type,
                weight,
            }),
        }
    }
}

/// Versioned configuration for the scoring engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Configuration version, stamped onto every score record
    pub version: u32,
    /// Signal-type → weight table
    pub weights: SignalWeightTable,
    /// Decay half-life in seconds
    pub half_life_secs: i64,
    /// Per-operation delta cap, decay included
    pub delta_cap: i64,
    /// Lowest valid score and decay floor
    pub score_floor: i64,
    /// Highest valid score
    pub score_ceiling: i64,
    /// Band thresholds
    pub thresholds: BandThresholds,
    /// Intra-band swing that counts as a reportable reversal
    pub reversal_threshold: i64,
}

impl EngineConfig {
    /// Default configuration with an explicit reversal threshold
    pub fn new(reversal_threshold: i64) -> Self {
        Self {
            version: 1,
            weights: SignalWeightTable::default(),
            half_life_secs: 30 * 24 * 3600,
            delta_cap: 50,
            score_floor: 0,
            score_ceiling: 1000,
            thresholds: BandThresholds::default(),
            reversal_threshold,
        }
    }

    /// Return a copy with a different delta cap
    pub fn with_delta_cap(mut self, cap: i64) -> Self {
        self.delta_cap = cap;
        self
    }

    /// Return a copy with a different half-life
    pub fn with_half_life_secs(mut self, secs: i64) -> Self {
        self.half_life_secs = secs;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> EngineResult<()> {
        if self.delta_cap <= 0 {
            return Err(EngineError::InvalidConfiguration {
                reason: format!("delta cap must be positive, got {}", self.delta_cap),
            });
        }
        if self.half_life_secs <= 0 {
            return Err(EngineError::InvalidConfiguration {
                reason: format!("half-life must be positive, got {}s", self.half_life_secs),
            });
        }
        if self.score_floor >= self.score_ceiling {
            return Err(EngineError::InvalidConfiguration {
                reason: format!(
                    "score floor {} must be below ceiling {}",
                    self.score_floor, self.score_ceiling
                ),
            });
        }
        if self.reversal_threshold <= 0 {
            return Err(EngineError::InvalidConfiguration {
                reason: format!(
                    "reversal threshold must be positive, got {}",
                    self.reversal_threshold
                ),
            });
        }
        self.thresholds.validate(self.score_floor, self.score_ceiling)
    }
}
