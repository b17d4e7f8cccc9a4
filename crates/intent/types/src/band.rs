//! Engagement-authorization bands and the pure score classifier
//!
//! Six totally ordered bands. Classification is a pure function of the
//! score over fixed non-overlapping thresholds, safe for unsynchronized
//! concurrent calls.

use crate::errors::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Engagement-authorization band
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Band {
    /// No authorized engagement
    Silent = 0,
    /// Passive monitoring only
    Watch = 1,
    /// Light-touch exploration authorized
    Exploratory = 2,
    /// Targeted outreach authorized
    Targeted = 3,
    /// Active engagement authorized
    Engaged = 4,
    /// Direct pursuit authorized
    Direct = 5,
}

impl Band {
    /// All bands, lowest first
    pub const ALL: [Band; 6] = [
        Band::Silent,
        Band::Watch,
        Band::Exploratory,
        Band::Targeted,
        Band::Engaged,
        Band::Direct,
    ];

    /// Uppercase name used in proof narratives
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Silent => "SILENT",
            Band::Watch => "WATCH",
            Band::Exploratory => "EXPLORATORY",
            Band::Targeted => "TARGETED",
            Band::Engaged => "ENGAGED",
            Band::Direct => "DIRECT",
        }
    }

    /// Parse a band name as supplied by a manual override request
    pub fn parse(value: &str) -> EngineResult<Band> {
        match value.to_ascii_uppercase().as_str() {
            "SILENT" => Ok(Band::Silent),
            "WATCH" => Ok(Band::Watch),
            "EXPLORATORY" => Ok(Band::Exploratory),
            "TARGETED" => Ok(Band::Targeted),
            "ENGAGED" => Ok(Band::Engaged),
            "DIRECT" => Ok(Band::Direct),
            _ => Err(EngineError::InvalidTier {
                value: value.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed ascending lower bounds for the six bands
///
/// `floors[0]` must equal the score floor so classification is total over
/// the valid score range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandThresholds {
    floors: [i64; 6],
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            floors: [0, 50, 450, 650, 800, 920],
        }
    }
}

impl BandThresholds {
    /// Create thresholds from explicit band floors
    pub fn new(floors: [i64; 6]) -> Self {
        Self { floors }
    }

    /// Validate against the configured score range
    pub fn validate(&self, score_floor: i64, score_ceiling: i64) -> EngineResult<()> {
        if self.floors[0] != score_floor {
            return Err(EngineError::InvalidConfiguration {
                reason: format!(
                    "lowest band floor {} must equal the score floor {}",
                    self.floors[0], score_floor
                ),
            });
        }
        for pair in self.floors.windows(2) {
            if pair[1] <= pair[0] {
                return Err(EngineError::InvalidConfiguration {
                    reason: format!("band floors must be strictly ascending, got {:?}", self.floors),
                });
            }
        }
        if self.floors[5] > score_ceiling {
            return Err(EngineError::InvalidConfiguration {
                reason: format!(
                    "highest band floor {} exceeds the score ceiling {}",
                    self.floors[5], score_ceiling
                ),
            });
        }
        Ok(())
    }

    /// Classify a score into its band
    ///
    /// Pure and total over the valid score range; scores below the lowest
    /// floor classify as the lowest band (the engine never writes one).
    pub fn classify(&self, score: i64) -> Band {
        for (idx, floor) in self.floors.iter().enumerate().rev() {
            if score >= *floor {
                return Band::ALL[idx];
            }
        }
        Band::Silent
    }

    /// Lower bound of a band
    pub fn floor_of(&self, band: Band) -> i64 {
        self.floors[band as usize]
    }
}
