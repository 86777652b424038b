//! Threshold configuration – the numeric bands the decision core classifies
//! raw signals against.
//!
//! A thresholds document has three required groups:
//!
//! ```toml
//! [surprise]
//! curious = 0.2
//! tense = 0.45
//! destabilized = 0.7
//!
//! [drag_cost]
//! light = 20
//! moderate = 50
//!
//! [grounding]
//! min_delta = 0.03
//! ```
//!
//! JSON documents with the same shape are accepted too.  Missing fields are a
//! load-time [`ConfigError`], never a silent default, and every band list must
//! be strictly ascending.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use signals_types::{DragLevel, GroundingDirection, SurpriseLevel};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Errors raised while loading or validating a thresholds document.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read thresholds at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} thresholds: {message}")]
    Parse { format: &'static str, message: String },

    #[error("Unsupported thresholds format for {} (expected .json or .toml)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("{group} bands must be strictly ascending: {detail}")]
    NotAscending { group: &'static str, detail: String },

    #[error("Invalid value for {field}: {detail}")]
    InvalidValue { field: &'static str, detail: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Surprise bands
// ────────────────────────────────────────────────────────────────────────────

/// Ordered zone of the surprise scalar ε.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SurpriseZone {
    None,
    Curious,
    Tense,
    Destabilized,
}

impl SurpriseZone {
    /// The event level for this zone; `None` for the quiet zone.
    pub fn level(self) -> Option<SurpriseLevel> {
        match self {
            SurpriseZone::None => None,
            SurpriseZone::Curious => Some(SurpriseLevel::Curious),
            SurpriseZone::Tense => Some(SurpriseLevel::Tense),
            SurpriseZone::Destabilized => Some(SurpriseLevel::Destabilized),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurpriseBands {
    pub curious: f64,
    pub tense: f64,
    pub destabilized: f64,
}

impl SurpriseBands {
    /// Classify `epsilon` with half-open bounds: below `curious` is
    /// [`SurpriseZone::None`], below `tense` is curious, below `destabilized`
    /// is tense, anything else saturates at destabilized.
    pub fn zone(&self, epsilon: f64) -> SurpriseZone {
        if epsilon < self.curious {
            SurpriseZone::None
        } else if epsilon < self.tense {
            SurpriseZone::Curious
        } else if epsilon < self.destabilized {
            SurpriseZone::Tense
        } else {
            SurpriseZone::Destabilized
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Drag-cost bands
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragBands {
    pub light: i64,
    pub moderate: i64,
}

impl DragBands {
    /// Below `light` is light, below `moderate` is moderate, else heavy.
    pub fn level(&self, cost: i64) -> DragLevel {
        if cost < self.light {
            DragLevel::Light
        } else if cost < self.moderate {
            DragLevel::Moderate
        } else {
            DragLevel::Heavy
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Grounding sensitivity
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundingBands {
    pub min_delta: f64,
}

/// A grounding change large enough to report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundingShift {
    pub delta_safety: f64,
    pub delta_regulation: f64,
    pub direction: GroundingDirection,
}

impl GroundingBands {
    /// Returns `None` when both deltas are below `min_delta` in magnitude.
    ///
    /// Direction is up only when the summed delta is strictly positive; a
    /// zero sum resolves to down.
    pub fn assess(
        &self,
        prev_safety: f64,
        new_safety: f64,
        prev_regulation: f64,
        new_regulation: f64,
    ) -> Option<GroundingShift> {
        let delta_safety = new_safety - prev_safety;
        let delta_regulation = new_regulation - prev_regulation;

        if delta_safety.abs() < self.min_delta && delta_regulation.abs() < self.min_delta {
            return None;
        }

        let direction = if delta_safety + delta_regulation > 0.0 {
            GroundingDirection::Up
        } else {
            GroundingDirection::Down
        };

        Some(GroundingShift {
            delta_safety,
            delta_regulation,
            direction,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Thresholds
// ────────────────────────────────────────────────────────────────────────────

/// The full, validated band configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub surprise: SurpriseBands,
    pub drag_cost: DragBands,
    pub grounding: GroundingBands,
}

impl Default for Thresholds {
    /// The reference bands shipped in `thresholds.toml`.
    fn default() -> Self {
        Self {
            surprise: SurpriseBands {
                curious: 0.2,
                tense: 0.45,
                destabilized: 0.7,
            },
            drag_cost: DragBands {
                light: 20,
                moderate: 50,
            },
            grounding: GroundingBands { min_delta: 0.03 },
        }
    }
}

impl Thresholds {
    /// Parse and validate a JSON thresholds document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let parsed: Thresholds = serde_json::from_str(raw).map_err(|e| ConfigError::Parse {
            format: "JSON",
            message: e.to_string(),
        })?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Parse and validate a TOML thresholds document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let parsed: Thresholds = toml::from_str(raw).map_err(|e| ConfigError::Parse {
            format: "TOML",
            message: e.to_string(),
        })?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Load a thresholds document, choosing the parser by file extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self, ConfigError> = match ext.as_deref() {
            Some("json") => Self::from_json_str,
            Some("toml") => Self::from_toml_str,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&raw)
    }

    /// Enforce strictly ascending bands and finite, non-negative sensitivity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.surprise;
        for (field, value) in [
            ("surprise.curious", s.curious),
            ("surprise.tense", s.tense),
            ("surprise.destabilized", s.destabilized),
            ("grounding.min_delta", self.grounding.min_delta),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidValue {
                    field,
                    detail: format!("{value} is not a finite number"),
                });
            }
        }

        if !(s.curious < s.tense && s.tense < s.destabilized) {
            return Err(ConfigError::NotAscending {
                group: "surprise",
                detail: format!(
                    "curious={} tense={} destabilized={}",
                    s.curious, s.tense, s.destabilized
                ),
            });
        }

        let d = &self.drag_cost;
        if d.light >= d.moderate {
            return Err(ConfigError::NotAscending {
                group: "drag_cost",
                detail: format!("light={} moderate={}", d.light, d.moderate),
            });
        }

        if self.grounding.min_delta < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "grounding.min_delta",
                detail: format!("{} is negative", self.grounding.min_delta),
            });
        }

        Ok(())
    }
}
