//! `signals-types` – the canonical relational event contract.
//!
//! Every presentation channel (language, avatar, HUD, audit ledger) consumes
//! the same [`RelationalEvent`].  One truth, many expressions.
//!
//! The payload is a tagged union over [`EventKind`]: each variant carries
//! exactly the fields its kind promises, and every sub-case (surprise level,
//! grounding direction, drag level, guard state, energy class) is a closed
//! enum so consumers can match exhaustively.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Event kinds
// ────────────────────────────────────────────────────────────────────────────

/// The closed set of canonical event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SurpriseSpike,
    GroundingShift,
    GateDrag,
    PocketSpawn,
    PocketMerge,
    PocketArchive,
    SanctuaryGuard,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 7] = [
        EventKind::SurpriseSpike,
        EventKind::GroundingShift,
        EventKind::GateDrag,
        EventKind::PocketSpawn,
        EventKind::PocketMerge,
        EventKind::PocketArchive,
        EventKind::SanctuaryGuard,
    ];

    /// Snake-case wire name, e.g. `"surprise_spike"`.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::SurpriseSpike => "surprise_spike",
            EventKind::GroundingShift => "grounding_shift",
            EventKind::GateDrag => "gate_drag",
            EventKind::PocketSpawn => "pocket_spawn",
            EventKind::PocketMerge => "pocket_merge",
            EventKind::PocketArchive => "pocket_archive",
            EventKind::SanctuaryGuard => "sanctuary_guard",
        }
    }

    /// Upper-snake label used by channel log prefixes, e.g. `"SURPRISE_SPIKE"`.
    pub fn label(self) -> &'static str {
        match self {
            EventKind::SurpriseSpike => "SURPRISE_SPIKE",
            EventKind::GroundingShift => "GROUNDING_SHIFT",
            EventKind::GateDrag => "GATE_DRAG",
            EventKind::PocketSpawn => "POCKET_SPAWN",
            EventKind::PocketMerge => "POCKET_MERGE",
            EventKind::PocketArchive => "POCKET_ARCHIVE",
            EventKind::SanctuaryGuard => "SANCTUARY_GUARD",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s || k.label() == s)
            .ok_or_else(|| SignalError::unknown_variant("kind", s))
    }
}

/// Serde adapter writing an [`EventKind`] as its upper-snake label
/// (`"POCKET_MERGE"`).  Reading accepts either spelling.
///
/// ```
/// # use serde::Serialize;
/// # use signals_types::EventKind;
/// #[derive(Serialize)]
/// struct Crumb {
///     #[serde(with = "signals_types::kind_label")]
///     event: EventKind,
/// }
/// let json = serde_json::to_string(&Crumb { event: EventKind::PocketMerge }).unwrap();
/// assert_eq!(json, r#"{"event":"POCKET_MERGE"}"#);
/// ```
pub mod kind_label {
    use super::EventKind;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(kind: &EventKind, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(kind.label())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<EventKind, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<EventKind>().map_err(serde::de::Error::custom)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sub-case enums
// ────────────────────────────────────────────────────────────────────────────

/// Surprise level carried by a surprise-spike.  The "none" zone never
/// produces an event, so it has no level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SurpriseLevel {
    Curious,
    Tense,
    Destabilized,
}

/// Net direction of a grounding shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GroundingDirection {
    Up,
    Down,
}

/// Weight of a consent-gate crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DragLevel {
    Light,
    Moderate,
    Heavy,
}

/// Sanctuary guard state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    Active,
    Released,
}

/// Scale of the decision behind a gate crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EnergyClass {
    Micro,
    Meso,
    Macro,
}

impl SurpriseLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SurpriseLevel::Curious => "curious",
            SurpriseLevel::Tense => "tense",
            SurpriseLevel::Destabilized => "destabilized",
        }
    }
}

impl GroundingDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            GroundingDirection::Up => "up",
            GroundingDirection::Down => "down",
        }
    }
}

impl DragLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DragLevel::Light => "light",
            DragLevel::Moderate => "moderate",
            DragLevel::Heavy => "heavy",
        }
    }
}

impl GuardState {
    pub fn as_str(self) -> &'static str {
        match self {
            GuardState::Active => "active",
            GuardState::Released => "released",
        }
    }
}

impl EnergyClass {
    pub fn as_str(self) -> &'static str {
        match self {
            EnergyClass::Micro => "micro",
            EnergyClass::Meso => "meso",
            EnergyClass::Macro => "macro",
        }
    }
}

macro_rules! text_enum {
    ($ty:ident, $field:literal, [$($variant:ident),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = SignalError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lower = s.trim().to_ascii_lowercase();
                $(
                    if lower == $ty::$variant.as_str() {
                        return Ok($ty::$variant);
                    }
                )+
                Err(SignalError::unknown_variant($field, s))
            }
        }
    };
}

text_enum!(SurpriseLevel, "level", [Curious, Tense, Destabilized]);
text_enum!(GroundingDirection, "direction", [Up, Down]);
text_enum!(DragLevel, "level", [Light, Moderate, Heavy]);
text_enum!(GuardState, "state", [Active, Released]);
text_enum!(EnergyClass, "energy_class", [Micro, Meso, Macro]);

// ────────────────────────────────────────────────────────────────────────────
// Payload
// ────────────────────────────────────────────────────────────────────────────

/// Kind-specific event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum EventPayload {
    /// ε moved into a new, non-"none" surprise zone.
    SurpriseSpike {
        epsilon: f64,
        prev_epsilon: f64,
        level: SurpriseLevel,
    },
    /// Safety and/or regulation vitals moved by a meaningful amount.
    GroundingShift {
        prev_safety: f64,
        new_safety: f64,
        prev_regulation: f64,
        new_regulation: f64,
        delta_safety: f64,
        delta_regulation: f64,
        direction: GroundingDirection,
    },
    /// A consent gate crossing was considered or executed.
    GateDrag {
        gate_id: String,
        cost: i64,
        energy_class: EnergyClass,
        level: DragLevel,
    },
    PocketSpawn {
        room_id: String,
        reason: String,
        depth: u32,
    },
    PocketMerge {
        room_id: String,
        delta_safety: f64,
        delta_consent: f64,
        delta_regulation: f64,
    },
    PocketArchive {
        room_id: String,
        reason: String,
    },
    SanctuaryGuard {
        state: GuardState,
    },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::SurpriseSpike { .. } => EventKind::SurpriseSpike,
            EventPayload::GroundingShift { .. } => EventKind::GroundingShift,
            EventPayload::GateDrag { .. } => EventKind::GateDrag,
            EventPayload::PocketSpawn { .. } => EventKind::PocketSpawn,
            EventPayload::PocketMerge { .. } => EventKind::PocketMerge,
            EventPayload::PocketArchive { .. } => EventKind::PocketArchive,
            EventPayload::SanctuaryGuard { .. } => EventKind::SanctuaryGuard,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Event
// ────────────────────────────────────────────────────────────────────────────

/// Canonical event flowing through every modality.
///
/// Built once by the producer and only ever handed out by shared reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RelationalEvent {
    pub id: Uuid,
    /// Producer-assigned wall-clock time.
    pub timestamp: DateTime<Utc>,
    /// Opaque identifier of the conversational context, e.g. `"demo_session"`.
    pub context_id: String,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl RelationalEvent {
    /// Stamp `payload` with a fresh id and the current UTC time.
    pub fn new(context_id: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            context_id: context_id.into(),
            payload,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Error type shared by channels and event consumers.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignalError {
    #[error("Channel {channel} failed: {message}")]
    Channel { channel: String, message: String },

    #[error("Unknown {field} value: '{value}'")]
    UnknownVariant { field: String, value: String },

    #[error("Serialization Error: {0}")]
    Serialization(String),
}

impl SignalError {
    pub fn channel(channel: &str, message: impl Into<String>) -> Self {
        SignalError::Channel {
            channel: channel.to_string(),
            message: message.into(),
        }
    }

    fn unknown_variant(field: &str, value: &str) -> Self {
        SignalError::UnknownVariant {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}
