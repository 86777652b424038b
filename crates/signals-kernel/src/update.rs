//! [`SignalUpdate`] – one raw signal report as a value.
//!
//! Scripted scenarios and interactive shells build these and hand them to
//! [`RelationalStateMachine::apply`], which routes each to the matching
//! `on_*` entry point.

use serde::{Deserialize, Serialize};
use signals_bus::PublishReport;
use signals_types::{EnergyClass, EventKind, GuardState};

use crate::state_machine::RelationalStateMachine;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SignalUpdate {
    Epsilon {
        epsilon: f64,
        prev_epsilon: f64,
    },
    Grounding {
        prev_safety: f64,
        new_safety: f64,
        prev_regulation: f64,
        new_regulation: f64,
    },
    GateDrag {
        gate_id: String,
        cost: i64,
        energy_class: EnergyClass,
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

impl SignalUpdate {
    /// The kind this update may produce.
    pub fn kind(&self) -> EventKind {
        match self {
            SignalUpdate::Epsilon { .. } => EventKind::SurpriseSpike,
            SignalUpdate::Grounding { .. } => EventKind::GroundingShift,
            SignalUpdate::GateDrag { .. } => EventKind::GateDrag,
            SignalUpdate::PocketSpawn { .. } => EventKind::PocketSpawn,
            SignalUpdate::PocketMerge { .. } => EventKind::PocketMerge,
            SignalUpdate::PocketArchive { .. } => EventKind::PocketArchive,
            SignalUpdate::SanctuaryGuard { .. } => EventKind::SanctuaryGuard,
        }
    }
}

impl RelationalStateMachine {
    /// Feed `update` to the matching entry point.  `None` means the update
    /// was below threshold and nothing was published.
    pub fn apply(&self, context_id: &str, update: &SignalUpdate) -> Option<PublishReport> {
        match update {
            SignalUpdate::Epsilon {
                epsilon,
                prev_epsilon,
            } => self.on_epsilon_update(context_id, *epsilon, *prev_epsilon),
            SignalUpdate::Grounding {
                prev_safety,
                new_safety,
                prev_regulation,
                new_regulation,
            } => self.on_grounding_update(
                context_id,
                *prev_safety,
                *new_safety,
                *prev_regulation,
                *new_regulation,
            ),
            SignalUpdate::GateDrag {
                gate_id,
                cost,
                energy_class,
            } => Some(self.on_gate_drag(context_id, gate_id, *cost, *energy_class)),
            SignalUpdate::PocketSpawn {
                room_id,
                reason,
                depth,
            } => Some(self.on_pocket_spawn(context_id, room_id, reason, *depth)),
            SignalUpdate::PocketMerge {
                room_id,
                delta_safety,
                delta_consent,
                delta_regulation,
            } => Some(self.on_pocket_merge(
                context_id,
                room_id,
                *delta_safety,
                *delta_consent,
                *delta_regulation,
            )),
            SignalUpdate::PocketArchive { room_id, reason } => {
                Some(self.on_pocket_archive(context_id, room_id, reason))
            }
            SignalUpdate::SanctuaryGuard { state } => {
                Some(self.on_sanctuary_guard(context_id, *state))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use signals_bus::EventBus;

    use crate::thresholds::Thresholds;

    #[test]
    fn apply_routes_to_matching_entry_point() {
        let machine = RelationalStateMachine::new(Thresholds::default(), Arc::new(EventBus::new()));

        let quiet = SignalUpdate::Epsilon {
            epsilon: 0.08,
            prev_epsilon: 0.05,
        };
        assert!(machine.apply("ctx", &quiet).is_none());

        let guard = SignalUpdate::SanctuaryGuard {
            state: GuardState::Active,
        };
        let report = machine.apply("ctx", &guard).unwrap();
        assert_eq!(report.kind, EventKind::SanctuaryGuard);
        assert_eq!(report.kind, guard.kind());
    }

    #[test]
    fn update_kind_matches_published_kind() {
        let machine = RelationalStateMachine::new(Thresholds::default(), Arc::new(EventBus::new()));
        let updates = [
            SignalUpdate::Epsilon {
                epsilon: 0.8,
                prev_epsilon: 0.0,
            },
            SignalUpdate::Grounding {
                prev_safety: 0.5,
                new_safety: 0.9,
                prev_regulation: 0.5,
                new_regulation: 0.5,
            },
            SignalUpdate::GateDrag {
                gate_id: "g".to_string(),
                cost: 60,
                energy_class: EnergyClass::Macro,
            },
            SignalUpdate::PocketArchive {
                room_id: "r".to_string(),
                reason: "destabilized".to_string(),
            },
        ];
        for update in &updates {
            let report = machine.apply("ctx", update).unwrap();
            assert_eq!(report.kind, update.kind());
        }
    }
}
