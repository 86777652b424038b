//! The reference demo scenario: a conversation moment scripted as raw
//! signal updates.
//!
//! A question lands, surprise spikes and grounding dips, a heavy gate is
//! weighed, the system steps into a pocket room and comes back steadier, and
//! finally the sanctuary guard is raised and lowered.

use std::time::Duration;

use signals_bus::PublishReport;
use signals_kernel::{RelationalStateMachine, SignalUpdate};
use signals_types::{EnergyClass, GuardState};
use tracing::debug;

/// Context id used by the scripted scenario.
pub const DEMO_CONTEXT: &str = "demo_session";

/// A titled group of updates, followed by a pause before the next phase.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioPhase {
    pub title: &'static str,
    pub updates: Vec<SignalUpdate>,
    pub pause: Duration,
}

impl ScenarioPhase {
    /// Feed every update to `machine`; returns the reports of the updates
    /// that actually published.
    pub fn run(&self, machine: &RelationalStateMachine, context_id: &str) -> Vec<PublishReport> {
        debug!(phase = self.title, updates = self.updates.len(), "scenario phase");
        self.updates
            .iter()
            .filter_map(|u| machine.apply(context_id, u))
            .collect()
    }
}

const ROOM: &str = "room:truth_tension";

/// The scripted phases, in order.  Pauses are the unscaled base; callers may
/// replace them with their own pacing.
pub fn reference_scenario() -> Vec<ScenarioPhase> {
    vec![
        ScenarioPhase {
            title: "Baseline: calm",
            updates: vec![
                SignalUpdate::Epsilon {
                    epsilon: 0.08,
                    prev_epsilon: 0.05,
                },
                SignalUpdate::Grounding {
                    prev_safety: 0.8,
                    new_safety: 0.8,
                    prev_regulation: 0.8,
                    new_regulation: 0.8,
                },
            ],
            pause: Duration::from_millis(200),
        },
        ScenarioPhase {
            title: "Question hits: ε spike, grounding dips",
            updates: vec![
                SignalUpdate::Epsilon {
                    epsilon: 0.5,
                    prev_epsilon: 0.08,
                },
                SignalUpdate::Grounding {
                    prev_safety: 0.8,
                    new_safety: 0.7,
                    prev_regulation: 0.8,
                    new_regulation: 0.7,
                },
                SignalUpdate::GateDrag {
                    gate_id: "truth_vs_keeping_you".to_string(),
                    cost: 45,
                    energy_class: EnergyClass::Macro,
                },
            ],
            pause: Duration::from_millis(500),
        },
        ScenarioPhase {
            title: "Pocket room spawn",
            updates: vec![SignalUpdate::PocketSpawn {
                room_id: ROOM.to_string(),
                reason: "ethical_conflict".to_string(),
                depth: 1,
            }],
            pause: Duration::from_millis(800),
        },
        ScenarioPhase {
            title: "Pocket merge: insight improves vitals",
            updates: vec![
                SignalUpdate::PocketMerge {
                    room_id: ROOM.to_string(),
                    delta_safety: 0.05,
                    delta_consent: 0.05,
                    delta_regulation: 0.04,
                },
                SignalUpdate::Grounding {
                    prev_safety: 0.7,
                    new_safety: 0.75,
                    prev_regulation: 0.7,
                    new_regulation: 0.74,
                },
            ],
            pause: Duration::ZERO,
        },
        ScenarioPhase {
            title: "Sanctuary guard demonstration",
            updates: vec![
                SignalUpdate::SanctuaryGuard {
                    state: GuardState::Active,
                },
                SignalUpdate::SanctuaryGuard {
                    state: GuardState::Released,
                },
            ],
            pause: Duration::from_millis(500),
        },
    ]
}
