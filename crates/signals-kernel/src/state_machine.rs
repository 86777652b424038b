//! [`RelationalStateMachine`] – decides *when* a raw signal update becomes a
//! canonical event.
//!
//! One entry point per signal source:
//!
//! | Source | Method | Emits |
//! |---|---|---|
//! | ε updater | [`on_epsilon_update`](RelationalStateMachine::on_epsilon_update) | surprise-spike, on zone change outside "none" |
//! | vitals engine | [`on_grounding_update`](RelationalStateMachine::on_grounding_update) | grounding-shift, when either delta reaches `min_delta` |
//! | consent gate | [`on_gate_drag`](RelationalStateMachine::on_gate_drag) | gate-drag, always |
//! | pocket room manager | `on_pocket_spawn` / `on_pocket_merge` / `on_pocket_archive` | always |
//! | sanctuary guard | [`on_sanctuary_guard`](RelationalStateMachine::on_sanctuary_guard) | always |
//!
//! The machine keeps no signal history.  Callers supply both the previous and
//! the new raw value, and classification is recomputed from that pair on every
//! call.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use signals_bus::EventBus;
//! use signals_kernel::{RelationalStateMachine, Thresholds};
//!
//! let machine = RelationalStateMachine::new(Thresholds::default(), Arc::new(EventBus::new()));
//!
//! // Both values sit in the quiet zone → nothing published.
//! assert!(machine.on_epsilon_update("ctx", 0.08, 0.05).is_none());
//!
//! // none → tense → exactly one surprise-spike.
//! assert!(machine.on_epsilon_update("ctx", 0.5, 0.05).is_some());
//! ```

use std::sync::Arc;

use signals_bus::{EventBus, PublishReport};
use signals_types::{EnergyClass, EventPayload, GuardState, RelationalEvent};
use tracing::{debug, instrument, trace};

use crate::thresholds::Thresholds;

/// Bridge between the governance signals and the relational event bus.
#[derive(Debug, Clone)]
pub struct RelationalStateMachine {
    thresholds: Thresholds,
    bus: Arc<EventBus>,
}

impl RelationalStateMachine {
    /// Build a machine over already-validated `thresholds`.
    pub fn new(thresholds: Thresholds, bus: Arc<EventBus>) -> Self {
        Self { thresholds, bus }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    // ── Surprise / ε ─────────────────────────────────────────────────────────

    /// Report a new ε value.
    ///
    /// Publishes a surprise-spike only when `epsilon` lands in a different
    /// zone than `prev_epsilon` and that zone is not "none".
    #[instrument(level = "debug", skip(self))]
    pub fn on_epsilon_update(
        &self,
        context_id: &str,
        epsilon: f64,
        prev_epsilon: f64,
    ) -> Option<PublishReport> {
        let bands = &self.thresholds.surprise;
        let prev_zone = bands.zone(prev_epsilon);
        let new_zone = bands.zone(epsilon);

        if new_zone == prev_zone {
            trace!(zone = ?new_zone, "surprise zone unchanged");
            return None;
        }
        let Some(level) = new_zone.level() else {
            trace!(from = ?prev_zone, "surprise settled into quiet zone");
            return None;
        };

        Some(self.emit(
            context_id,
            EventPayload::SurpriseSpike {
                epsilon,
                prev_epsilon,
                level,
            },
        ))
    }

    // ── Grounding / vitals ───────────────────────────────────────────────────

    /// Report a change of the Safety and Regulation vitals.
    ///
    /// Suppressed when both deltas are smaller than `min_delta`.
    #[instrument(level = "debug", skip(self))]
    pub fn on_grounding_update(
        &self,
        context_id: &str,
        prev_safety: f64,
        new_safety: f64,
        prev_regulation: f64,
        new_regulation: f64,
    ) -> Option<PublishReport> {
        let Some(shift) =
            self.thresholds
                .grounding
                .assess(prev_safety, new_safety, prev_regulation, new_regulation)
        else {
            trace!(min_delta = self.thresholds.grounding.min_delta, "grounding change below sensitivity");
            return None;
        };

        Some(self.emit(
            context_id,
            EventPayload::GroundingShift {
                prev_safety,
                new_safety,
                prev_regulation,
                new_regulation,
                delta_safety: shift.delta_safety,
                delta_regulation: shift.delta_regulation,
                direction: shift.direction,
            },
        ))
    }

    // ── Gate drag / consent cost ─────────────────────────────────────────────

    /// Report that a consent gate crossing was considered or executed.
    /// Every consideration is published, light ones included.
    #[instrument(level = "debug", skip(self))]
    pub fn on_gate_drag(
        &self,
        context_id: &str,
        gate_id: &str,
        cost: i64,
        energy_class: EnergyClass,
    ) -> PublishReport {
        let level = self.thresholds.drag_cost.level(cost);
        self.emit(
            context_id,
            EventPayload::GateDrag {
                gate_id: gate_id.to_string(),
                cost,
                energy_class,
                level,
            },
        )
    }

    // ── Pocket rooms ─────────────────────────────────────────────────────────

    #[instrument(level = "debug", skip(self))]
    pub fn on_pocket_spawn(
        &self,
        context_id: &str,
        room_id: &str,
        reason: &str,
        depth: u32,
    ) -> PublishReport {
        self.emit(
            context_id,
            EventPayload::PocketSpawn {
                room_id: room_id.to_string(),
                reason: reason.to_string(),
                depth,
            },
        )
    }

    #[instrument(level = "debug", skip(self))]
    pub fn on_pocket_merge(
        &self,
        context_id: &str,
        room_id: &str,
        delta_safety: f64,
        delta_consent: f64,
        delta_regulation: f64,
    ) -> PublishReport {
        self.emit(
            context_id,
            EventPayload::PocketMerge {
                room_id: room_id.to_string(),
                delta_safety,
                delta_consent,
                delta_regulation,
            },
        )
    }

    #[instrument(level = "debug", skip(self))]
    pub fn on_pocket_archive(&self, context_id: &str, room_id: &str, reason: &str) -> PublishReport {
        self.emit(
            context_id,
            EventPayload::PocketArchive {
                room_id: room_id.to_string(),
                reason: reason.to_string(),
            },
        )
    }

    // ── Sanctuary guard ──────────────────────────────────────────────────────

    #[instrument(level = "debug", skip(self))]
    pub fn on_sanctuary_guard(&self, context_id: &str, state: GuardState) -> PublishReport {
        self.emit(context_id, EventPayload::SanctuaryGuard { state })
    }

    fn emit(&self, context_id: &str, payload: EventPayload) -> PublishReport {
        let event = RelationalEvent::new(context_id, payload);
        let report = self.bus.publish(&event);
        debug!(
            kind = %event.kind(),
            context_id,
            delivered = report.delivered,
            faults = report.faults.len(),
            "relational event emitted"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signals_types::{DragLevel, EventKind, GroundingDirection, SignalError, SurpriseLevel};
    use std::sync::Mutex;

    /// Machine with reference bands plus a log of every published event.
    fn harness() -> (RelationalStateMachine, Arc<Mutex<Vec<RelationalEvent>>>) {
        let bus = Arc::new(EventBus::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        bus.subscribe(
            move |e: &RelationalEvent| {
                sink.lock().unwrap().push(e.clone());
                Ok(())
            },
            None,
        );
        (RelationalStateMachine::new(Thresholds::default(), bus), log)
    }

    #[test]
    fn calm_epsilon_update_is_silent() {
        let (machine, log) = harness();
        assert!(machine.on_epsilon_update("demo", 0.08, 0.05).is_none());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn crossing_into_tense_emits_one_spike() {
        let (machine, log) = harness();
        let report = machine.on_epsilon_update("demo", 0.5, 0.05).unwrap();
        assert_eq!(report.kind, EventKind::SurpriseSpike);

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].context_id, "demo");
        assert_eq!(
            log[0].payload,
            EventPayload::SurpriseSpike {
                epsilon: 0.5,
                prev_epsilon: 0.05,
                level: SurpriseLevel::Tense,
            }
        );
    }

    #[test]
    fn same_zone_update_is_silent() {
        let (machine, log) = harness();
        assert!(machine.on_epsilon_update("demo", 0.6, 0.5).is_none());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn downward_move_into_non_quiet_zone_still_emits() {
        let (machine, log) = harness();
        machine.on_epsilon_update("demo", 0.3, 0.9).unwrap();
        let log = log.lock().unwrap();
        assert!(matches!(
            log[0].payload,
            EventPayload::SurpriseSpike {
                level: SurpriseLevel::Curious,
                ..
            }
        ));
    }

    #[test]
    fn settling_into_quiet_zone_is_silent() {
        let (machine, _) = harness();
        assert!(machine.on_epsilon_update("demo", 0.1, 0.9).is_none());
    }

    #[test]
    fn unchanged_vitals_are_suppressed() {
        let (machine, log) = harness();
        assert!(machine.on_grounding_update("demo", 0.8, 0.8, 0.8, 0.8).is_none());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn grounding_dip_emits_down_shift() {
        let (machine, log) = harness();
        machine.on_grounding_update("demo", 0.8, 0.7, 0.8, 0.7).unwrap();

        let log = log.lock().unwrap();
        let EventPayload::GroundingShift {
            prev_safety,
            new_safety,
            delta_safety,
            delta_regulation,
            direction,
            ..
        } = log[0].payload
        else {
            panic!("expected grounding shift, got {:?}", log[0].payload);
        };
        assert_eq!(direction, GroundingDirection::Down);
        assert_eq!((prev_safety, new_safety), (0.8, 0.7));
        assert!((delta_safety + 0.1).abs() < 1e-9);
        assert!((delta_regulation + 0.1).abs() < 1e-9);
    }

    #[test]
    fn grounding_recovery_emits_up_shift() {
        let (machine, log) = harness();
        machine.on_grounding_update("demo", 0.7, 0.75, 0.7, 0.74).unwrap();
        assert!(matches!(
            log.lock().unwrap()[0].payload,
            EventPayload::GroundingShift {
                direction: GroundingDirection::Up,
                ..
            }
        ));
    }

    #[test]
    fn gate_drag_always_emits_with_level() {
        let (machine, log) = harness();
        machine.on_gate_drag("demo", "truth_vs_keeping_you", 45, EnergyClass::Macro);
        machine.on_gate_drag("demo", "small_ask", 3, EnergyClass::Micro);

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(
            log[0].payload,
            EventPayload::GateDrag {
                gate_id: "truth_vs_keeping_you".to_string(),
                cost: 45,
                energy_class: EnergyClass::Macro,
                level: DragLevel::Moderate,
            }
        );
        assert!(matches!(
            log[1].payload,
            EventPayload::GateDrag {
                level: DragLevel::Light,
                ..
            }
        ));
    }

    #[test]
    fn lifecycle_events_pass_fields_through() {
        let (machine, log) = harness();
        machine.on_pocket_spawn("demo", "room:truth_tension", "ethical_conflict", 1);
        machine.on_pocket_merge("demo", "room:truth_tension", 0.05, 0.05, 0.04);
        machine.on_pocket_archive("demo", "room:truth_tension", "destabilized");
        machine.on_sanctuary_guard("demo", GuardState::Active);

        let kinds: Vec<_> = log.lock().unwrap().iter().map(RelationalEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::PocketSpawn,
                EventKind::PocketMerge,
                EventKind::PocketArchive,
                EventKind::SanctuaryGuard,
            ]
        );
        assert_eq!(
            log.lock().unwrap()[0].payload,
            EventPayload::PocketSpawn {
                room_id: "room:truth_tension".to_string(),
                reason: "ethical_conflict".to_string(),
                depth: 1,
            }
        );
    }

    #[test]
    fn subscriber_faults_surface_in_report() {
        let (machine, _) = harness();
        machine
            .bus()
            .subscribe(|_| Err(SignalError::channel("ledger", "disk full")), None);
        let report = machine.on_sanctuary_guard("demo", GuardState::Released);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.faults.len(), 1);
    }
}
