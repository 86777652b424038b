//! Avatar channel – drives an [`AvatarRig`] from gesture plans.

use std::sync::{Arc, Mutex};

use signals_avatar::{AvatarRig, plan_for_event};
use signals_bus::{EventBus, SubscriptionToken};
use signals_types::{RelationalEvent, SignalError};

/// Subscribe `rig` to every kind.  Events without a gesture plan are skipped;
/// a rig error becomes a subscriber fault in the publisher's report.
pub fn attach_avatar_channel<R>(bus: &EventBus, rig: Arc<Mutex<R>>) -> SubscriptionToken
where
    R: AvatarRig + 'static,
{
    bus.subscribe(
        move |event: &RelationalEvent| {
            let Some(plan) = plan_for_event(event) else {
                return Ok(());
            };
            let mut rig = rig
                .lock()
                .map_err(|_| SignalError::channel("avatar", "rig lock poisoned"))?;
            rig.apply(&plan)
        },
        None,
    )
}

/// Subscribe a text renderer of gesture plans.  `sink` receives lines of the
/// form `[AVATAR][GATE_DRAG] weight_shift_back`.
pub fn attach_avatar_debug_channel<F>(bus: &EventBus, sink: F) -> SubscriptionToken
where
    F: Fn(&str) + Send + Sync + 'static,
{
    bus.subscribe(
        move |event: &RelationalEvent| {
            if let Some(plan) = plan_for_event(event) {
                sink(&format!("[AVATAR][{}] {}", event.kind().label(), plan.describe()));
            }
            Ok(())
        },
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use signals_avatar::{GesturePlan, RecordingRig};
    use signals_bus::FaultCause;
    use signals_types::{DragLevel, EnergyClass, EventPayload, GuardState};

    struct DetachedRig;

    impl AvatarRig for DetachedRig {
        fn id(&self) -> &str {
            "detached"
        }

        fn apply(&mut self, _plan: &GesturePlan) -> Result<(), SignalError> {
            Err(SignalError::channel("avatar", "rig detached from scene"))
        }
    }

    fn light_drag() -> RelationalEvent {
        RelationalEvent::new(
            "ctx",
            EventPayload::GateDrag {
                gate_id: "g".to_string(),
                cost: 5,
                energy_class: EnergyClass::Micro,
                level: DragLevel::Light,
            },
        )
    }

    fn guard_active() -> RelationalEvent {
        RelationalEvent::new(
            "ctx",
            EventPayload::SanctuaryGuard {
                state: GuardState::Active,
            },
        )
    }

    #[test]
    fn rig_receives_only_planned_events() {
        let bus = EventBus::new();
        let rig = Arc::new(Mutex::new(RecordingRig::new("main_avatar")));
        attach_avatar_channel(&bus, Arc::clone(&rig));

        bus.publish(&light_drag());
        bus.publish(&guard_active());

        let rig = rig.lock().unwrap();
        assert_eq!(rig.applied().len(), 1);
        assert!(rig.applied()[0].shield_up);
    }

    #[test]
    fn rig_error_is_reported_as_fault() {
        let bus = EventBus::new();
        let token = attach_avatar_channel(&bus, Arc::new(Mutex::new(DetachedRig)));

        let report = bus.publish(&guard_active());
        assert_eq!(report.delivered, 0);
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].token, token);
        assert!(matches!(report.faults[0].cause, FaultCause::Error(SignalError::Channel { .. })));
    }

    #[test]
    fn debug_channel_renders_plan() {
        let bus = EventBus::new();
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        attach_avatar_debug_channel(&bus, move |line| sink.lock().unwrap().push(line.to_string()));

        bus.publish(&light_drag());
        bus.publish(&guard_active());

        assert_eq!(
            *lines.lock().unwrap(),
            vec!["[AVATAR][SANCTUARY_GUARD] shoulders_close, weight_shift_back, shield_up".to_string()]
        );
    }
}
