//! HUD channel – compact, render-ready overlay signals.

use serde::{Deserialize, Serialize};
use signals_bus::{EventBus, SubscriptionToken};
use signals_types::{
    DragLevel, EventKind, EventPayload, GroundingDirection, GuardState, RelationalEvent,
    SurpriseLevel,
};

/// One overlay instruction, tagged by `hud_type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "hud_type", rename_all = "snake_case")]
pub enum HudSignal {
    RingPulse {
        level: SurpriseLevel,
        epsilon: f64,
    },
    GroundingBar {
        direction: GroundingDirection,
        delta_safety: f64,
        delta_regulation: f64,
    },
    ViscousConfirm {
        level: DragLevel,
        cost: i64,
    },
    /// Shared by all three pocket-room kinds; `event` says which, as its
    /// upper-snake label.
    PocketBreadcrumb {
        #[serde(with = "signals_types::kind_label")]
        event: EventKind,
        room_id: String,
    },
    SanctuaryShield {
        state: GuardState,
    },
}

pub fn hud_signal_for(event: &RelationalEvent) -> HudSignal {
    match &event.payload {
        EventPayload::SurpriseSpike { epsilon, level, .. } => HudSignal::RingPulse {
            level: *level,
            epsilon: *epsilon,
        },
        EventPayload::GroundingShift {
            delta_safety,
            delta_regulation,
            direction,
            ..
        } => HudSignal::GroundingBar {
            direction: *direction,
            delta_safety: *delta_safety,
            delta_regulation: *delta_regulation,
        },
        EventPayload::GateDrag { cost, level, .. } => HudSignal::ViscousConfirm {
            level: *level,
            cost: *cost,
        },
        EventPayload::PocketSpawn { room_id, .. }
        | EventPayload::PocketMerge { room_id, .. }
        | EventPayload::PocketArchive { room_id, .. } => HudSignal::PocketBreadcrumb {
            event: event.kind(),
            room_id: room_id.clone(),
        },
        EventPayload::SanctuaryGuard { state } => HudSignal::SanctuaryShield { state: *state },
    }
}

/// Subscribe `emit` to every kind; it receives one [`HudSignal`] per event.
pub fn attach_hud_channel<F>(bus: &EventBus, emit: F) -> SubscriptionToken
where
    F: Fn(&HudSignal) + Send + Sync + 'static,
{
    bus.subscribe(
        move |event: &RelationalEvent| {
            emit(&hud_signal_for(event));
            Ok(())
        },
        None,
    )
}
