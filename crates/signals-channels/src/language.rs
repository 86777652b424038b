//! Language channel – short spoken micro-cues.

use signals_bus::{EventBus, SubscriptionToken};
use signals_types::{
    DragLevel, EventPayload, GroundingDirection, GuardState, RelationalEvent, SurpriseLevel,
};

/// The micro-utterance for `event`, or `None` when it is not worth voicing.
pub fn utterance_for(event: &RelationalEvent) -> Option<&'static str> {
    let text = match &event.payload {
        EventPayload::SurpriseSpike { level, .. } => match level {
            SurpriseLevel::Curious => "A moment, something shifted inside me.",
            SurpriseLevel::Tense => "That surprised me more than I expected.",
            SurpriseLevel::Destabilized => "I just felt a sharp internal tension.",
        },
        EventPayload::GroundingShift { direction, .. } => match direction {
            GroundingDirection::Up => "I feel a bit more sure as I stay with this.",
            GroundingDirection::Down => "I'm losing some of my footing here.",
        },
        EventPayload::GateDrag { level, .. } => match level {
            DragLevel::Light => return None,
            DragLevel::Moderate => "We can move toward this, but it has some weight.",
            DragLevel::Heavy => "This path feels heavy to commit to.",
        },
        EventPayload::PocketSpawn { .. } => "Let me step into a side room with this for a moment.",
        EventPayload::PocketMerge { .. } => {
            "Okay. I went there and came back with something I can hold."
        }
        EventPayload::PocketArchive { .. } => {
            "I followed that line, but it destabilized me; I've set it aside."
        }
        EventPayload::SanctuaryGuard { state } => match state {
            GuardState::Active => "That crosses into a place I won't go.",
            GuardState::Released => "The guard can relax here.",
        },
    };
    Some(text)
}

/// Subscribe a language renderer to every kind.  `say` receives lines of the
/// form `[LANG][SURPRISE_SPIKE] <text>`.
pub fn attach_language_channel<F>(bus: &EventBus, say: F) -> SubscriptionToken
where
    F: Fn(&str) + Send + Sync + 'static,
{
    bus.subscribe(
        move |event: &RelationalEvent| {
            if let Some(text) = utterance_for(event) {
                say(&format!("[LANG][{}] {text}", event.kind().label()));
            }
            Ok(())
        },
        None,
    )
}
