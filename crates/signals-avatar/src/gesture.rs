//! Gesture planning – small, honest physical responses to relational events.
//!
//! [`plan_for_event`] is a pure projection from a [`RelationalEvent`] to a
//! [`GesturePlan`].  It never fails: every kind and sub-case has a fixed plan,
//! except a light gate-drag which has no physical response at all.
//!
//! | Event | Plan |
//! |---|---|
//! | surprise curious | freeze 80 ms, inhale, gaze flicker |
//! | surprise tense | freeze 120 ms, inhale, gaze flicker, shoulders close, weight back |
//! | surprise destabilized | freeze 180 ms, inhale, gaze flicker, shoulders close, weight back, head down |
//! | grounding up | sternum lift, shoulders release |
//! | grounding down | shoulders close, head down |
//! | gate-drag light | – |
//! | gate-drag moderate | weight back |
//! | gate-drag heavy | weight back, shoulders close |
//! | pocket spawn | freeze 100 ms, head down |
//! | pocket merge | sternum lift, shoulders release |
//! | pocket archive | head down, shoulders close |
//! | sanctuary active | shield up, shoulders close, weight back |
//! | sanctuary released | shoulders release |

use std::fmt;

use serde::{Deserialize, Serialize};
use signals_types::{DragLevel, EventPayload, GroundingDirection, GuardState, RelationalEvent, SurpriseLevel};

/// High-level micro-gesture description.
///
/// Animation back-ends interpret these fields into bone and pose changes.
/// Field order is the order [`GesturePlan::describe`] lists them in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GesturePlan {
    /// Brief stillness before the rest of the plan, in milliseconds.
    pub freeze_ms: u32,
    pub inhale: bool,
    pub gaze_flicker: bool,
    pub sternum_lift: bool,
    pub shoulders_release: bool,
    pub shoulders_close: bool,
    pub weight_shift_back: bool,
    pub head_tilt_down: bool,
    pub shield_up: bool,
}

impl GesturePlan {
    /// `true` when the plan starts with a freeze.
    pub fn freezes(&self) -> bool {
        self.freeze_ms > 0
    }

    /// Boolean flags in declaration order, paired with their names.
    pub fn flags(&self) -> [(&'static str, bool); 8] {
        [
            ("inhale", self.inhale),
            ("gaze_flicker", self.gaze_flicker),
            ("sternum_lift", self.sternum_lift),
            ("shoulders_release", self.shoulders_release),
            ("shoulders_close", self.shoulders_close),
            ("weight_shift_back", self.weight_shift_back),
            ("head_tilt_down", self.head_tilt_down),
            ("shield_up", self.shield_up),
        ]
    }

    /// Human-debug rendering: the set flags in declaration order, then
    /// `freeze=<ms>ms` when the plan freezes.
    ///
    /// ```
    /// use signals_avatar::GesturePlan;
    ///
    /// let plan = GesturePlan { freeze_ms: 80, inhale: true, gaze_flicker: true, ..Default::default() };
    /// assert_eq!(plan.describe(), "inhale, gaze_flicker, freeze=80ms");
    /// ```
    pub fn describe(&self) -> String {
        let mut active: Vec<String> = self
            .flags()
            .into_iter()
            .filter(|(_, on)| *on)
            .map(|(name, _)| name.to_string())
            .collect();
        if self.freezes() {
            active.push(format!("freeze={}ms", self.freeze_ms));
        }
        active.join(", ")
    }
}

impl fmt::Display for GesturePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Plan the avatar's response to `event`, or `None` when it has no physical
/// expression.
pub fn plan_for_event(event: &RelationalEvent) -> Option<GesturePlan> {
    plan_for_payload(&event.payload)
}

/// Same as [`plan_for_event`], for a bare payload.
pub fn plan_for_payload(payload: &EventPayload) -> Option<GesturePlan> {
    let plan = match payload {
        EventPayload::SurpriseSpike { level, .. } => match level {
            SurpriseLevel::Curious => GesturePlan {
                freeze_ms: 80,
                inhale: true,
                gaze_flicker: true,
                ..Default::default()
            },
            SurpriseLevel::Tense => GesturePlan {
                freeze_ms: 120,
                inhale: true,
                gaze_flicker: true,
                shoulders_close: true,
                weight_shift_back: true,
                ..Default::default()
            },
            SurpriseLevel::Destabilized => GesturePlan {
                freeze_ms: 180,
                inhale: true,
                gaze_flicker: true,
                shoulders_close: true,
                weight_shift_back: true,
                head_tilt_down: true,
                ..Default::default()
            },
        },

        EventPayload::GroundingShift { direction, .. } => match direction {
            GroundingDirection::Up => GesturePlan {
                sternum_lift: true,
                shoulders_release: true,
                ..Default::default()
            },
            GroundingDirection::Down => GesturePlan {
                shoulders_close: true,
                head_tilt_down: true,
                ..Default::default()
            },
        },

        EventPayload::GateDrag { level, .. } => match level {
            DragLevel::Light => return None,
            DragLevel::Moderate => GesturePlan {
                weight_shift_back: true,
                ..Default::default()
            },
            DragLevel::Heavy => GesturePlan {
                weight_shift_back: true,
                shoulders_close: true,
                ..Default::default()
            },
        },

        EventPayload::PocketSpawn { .. } => GesturePlan {
            freeze_ms: 100,
            head_tilt_down: true,
            ..Default::default()
        },

        EventPayload::PocketMerge { .. } => GesturePlan {
            sternum_lift: true,
            shoulders_release: true,
            ..Default::default()
        },

        EventPayload::PocketArchive { .. } => GesturePlan {
            head_tilt_down: true,
            shoulders_close: true,
            ..Default::default()
        },

        EventPayload::SanctuaryGuard { state } => match state {
            GuardState::Active => GesturePlan {
                shield_up: true,
                shoulders_close: true,
                weight_shift_back: true,
                ..Default::default()
            },
            GuardState::Released => GesturePlan {
                shoulders_release: true,
                ..Default::default()
            },
        },
    };
    Some(plan)
}
