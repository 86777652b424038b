//! `signals-avatar` – Gesture Planning
//!
//! Derives a structured, deterministic body response from a canonical event.
//! Depends only on the event contract, never on the dispatcher.
//!
//! # Modules
//!
//! - [`gesture`] – [`GesturePlan`] and the pure [`plan_for_event`] projection.
//! - [`rig`] – [`AvatarRig`]: the seam animation back-ends implement, plus
//!   [`RecordingRig`] for headless use.

pub mod gesture;
pub mod rig;

pub use gesture::{GesturePlan, plan_for_event, plan_for_payload};
pub use rig::{AvatarRig, RecordingRig};
