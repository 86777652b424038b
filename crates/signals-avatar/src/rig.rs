//! Generic `AvatarRig` trait for anything that can perform a [`GesturePlan`].
//!
//! Animation back-ends implement this trait; the avatar channel only ever
//! talks to the trait, so rigs can be swapped without touching the decision
//! core or the planner.

use signals_types::SignalError;
use tracing::debug;

use crate::gesture::GesturePlan;

/// An avatar body (3D rig, 2D puppet, robot face, …).
pub trait AvatarRig: Send {
    /// Stable identifier, e.g. `"main_avatar"`.
    fn id(&self) -> &str;

    /// Perform `plan`.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::Channel`] when the rig cannot apply the plan
    /// (e.g. it is detached from its scene).
    fn apply(&mut self, plan: &GesturePlan) -> Result<(), SignalError>;
}

/// In-process rig that remembers every plan it was asked to perform.
///
/// Useful for headless runs and tests.
#[derive(Debug, Default)]
pub struct RecordingRig {
    id: String,
    applied: Vec<GesturePlan>,
}

impl RecordingRig {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            applied: Vec::new(),
        }
    }

    pub fn applied(&self) -> &[GesturePlan] {
        &self.applied
    }

    pub fn last(&self) -> Option<&GesturePlan> {
        self.applied.last()
    }
}

impl AvatarRig for RecordingRig {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, plan: &GesturePlan) -> Result<(), SignalError> {
        debug!(rig = %self.id, plan = %plan, "gesture applied");
        self.applied.push(*plan);
        Ok(())
    }
}
