//! Lattice channel – raw event pass-through for visualisers.

use signals_bus::{EventBus, SubscriptionToken};
use signals_types::{RelationalEvent, SignalError};

/// Forward every event, unchanged, to `apply`.  Errors from `apply` are
/// reported as subscriber faults.
pub fn attach_lattice_channel<F>(bus: &EventBus, apply: F) -> SubscriptionToken
where
    F: Fn(&RelationalEvent) -> Result<(), SignalError> + Send + Sync + 'static,
{
    bus.subscribe(apply, None)
}
