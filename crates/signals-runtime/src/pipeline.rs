//! [`SignalPipeline`] – the composition root.
//!
//! Owns one [`EventBus`], the [`RelationalStateMachine`] publishing onto it,
//! and the channel subscriptions it attached.  Nothing here is global: two
//! pipelines never share a bus unless one is passed in with
//! [`SignalPipelineBuilder::with_bus`].

use std::fmt;
use std::sync::{Arc, Mutex};

use signals_avatar::AvatarRig;
use signals_bus::{EventBus, SubscriptionToken};
use signals_channels::{
    AuditLedger, HudSignal, attach_avatar_channel, attach_avatar_debug_channel, attach_hud_channel,
    attach_language_channel, attach_lattice_channel, attach_ledger_channel,
};
use signals_kernel::{RelationalStateMachine, Thresholds};
use signals_types::{RelationalEvent, SignalError};
use tracing::info;

type Attach = Box<dyn FnOnce(&EventBus) -> SubscriptionToken>;

/// Fluent builder returned by [`SignalPipeline::builder`].
///
/// Channels are attached in the order they are added, which is the order
/// they receive each event.
pub struct SignalPipelineBuilder {
    thresholds: Thresholds,
    bus: Option<Arc<EventBus>>,
    ledger: Option<Arc<AuditLedger>>,
    channels: Vec<(&'static str, Attach)>,
}

impl SignalPipelineBuilder {
    /// Publish onto an existing bus instead of a fresh one.
    pub fn with_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn with_language<F>(self, say: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.channel("language", move |bus| attach_language_channel(bus, say))
    }

    pub fn with_avatar<R>(self, rig: Arc<Mutex<R>>) -> Self
    where
        R: AvatarRig + 'static,
    {
        self.channel("avatar", move |bus| attach_avatar_channel(bus, rig))
    }

    pub fn with_avatar_debug<F>(self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.channel("avatar_debug", move |bus| attach_avatar_debug_channel(bus, sink))
    }

    pub fn with_hud<F>(self, emit: F) -> Self
    where
        F: Fn(&HudSignal) + Send + Sync + 'static,
    {
        self.channel("hud", move |bus| attach_hud_channel(bus, emit))
    }

    /// Mirror every event into an in-memory [`AuditLedger`], reachable
    /// afterwards through [`SignalPipeline::ledger`].
    pub fn with_ledger(mut self) -> Self {
        let ledger = Arc::new(AuditLedger::new());
        self.ledger = Some(Arc::clone(&ledger));
        self.channel("ledger", move |bus| attach_ledger_channel(bus, ledger))
    }

    pub fn with_lattice<F>(self, apply: F) -> Self
    where
        F: Fn(&RelationalEvent) -> Result<(), SignalError> + Send + Sync + 'static,
    {
        self.channel("lattice", move |bus| attach_lattice_channel(bus, apply))
    }

    pub fn build(self) -> SignalPipeline {
        let bus = self.bus.unwrap_or_else(|| Arc::new(EventBus::new()));
        let channels: Vec<(&'static str, SubscriptionToken)> = self
            .channels
            .into_iter()
            .map(|(name, attach)| (name, attach(&bus)))
            .collect();
        info!(
            channels = ?channels.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            "signal pipeline wired"
        );
        let machine = RelationalStateMachine::new(self.thresholds, Arc::clone(&bus));
        SignalPipeline {
            bus,
            machine,
            ledger: self.ledger,
            channels,
        }
    }

    fn channel<F>(mut self, name: &'static str, attach: F) -> Self
    where
        F: FnOnce(&EventBus) -> SubscriptionToken + 'static,
    {
        self.channels.push((name, Box::new(attach)));
        self
    }
}

/// A wired decision core plus its presentation channels.
pub struct SignalPipeline {
    bus: Arc<EventBus>,
    machine: RelationalStateMachine,
    ledger: Option<Arc<AuditLedger>>,
    channels: Vec<(&'static str, SubscriptionToken)>,
}

impl SignalPipeline {
    pub fn builder(thresholds: Thresholds) -> SignalPipelineBuilder {
        SignalPipelineBuilder {
            thresholds,
            bus: None,
            ledger: None,
            channels: Vec::new(),
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn machine(&self) -> &RelationalStateMachine {
        &self.machine
    }

    /// The audit ledger, when [`SignalPipelineBuilder::with_ledger`] was used.
    pub fn ledger(&self) -> Option<&Arc<AuditLedger>> {
        self.ledger.as_ref()
    }

    /// Attached channels by name, in delivery order.
    pub fn channels(&self) -> &[(&'static str, SubscriptionToken)] {
        &self.channels
    }

    /// Unsubscribe every channel this pipeline attached.  Returns how many
    /// subscriptions were removed; a second call removes nothing.
    pub fn detach(&mut self) -> usize {
        let removed = self
            .channels
            .drain(..)
            .filter(|(_, token)| self.bus.unsubscribe(*token))
            .count();
        info!(removed, "signal pipeline detached");
        removed
    }
}

impl fmt::Debug for SignalPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalPipeline")
            .field("channels", &self.channels)
            .field("ledger_entries", &self.ledger.as_ref().map(|l| l.len()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signals_types::GuardState;

    #[test]
    fn build_attaches_channels_in_order() {
        let pipeline = SignalPipeline::builder(Thresholds::default())
            .with_language(|_| {})
            .with_ledger()
            .with_hud(|_| {})
            .build();

        let names: Vec<_> = pipeline.channels().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["language", "ledger", "hud"]);
        assert_eq!(pipeline.bus().subscriber_count(), 3);
        assert!(pipeline.ledger().is_some());
    }

    #[test]
    fn ledger_absent_unless_requested() {
        let pipeline = SignalPipeline::builder(Thresholds::default()).build();
        assert!(pipeline.ledger().is_none());
        assert!(pipeline.channels().is_empty());
    }

    #[test]
    fn detach_removes_only_own_subscriptions() {
        let bus = Arc::new(EventBus::new());
        bus.subscribe(|_: &RelationalEvent| Ok(()), None);

        let mut pipeline = SignalPipeline::builder(Thresholds::default())
            .with_bus(Arc::clone(&bus))
            .with_ledger()
            .with_lattice(|_| Ok(()))
            .build();
        assert_eq!(bus.subscriber_count(), 3);

        assert_eq!(pipeline.detach(), 2);
        assert_eq!(pipeline.detach(), 0);
        assert_eq!(bus.subscriber_count(), 1);

        let report = pipeline.machine().on_sanctuary_guard("ctx", GuardState::Active);
        assert_eq!(report.delivered, 1);
        assert_eq!(pipeline.ledger().map(|l| l.len()), Some(0));
    }
}
