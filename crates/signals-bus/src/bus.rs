//! Synchronous, kind-filtered publish/subscribe event bus.
//!
//! [`EventBus::publish`] is a plain function call into every matching
//! subscriber, in registration order, before it returns.  Nothing is queued,
//! retried, or delivered later, and the bus has no "full" state.
//!
//! # Fault policy
//!
//! Isolate and report.  A subscriber that returns an error or panics does not
//! stop the fan-out: every remaining subscriber still runs, and the collected
//! faults come back to the publisher in the [`PublishReport`] (each one is
//! also logged at `warn`).
//!
//! # Locking
//!
//! The registry sits behind one [`Mutex`] that is held only while mutating or
//! snapshotting it, never while a callback runs.  A callback may therefore
//! call [`EventBus::subscribe`] or [`EventBus::unsubscribe`] on the same bus.
//! Subscriptions added during a publish do not see the event in flight.
//! A subscription removed during a publish is not invoked once
//! [`EventBus::unsubscribe`] has returned, even if it matched the event.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use signals_types::{EventKind, RelationalEvent, SignalError};
use tracing::{trace, warn};

/// Callback invoked for each matching event.
pub type SubscriberFn = dyn Fn(&RelationalEvent) -> Result<(), SignalError> + Send + Sync;

/// Handle returned by [`EventBus::subscribe`].
///
/// Tokens increase monotonically and are never reused by the bus that issued
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Fault reporting
// ---------------------------------------------------------------------------

/// Why a single subscriber failed during a publish.
#[derive(Debug, Clone, PartialEq)]
pub enum FaultCause {
    /// The callback returned an error.
    Error(SignalError),
    /// The callback panicked; the panic message, when it was a string.
    Panic(String),
}

impl fmt::Display for FaultCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultCause::Error(e) => write!(f, "{e}"),
            FaultCause::Panic(msg) => write!(f, "panicked: {msg}"),
        }
    }
}

/// A fault raised by one subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriberFault {
    pub token: SubscriptionToken,
    pub cause: FaultCause,
}

/// Outcome of one [`EventBus::publish`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReport {
    pub kind: EventKind,
    /// Number of subscribers that ran to completion without a fault.
    pub delivered: usize,
    pub faults: Vec<SubscriberFault>,
}

impl PublishReport {
    /// `true` when every matching subscriber succeeded.
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }

    /// Total number of subscribers that were invoked.
    pub fn attempted(&self) -> usize {
        self.delivered + self.faults.len()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

struct Subscription {
    callback: Arc<SubscriberFn>,
    /// `None` means every kind.
    kinds: Option<HashSet<EventKind>>,
}

impl Subscription {
    fn accepts(&self, kind: EventKind) -> bool {
        self.kinds.as_ref().is_none_or(|k| k.contains(&kind))
    }
}

/// The relational event dispatcher.
///
/// Share it with `Arc<EventBus>`; every method takes `&self`.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use signals_bus::EventBus;
/// use signals_types::{EventKind, EventPayload, GuardState, RelationalEvent};
///
/// let bus = EventBus::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// bus.subscribe(
///     move |e: &RelationalEvent| {
///         sink.lock().unwrap().push(e.kind());
///         Ok(())
///     },
///     Some(&[EventKind::SanctuaryGuard]),
/// );
///
/// let event = RelationalEvent::new("ctx", EventPayload::SanctuaryGuard { state: GuardState::Active });
/// let report = bus.publish(&event);
/// assert_eq!(report.delivered, 1);
/// assert_eq!(*seen.lock().unwrap(), vec![EventKind::SanctuaryGuard]);
/// ```
pub struct EventBus {
    registry: Mutex<BTreeMap<SubscriptionToken, Subscription>>,
    next_token: AtomicU64,
}

impl EventBus {
    /// Create a bus with no subscribers.  The first token issued is 1.
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(BTreeMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Register `callback` for events whose kind is in `kinds`, or for every
    /// event when `kinds` is `None`.
    ///
    /// An empty slice is treated the same as `None`.
    pub fn subscribe<F>(&self, callback: F, kinds: Option<&[EventKind]>) -> SubscriptionToken
    where
        F: Fn(&RelationalEvent) -> Result<(), SignalError> + Send + Sync + 'static,
    {
        let kinds = kinds
            .filter(|k| !k.is_empty())
            .map(|k| k.iter().copied().collect::<HashSet<_>>());
        // Issue the token under the registry lock so token order is
        // registration order.
        let mut registry = self.registry();
        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        trace!(%token, filter = ?kinds, "subscriber registered");
        registry.insert(
            token,
            Subscription {
                callback: Arc::new(callback),
                kinds,
            },
        );
        token
    }

    /// Remove the registration for `token`.
    ///
    /// Unknown or already-removed tokens are a no-op.  Returns whether a
    /// subscription was actually removed.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let removed = self.registry().remove(&token).is_some();
        trace!(%token, removed, "unsubscribe");
        removed
    }

    /// Invoke every matching subscriber with `event`, in registration order.
    pub fn publish(&self, event: &RelationalEvent) -> PublishReport {
        let kind = event.kind();
        let targets: Vec<(SubscriptionToken, Arc<SubscriberFn>)> = self
            .registry()
            .iter()
            .filter(|(_, sub)| sub.accepts(kind))
            .map(|(token, sub)| (*token, Arc::clone(&sub.callback)))
            .collect();

        let mut report = PublishReport {
            kind,
            delivered: 0,
            faults: Vec::new(),
        };

        for (token, callback) in targets {
            if !self.registry().contains_key(&token) {
                trace!(%token, "skipping subscriber removed mid-publish");
                continue;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (*callback)(event)));
            let cause = match outcome {
                Ok(Ok(())) => {
                    report.delivered += 1;
                    continue;
                }
                Ok(Err(e)) => FaultCause::Error(e),
                Err(payload) => FaultCause::Panic(panic_message(payload.as_ref())),
            };
            warn!(%token, kind = %kind, context_id = %event.context_id, %cause, "subscriber fault");
            report.faults.push(SubscriberFault { token, cause });
        }

        trace!(kind = %kind, delivered = report.delivered, faults = report.faults.len(), "published");
        report
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.registry().len()
    }

    fn registry(&self) -> MutexGuard<'_, BTreeMap<SubscriptionToken, Subscription>> {
        // Callbacks never run under the lock, so a poisoned registry is still
        // structurally sound.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("next_token", &self.next_token.load(Ordering::Relaxed))
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signals_types::{DragLevel, EnergyClass, EventPayload, GroundingDirection, GuardState};

    fn guard_event() -> RelationalEvent {
        RelationalEvent::new(
            "test",
            EventPayload::SanctuaryGuard {
                state: GuardState::Active,
            },
        )
    }

    fn drag_event() -> RelationalEvent {
        RelationalEvent::new(
            "test",
            EventPayload::GateDrag {
                gate_id: "g1".to_string(),
                cost: 10,
                energy_class: EnergyClass::Micro,
                level: DragLevel::Light,
            },
        )
    }

    fn grounding_event() -> RelationalEvent {
        RelationalEvent::new(
            "test",
            EventPayload::GroundingShift {
                prev_safety: 0.8,
                new_safety: 0.7,
                prev_regulation: 0.8,
                new_regulation: 0.7,
                delta_safety: -0.1,
                delta_regulation: -0.1,
                direction: GroundingDirection::Down,
            },
        )
    }

    /// Subscriber that appends `tag` to a shared log.
    fn recorder(
        log: &Arc<Mutex<Vec<&'static str>>>,
        tag: &'static str,
    ) -> impl Fn(&RelationalEvent) -> Result<(), SignalError> + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |_: &RelationalEvent| {
            log.lock().unwrap().push(tag);
            Ok(())
        }
    }

    #[test]
    fn tokens_are_unique_and_increasing() {
        let bus = EventBus::new();
        let a = bus.subscribe(|_| Ok(()), None);
        let b = bus.subscribe(|_| Ok(()), None);
        bus.unsubscribe(a);
        let c = bus.subscribe(|_| Ok(()), None);
        assert_eq!(a.value(), 1);
        assert!(a < b && b < c);
        assert_ne!(c, a, "removed tokens are never reissued");
    }

    #[test]
    fn fan_out_runs_in_registration_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(recorder(&log, "first"), Some(&[EventKind::SanctuaryGuard]));
        bus.subscribe(recorder(&log, "second"), Some(&[EventKind::SanctuaryGuard]));

        let report = bus.publish(&guard_event());
        assert_eq!(report.delivered, 2);
        assert!(report.is_clean());
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribed_callback_is_not_invoked() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = bus.subscribe(recorder(&log, "first"), Some(&[EventKind::SanctuaryGuard]));
        bus.subscribe(recorder(&log, "second"), Some(&[EventKind::SanctuaryGuard]));

        assert!(bus.unsubscribe(first));
        bus.publish(&guard_event());
        assert_eq!(*log.lock().unwrap(), vec!["second"]);
    }

    #[test]
    fn unknown_token_unsubscribe_is_noop() {
        let bus = EventBus::new();
        let token = bus.subscribe(|_| Ok(()), None);
        assert!(bus.unsubscribe(token));
        assert!(!bus.unsubscribe(token));
        assert!(!bus.unsubscribe(SubscriptionToken(999)));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn filtered_subscriber_skips_other_kinds() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(recorder(&log, "drag"), Some(&[EventKind::GateDrag]));

        let report = bus.publish(&grounding_event());
        assert_eq!(report.attempted(), 0);
        assert!(log.lock().unwrap().is_empty());

        bus.publish(&drag_event());
        assert_eq!(*log.lock().unwrap(), vec!["drag"]);
    }

    #[test]
    fn empty_filter_means_every_kind() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(recorder(&log, "all"), Some(&[]));
        bus.publish(&grounding_event());
        bus.publish(&drag_event());
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn erroring_subscriber_does_not_stop_fan_out() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(recorder(&log, "before"), None);
        let bad = bus.subscribe(|_| Err(SignalError::channel("hud", "display gone")), None);
        bus.subscribe(recorder(&log, "after"), None);

        let report = bus.publish(&guard_event());
        assert_eq!(report.delivered, 2);
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].token, bad);
        assert!(matches!(report.faults[0].cause, FaultCause::Error(SignalError::Channel { .. })));
        assert_eq!(*log.lock().unwrap(), vec!["before", "after"]);
    }

    #[test]
    fn panicking_subscriber_is_isolated() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let bad = bus.subscribe(|_| panic!("rig exploded"), None);
        bus.subscribe(recorder(&log, "survivor"), None);

        let report = bus.publish(&guard_event());
        assert_eq!(report.delivered, 1);
        assert_eq!(
            report.faults,
            vec![SubscriberFault {
                token: bad,
                cause: FaultCause::Panic("rig exploded".to_string()),
            }]
        );
        assert_eq!(*log.lock().unwrap(), vec!["survivor"]);

        // The bus keeps working after a panic.
        let again = bus.publish(&guard_event());
        assert_eq!(again.attempted(), 2);
    }

    #[test]
    fn callback_may_reenter_the_bus() {
        let bus = Arc::new(EventBus::new());
        let inner = Arc::clone(&bus);
        let log = Arc::new(Mutex::new(Vec::new()));
        let late_log = Arc::clone(&log);

        bus.subscribe(
            move |_| {
                let late_log = Arc::clone(&late_log);
                inner.subscribe(
                    move |_| {
                        late_log.lock().unwrap().push("late");
                        Ok(())
                    },
                    None,
                );
                Ok(())
            },
            None,
        );

        let report = bus.publish(&guard_event());
        assert_eq!(report.delivered, 1, "late subscriber must not see the event in flight");
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn subscriber_removed_mid_publish_is_skipped() {
        let bus = Arc::new(EventBus::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let target = Arc::new(Mutex::new(None::<SubscriptionToken>));

        let inner = Arc::clone(&bus);
        let pending = Arc::clone(&target);
        let removed = Arc::new(Mutex::new(Vec::new()));
        let removed_log = Arc::clone(&removed);
        bus.subscribe(
            move |_| {
                if let Some(token) = pending.lock().unwrap().take() {
                    removed_log.lock().unwrap().push(inner.unsubscribe(token));
                }
                Ok(())
            },
            None,
        );
        let second = bus.subscribe(recorder(&log, "second"), None);
        *target.lock().unwrap() = Some(second);

        let report = bus.publish(&guard_event());
        assert_eq!(*removed.lock().unwrap(), vec![true]);
        assert!(log.lock().unwrap().is_empty(), "removed subscriber still ran");
        assert_eq!(report.delivered, 1);
        assert!(report.is_clean());
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn concurrent_tokens_follow_registration_order() {
        let bus = Arc::new(EventBus::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let bus = Arc::clone(&bus);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        bus.subscribe(|_| Ok(()), None);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let tokens: Vec<u64> = bus.registry().keys().map(|t| t.value()).collect();
        assert_eq!(tokens, (1..=100).collect::<Vec<_>>());
    }

    #[test]
    fn publish_without_subscribers_is_accepted() {
        let bus = EventBus::default();
        let report = bus.publish(&drag_event());
        assert_eq!(report.kind, EventKind::GateDrag);
        assert_eq!(report.attempted(), 0);
        assert!(report.is_clean());
    }

    #[test]
    fn concurrent_subscribe_and_publish() {
        let bus = Arc::new(EventBus::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let bus = Arc::clone(&bus);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let token = bus.subscribe(|_| Ok(()), None);
                        bus.publish(&guard_event());
                        bus.unsubscribe(token);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(bus.subscriber_count(), 0);
        let next = bus.subscribe(|_| Ok(()), None);
        assert_eq!(next.value(), 201);
    }
}
