//! `signals-bus` – The Dispatcher
//!
//! Fans a canonical [`RelationalEvent`][signals_types::RelationalEvent] out to
//! any number of independently failing listeners without knowing what the
//! event means.
//!
//! # Modules
//!
//! - [`bus`] – [`EventBus`]: synchronous, kind-filtered publish/subscribe with
//!   per-subscriber fault isolation.

pub mod bus;

pub use bus::{EventBus, FaultCause, PublishReport, SubscriberFault, SubscriberFn, SubscriptionToken};
