//! `signals-kernel` – Thresholds & Decision Core
//!
//! Turns continuous internal signals into a small set of canonical events.
//! It does not render anything; it only decides *whether* an update is
//! significant and, if so, publishes it.
//!
//! # Modules
//!
//! - [`thresholds`] – [`Thresholds`]: immutable, validated surprise, drag-cost
//!   and grounding bands loaded from JSON or TOML, plus the pure classifiers
//!   over them.
//! - [`state_machine`] – [`RelationalStateMachine`]: one entry point per
//!   signal source; classifies (previous, new) pairs and publishes onto an
//!   explicitly supplied [`EventBus`][signals_bus::EventBus].
//! - [`update`] – [`SignalUpdate`]: a raw signal report as a value, routed by
//!   [`RelationalStateMachine::apply`].

pub mod state_machine;
pub mod thresholds;
pub mod update;

pub use state_machine::RelationalStateMachine;
pub use thresholds::{
    ConfigError, DragBands, GroundingBands, GroundingShift, SurpriseBands, SurpriseZone, Thresholds,
};
pub use update::SignalUpdate;
