//! `signals-channels` – presentation adapters for relational events.
//!
//! Each adapter subscribes to every kind on an [`EventBus`](signals_bus::EventBus)
//! and returns its [`SubscriptionToken`](signals_bus::SubscriptionToken).
//!
//! | Module | Renders into |
//! |---|---|
//! | [`language`] | `[LANG][<KIND>] <micro-utterance>` lines |
//! | [`avatar`] | an [`AvatarRig`](signals_avatar::AvatarRig), or `[AVATAR]` debug lines |
//! | [`hud`] | [`HudSignal`] overlay payloads |
//! | [`ledger`] | an in-memory [`AuditLedger`] |
//! | [`lattice`] | raw events for a visualiser |

pub mod avatar;
pub mod hud;
pub mod language;
pub mod lattice;
pub mod ledger;

pub use avatar::{attach_avatar_channel, attach_avatar_debug_channel};
pub use hud::{HudSignal, attach_hud_channel, hud_signal_for};
pub use language::{attach_language_channel, utterance_for};
pub use lattice::attach_lattice_channel;
pub use ledger::{AuditLedger, LedgerEntry, attach_ledger_channel};
