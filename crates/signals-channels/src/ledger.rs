//! Ledger channel – an in-memory audit mirror of every published event.
//!
//! Each [`LedgerEntry`] keeps the event's timestamp, kind and context next to
//! its kind-specific fields as plain JSON, so the ledger can be dumped or
//! shipped to an external audit store without knowing the payload types.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use signals_bus::{EventBus, SubscriptionToken};
use signals_types::{EventKind, RelationalEvent, SignalError};
use tracing::debug;

/// A single audit record.
///
/// On the wire the kind is `type` (upper-snake label) and the context is
/// `ctx_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub ts: DateTime<Utc>,
    #[serde(rename = "type", with = "signals_types::kind_label")]
    pub kind: EventKind,
    #[serde(rename = "ctx_id")]
    pub context_id: String,
    /// The kind-specific fields, without the `kind` tag.
    pub payload: Value,
}

impl LedgerEntry {
    pub fn from_event(event: &RelationalEvent) -> Result<Self, SignalError> {
        let mut tagged = serde_json::to_value(&event.payload)
            .map_err(|e| SignalError::Serialization(e.to_string()))?;
        let payload = tagged.get_mut("payload").map(Value::take).unwrap_or(Value::Null);
        Ok(Self {
            ts: event.timestamp,
            kind: event.kind(),
            context_id: event.context_id.clone(),
            payload,
        })
    }
}

/// Append-only, thread-safe list of [`LedgerEntry`] values.
#[derive(Debug, Default)]
pub struct AuditLedger {
    entries: Mutex<Vec<LedgerEntry>>,
}

impl AuditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the audit record for `event`.
    pub fn record(&self, event: &RelationalEvent) -> Result<(), SignalError> {
        let entry = LedgerEntry::from_event(event)?;
        debug!(kind = %entry.kind, context_id = %entry.context_id, "ledger append");
        self.lock().push(entry);
        Ok(())
    }

    /// Snapshot of every entry, oldest first.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The oldest `n` entries.
    pub fn head(&self, n: usize) -> Vec<LedgerEntry> {
        self.lock().iter().take(n).cloned().collect()
    }

    /// The newest `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> Vec<LedgerEntry> {
        let entries = self.lock();
        let start = entries.len().saturating_sub(n);
        entries[start..].to_vec()
    }

    /// Pretty-printed JSON array of the oldest `n` entries.
    pub fn to_json_pretty(&self, n: usize) -> Result<String, SignalError> {
        serde_json::to_string_pretty(&self.head(n))
            .map_err(|e| SignalError::Serialization(e.to_string()))
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LedgerEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Mirror every published event into `ledger`.
pub fn attach_ledger_channel(bus: &EventBus, ledger: Arc<AuditLedger>) -> SubscriptionToken {
    bus.subscribe(move |event: &RelationalEvent| ledger.record(event), None)
}
