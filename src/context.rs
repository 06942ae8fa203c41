//! Transfer context — the hand-off channel between the listing screen and the
//! settlement screen.
//!
//! The listing screen writes the selected collection target here; the
//! settlement screen reads it back and clears it once an outcome is recorded.
//! Values are opaque JSON records round-tripped through serialization, so the
//! typed layer validates on read: anything absent or malformed is
//! [`ContextMissing`], never a partially-trusted record.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::settlement::{CollectionTarget, SettlementKind};

/// Context key holding a target awaiting a payment.
const KEY_PENDING_PAYMENT: &str = "pendingPayment";
/// Context key holding a target awaiting a failure report.
const KEY_PENDING_FAILURE_REPORT: &str = "pendingFailureReport";

/// No usable settlement target in the transfer context.
///
/// Fatal to the current workflow instance: the caller redirects back to the
/// listing. There is no partial recovery and no retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no pending settlement target in the transfer context")]
pub struct ContextMissing;

/// Short-lived keyed store carrying settlement targets between screens.
///
/// Ownership discipline is write-once, read-then-clear: the listing writes a
/// slot, exactly one settlement screen instance reads and clears it. The lock
/// is an implementation convenience, not part of the protocol.
#[derive(Debug, Default)]
pub struct TransferContext {
    entries: Mutex<HashMap<String, Value>>,
}

impl TransferContext {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Opaque key-value layer
    // -----------------------------------------------------------------------

    /// Store a raw value under `key`, replacing any previous value.
    pub fn put(&self, key: &str, value: Value) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    /// Read back the value under `key`, if any.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Remove and return the value under `key`. Absent keys are a no-op.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    // -----------------------------------------------------------------------
    // Typed settlement slots
    // -----------------------------------------------------------------------

    fn slot(kind: SettlementKind) -> &'static str {
        match kind {
            SettlementKind::Payment => KEY_PENDING_PAYMENT,
            SettlementKind::FailureReport => KEY_PENDING_FAILURE_REPORT,
        }
    }

    /// Hand a collection target (with its customer record) to the settlement
    /// screen for the given flow.
    pub fn store_pending(&self, kind: SettlementKind, target: &CollectionTarget) {
        match serde_json::to_value(target) {
            Ok(value) => {
                info!(credit_id = target.credit_id, ?kind, "settlement target stored");
                self.put(Self::slot(kind), value);
            }
            Err(e) => {
                warn!(credit_id = target.credit_id, error = %e, "failed to serialize settlement target");
            }
        }
    }

    /// Load the pending target for the given flow, validating on read.
    ///
    /// Absent or malformed records both resolve to [`ContextMissing`] — a
    /// stale or tampered hand-off fails closed instead of being reused.
    pub fn load_pending(&self, kind: SettlementKind) -> Result<CollectionTarget, ContextMissing> {
        let slot = Self::slot(kind);
        let value = self.get(slot).ok_or(ContextMissing)?;
        serde_json::from_value(value).map_err(|e| {
            warn!(slot, error = %e, "malformed settlement record in transfer context");
            ContextMissing
        })
    }

    /// Remove both settlement slots. Called after a terminal outcome so a
    /// page reload cannot resubmit the same target.
    pub fn clear_settlement(&self) {
        self.remove(KEY_PENDING_PAYMENT);
        self.remove(KEY_PENDING_FAILURE_REPORT);
        info!("transfer context cleared");
    }
}

// ===========================================================================
// Tests
// ===========================================================================
