//! Collection settlement: payment constraints and the two-outcome workflow.
//!
//! A collector picks a pending installment on the listing screen; the target
//! crosses to the settlement screen through the transfer context. From there
//! the visit resolves into exactly one of two outcomes: a recorded payment or
//! a reported failed attempt. Constraint checks run before any request leaves
//! the process, and a backend rejection leaves the target in place so the
//! collector can retry by resubmitting.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{BackendError, RequestContext};
use crate::context::{ContextMissing, TransferContext};

// ---------------------------------------------------------------------------
// Data model
// ---------------------------------------------------------------------------

/// Customer attached to the credit being settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub given_names: String,
    pub surnames: String,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_names, self.surnames)
    }
}

/// A pending installment awaiting settlement.
///
/// Created when the collector selects a credit on the listing screen and
/// destroyed (cleared from the transfer context) only after a terminal
/// outcome is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionTarget {
    pub credit_id: i64,
    pub store_id: i64,
    pub customer: Customer,
    /// Outstanding amount still owed on the credit.
    pub current_balance: Decimal,
    /// Amount due for this visit (`valor_recaudo`). Seeds the default payment
    /// input but does not cap it — the running balance is the only ceiling.
    pub scheduled_amount: Decimal,
    pub visit_date: NaiveDate,
}

/// Terminal result of a settlement. Exactly one is produced per target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SettlementOutcome {
    PaymentRecorded {
        amount: Decimal,
    },
    FailureReported {
        reason_code: String,
        comment: Option<String>,
    },
}

/// Input for reporting a failed collection visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    pub reason_code: String,
    pub comment: Option<String>,
}

impl FailureReport {
    /// Normalize and check the report before submission.
    ///
    /// The reason code is mandatory; blank comments collapse to `None`.
    pub fn validated(&self) -> Result<FailureReport, ValidationError> {
        let reason_code = self.reason_code.trim();
        if reason_code.is_empty() {
            return Err(ValidationError::EmptyReasonCode);
        }
        Ok(FailureReport {
            reason_code: reason_code.to_string(),
            comment: self
                .comment
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        })
    }
}

// ---------------------------------------------------------------------------
// Payment constraint validator
// ---------------------------------------------------------------------------

/// Inline input errors, resolved before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("payment amount must be greater than zero")]
    NonPositiveAmount,
    #[error("payment exceeds the outstanding balance of {max}")]
    ExceedsMaximum { max: Decimal },
    #[error("a failure reason is required")]
    EmptyReasonCode,
}

/// Maximum amount the collector may accept for this target: the running
/// balance, not the scheduled visit amount.
pub fn max_payable(target: &CollectionTarget) -> Decimal {
    target.current_balance
}

/// Check a proposed payment against the target's constraints.
///
/// Accepted amounts are returned unchanged — no rounding happens here.
pub fn validate_payment(
    target: &CollectionTarget,
    proposed: Decimal,
) -> Result<Decimal, ValidationError> {
    if proposed <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount);
    }
    let max = max_payable(target);
    if proposed > max {
        return Err(ValidationError::ExceedsMaximum { max });
    }
    Ok(proposed)
}

// ---------------------------------------------------------------------------
// Settlement state machine
// ---------------------------------------------------------------------------

/// Which transfer-context slot a settlement was handed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementKind {
    Payment,
    FailureReport,
}

/// Outbound half of the settlement workflow.
///
/// [`crate::api::ApiClient`] is the live implementation; tests substitute an
/// in-process mock so transitions can be exercised without a server.
#[allow(async_fn_in_trait)]
pub trait SettlementBackend {
    async fn record_payment(
        &self,
        ctx: &RequestContext,
        target: &CollectionTarget,
        amount: Decimal,
    ) -> Result<(), BackendError>;

    async fn report_failure(
        &self,
        ctx: &RequestContext,
        target: &CollectionTarget,
        report: &FailureReport,
    ) -> Result<(), BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Loaded,
    Submitting,
    Succeeded,
}

/// Workflow errors surfaced by the settlement screen.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    ContextMissing(#[from] ContextMissing),
    /// Re-entry guard: a submission is already in flight, or the target has
    /// already been settled.
    #[error("settlement is not accepting a new submission")]
    NotReady,
}

/// Drives one pending collection target to exactly one terminal outcome.
///
/// `Loaded → Submitting → Succeeded`, with a backend rejection recovering to
/// `Loaded` for a user-initiated retry. While submitting, repeat triggers are
/// rejected by phase — no request deduplication is needed downstream.
#[derive(Debug)]
pub struct Settlement {
    kind: SettlementKind,
    target: CollectionTarget,
    phase: Phase,
}

impl Settlement {
    /// Resume a settlement from the transfer context.
    ///
    /// Absent or malformed context never constructs a machine: the caller
    /// redirects to the listing and the workflow instance ends there.
    pub fn resume(ctx: &TransferContext, kind: SettlementKind) -> Result<Self, ContextMissing> {
        let target = ctx.load_pending(kind)?;
        info!(credit_id = target.credit_id, ?kind, "settlement target loaded");
        Ok(Self {
            kind,
            target,
            phase: Phase::Loaded,
        })
    }

    pub fn kind(&self) -> SettlementKind {
        self.kind
    }

    pub fn target(&self) -> &CollectionTarget {
        &self.target
    }

    /// True while the single outbound request is in flight; the screen shows
    /// its pending indicator off this.
    pub fn is_submitting(&self) -> bool {
        self.phase == Phase::Submitting
    }

    pub fn is_settled(&self) -> bool {
        self.phase == Phase::Succeeded
    }

    /// Record a payment for the target.
    ///
    /// Validates the amount first (no round-trip is wasted on bad input),
    /// then issues the backend call. On success both context slots are
    /// cleared so a reload cannot resubmit; on backend failure the context
    /// stays intact and the machine returns to `Loaded`.
    pub async fn submit_payment<B: SettlementBackend>(
        &mut self,
        backend: &B,
        req: &RequestContext,
        ctx: &TransferContext,
        amount: Decimal,
    ) -> Result<SettlementOutcome, SettlementError> {
        if self.phase != Phase::Loaded {
            return Err(SettlementError::NotReady);
        }
        let amount = validate_payment(&self.target, amount)?;

        self.phase = Phase::Submitting;
        match backend.record_payment(req, &self.target, amount).await {
            Ok(()) => {
                ctx.clear_settlement();
                self.phase = Phase::Succeeded;
                info!(credit_id = self.target.credit_id, %amount, "collection payment recorded");
                Ok(SettlementOutcome::PaymentRecorded { amount })
            }
            Err(e) => {
                self.phase = Phase::Loaded;
                warn!(credit_id = self.target.credit_id, error = %e, "payment submission failed");
                Err(e.into())
            }
        }
    }

    /// Report a failed collection visit for the target.
    ///
    /// Same transition discipline as [`Settlement::submit_payment`].
    pub async fn submit_failure_report<B: SettlementBackend>(
        &mut self,
        backend: &B,
        req: &RequestContext,
        ctx: &TransferContext,
        report: &FailureReport,
    ) -> Result<SettlementOutcome, SettlementError> {
        if self.phase != Phase::Loaded {
            return Err(SettlementError::NotReady);
        }
        let report = report.validated()?;

        self.phase = Phase::Submitting;
        match backend.report_failure(req, &self.target, &report).await {
            Ok(()) => {
                ctx.clear_settlement();
                self.phase = Phase::Succeeded;
                info!(
                    credit_id = self.target.credit_id,
                    reason = %report.reason_code,
                    "failed collection visit reported"
                );
                Ok(SettlementOutcome::FailureReported {
                    reason_code: report.reason_code,
                    comment: report.comment,
                })
            }
            Err(e) => {
                self.phase = Phase::Loaded;
                warn!(credit_id = self.target.credit_id, error = %e, "failure report submission failed");
                Err(e.into())
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
