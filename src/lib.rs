//! Store-operations dashboard core.
//!
//! Two behaviors live here: period-scoped financial summaries derived from
//! the backend's raw accumulator counters, and the two-outcome settlement
//! workflow for outstanding customer credit installments. Screens, routing,
//! session handling, and persistence stay in the host application; this crate
//! consumes the stores backend and the screen-to-screen transfer context as
//! collaborators.
//!
//! All monetary values are `rust_decimal::Decimal` — fixed-point end to end,
//! so repeated aggregation never accumulates binary rounding drift.

pub mod api;
pub mod context;
pub mod settlement;
pub mod snapshot;
pub mod summary;

pub use api::{ApiClient, BackendError, RequestContext, SnapshotUnavailable};
pub use context::{ContextMissing, TransferContext};
pub use settlement::{
    max_payable, validate_payment, CollectionTarget, Customer, FailureReport, Settlement,
    SettlementBackend, SettlementError, SettlementKind, SettlementOutcome, ValidationError,
};
pub use snapshot::{Period, RawStoreSnapshot};
pub use summary::{quick_margin, quick_profit, summarize, FinancialSummary, ProfitBasis};
