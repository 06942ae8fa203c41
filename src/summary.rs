//! Period financial summaries for the dashboard screens.
//!
//! Two profit derivations coexist on purpose and must stay separate:
//!
//! - [`summarize`] feeds the combined multi-metric view from the backend's
//!   estimated-profit counters (realized revenue for the general period).
//! - [`quick_profit`] / [`quick_margin`] feed the single-period quick widgets
//!   from a flat 20% margin assumption over net sales.
//!
//! The quick estimate does not reconcile with `utilidad_estimada_*` and is
//! not meant to; callers pick the derivation matching the view they render.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::snapshot::{Period, RawStoreSnapshot};

/// Flat margin assumed by the single-period quick widgets.
const QUICK_MARGIN_RATE: Decimal = dec!(0.20);

const HUNDRED: Decimal = dec!(100);

/// Whether a period's profit figure is an estimate or realized revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfitBasis {
    /// Day/Month/Year: derived from the `utilidad_estimada_*` counters.
    Estimated,
    /// General: realized revenue from finalized sales.
    Real,
}

impl ProfitBasis {
    /// Header label shown next to the profit figure.
    pub fn label(self) -> &'static str {
        match self {
            ProfitBasis::Estimated => "Estimated",
            ProfitBasis::Real => "Real",
        }
    }
}

/// Normalized period summary, recomputed on demand and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub utilidad: Decimal,
    pub gastos: Decimal,
    /// Owner withdrawals.
    pub retiros: Decimal,
    pub perdidas: Decimal,
    pub aportes: Decimal,
    pub ventas_netas: Decimal,
    pub beneficio_neto: Decimal,
    /// Percentage, `beneficio_neto / utilidad × 100`; zero when `utilidad ≤ 0`.
    pub margen: Decimal,
    pub basis: ProfitBasis,
}

impl FinancialSummary {
    /// Negative-profitability flag for the header card.
    pub fn is_loss_making(&self) -> bool {
        self.beneficio_neto < Decimal::ZERO
    }
}

/// Derive the combined-view summary for one period from a raw snapshot.
///
/// Total function: every input is already coerced to a number at
/// deserialization, so there is no error path and no I/O.
pub fn summarize(snapshot: &RawStoreSnapshot, period: Period) -> FinancialSummary {
    let s = snapshot;
    let (utilidad, gastos, perdidas, retiros, aportes, ventas_netas, basis) = match period {
        // Day and Month report no loss counter in the combined view.
        Period::Day => (
            s.utilidad_estimada_dia,
            s.gastos_dia,
            Decimal::ZERO,
            s.utilidades_dia,
            s.aportes_dia,
            s.ventas_netas_dia,
            ProfitBasis::Estimated,
        ),
        Period::Month => (
            s.utilidad_estimada_mes,
            s.gastos_mes,
            Decimal::ZERO,
            s.utilidades_mes,
            s.aportes_mes,
            s.ventas_netas_mes,
            ProfitBasis::Estimated,
        ),
        Period::Year => (
            s.utilidad_estimada_ano,
            s.gastos_ano,
            s.perdidas_ano,
            s.utilidades_ano,
            s.aportes_ano,
            s.ventas_netas_ano,
            ProfitBasis::Estimated,
        ),
        // General swaps the estimate for realized revenue, and shows the
        // initial investment in the contributions slot.
        Period::General => (
            s.ingresos_ventas_finalizadas,
            s.gastos,
            s.perdidas,
            s.utilidades,
            s.inversion,
            s.ventas_netas,
            ProfitBasis::Real,
        ),
    };

    let beneficio_neto = utilidad - gastos - perdidas;
    let margen = if utilidad > Decimal::ZERO {
        beneficio_neto / utilidad * HUNDRED
    } else {
        Decimal::ZERO
    };

    FinancialSummary {
        utilidad,
        gastos,
        retiros,
        perdidas,
        aportes,
        ventas_netas,
        beneficio_neto,
        margen,
        basis,
    }
}

// ---------------------------------------------------------------------------
// Single-period quick widgets
// ---------------------------------------------------------------------------

/// Quick profit estimate for the daily/monthly summary widgets:
/// a flat 20% of net sales, minus expenses.
pub fn quick_profit(ventas_netas: Decimal, gastos: Decimal) -> Decimal {
    ventas_netas * QUICK_MARGIN_RATE - gastos
}

/// Margin for the quick widgets, over net sales. Zero when there were no sales.
pub fn quick_margin(ventas_netas: Decimal, gastos: Decimal) -> Decimal {
    if ventas_netas == Decimal::ZERO {
        return Decimal::ZERO;
    }
    quick_profit(ventas_netas, gastos) / ventas_netas * HUNDRED
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn month_snapshot() -> RawStoreSnapshot {
        serde_json::from_str(
            r#"{
                "ventas_netas_mes": 1000000,
                "gastos_mes": 100000,
                "utilidad_estimada_mes": 250000,
                "utilidades_mes": 50000,
                "aportes_mes": 0
            }"#,
        )
        .expect("month snapshot")
    }

    #[test]
    fn month_summary_matches_reference_figures() {
        let summary = summarize(&month_snapshot(), Period::Month);
        assert_eq!(summary.utilidad, dec!(250_000));
        assert_eq!(summary.gastos, dec!(100_000));
        assert_eq!(summary.perdidas, Decimal::ZERO);
        assert_eq!(summary.retiros, dec!(50_000));
        assert_eq!(summary.ventas_netas, dec!(1_000_000));
        assert_eq!(summary.beneficio_neto, dec!(150_000));
        assert_eq!(summary.margen, dec!(60.0));
        assert_eq!(summary.basis, ProfitBasis::Estimated);
        assert!(!summary.is_loss_making());
    }

    #[test]
    fn general_summary_uses_realized_revenue_and_flags_losses() {
        let snapshot: RawStoreSnapshot = serde_json::from_str(
            r#"{
                "ingresos_ventas_finalizadas": 500000,
                "gastos": 600000,
                "perdidas": 0
            }"#,
        )
        .unwrap();
        let summary = summarize(&snapshot, Period::General);
        assert_eq!(summary.utilidad, dec!(500_000));
        assert_eq!(summary.beneficio_neto, dec!(-100_000));
        assert_eq!(summary.basis, ProfitBasis::Real);
        assert_eq!(summary.basis.label(), "Real");
        assert!(summary.is_loss_making());
    }

    #[test]
    fn year_summary_includes_period_losses() {
        let snapshot: RawStoreSnapshot = serde_json::from_str(
            r#"{
                "ventas_netas_ano": 9000000,
                "gastos_ano": 700000,
                "perdidas_ano": 300000,
                "utilidad_estimada_ano": 2000000
            }"#,
        )
        .unwrap();
        let summary = summarize(&snapshot, Period::Year);
        assert_eq!(summary.perdidas, dec!(300_000));
        assert_eq!(summary.beneficio_neto, dec!(1_000_000));
        assert_eq!(summary.margen, dec!(50));
    }

    #[test]
    fn day_summary_mirrors_month_with_day_counters() {
        let snapshot: RawStoreSnapshot = serde_json::from_str(
            r#"{
                "ventas_netas_dia": 80000,
                "gastos_dia": 5000,
                "utilidad_estimada_dia": 16000,
                "perdidas_dia": 99999
            }"#,
        )
        .unwrap();
        let summary = summarize(&snapshot, Period::Day);
        assert_eq!(summary.utilidad, dec!(16_000));
        // The combined day view ignores the loss counter, like the month view.
        assert_eq!(summary.perdidas, Decimal::ZERO);
        assert_eq!(summary.beneficio_neto, dec!(11_000));
        assert_eq!(summary.basis, ProfitBasis::Estimated);
    }

    #[test]
    fn net_benefit_identity_holds_for_every_period() {
        let snapshot = month_snapshot();
        for period in [Period::Day, Period::Month, Period::Year, Period::General] {
            let s = summarize(&snapshot, period);
            assert_eq!(s.beneficio_neto, s.utilidad - s.gastos - s.perdidas);
        }
    }

    #[test]
    fn margin_is_zero_when_profit_is_not_positive() {
        // utilidad == 0
        let empty = RawStoreSnapshot::default();
        for period in [Period::Day, Period::Month, Period::Year, Period::General] {
            assert_eq!(summarize(&empty, period).margen, Decimal::ZERO);
        }

        // utilidad < 0 (negative estimated-profit counter)
        let snapshot: RawStoreSnapshot =
            serde_json::from_str(r#"{"utilidad_estimada_mes": -50000, "gastos_mes": 1000}"#)
                .unwrap();
        let summary = summarize(&snapshot, Period::Month);
        assert!(summary.utilidad < Decimal::ZERO);
        assert_eq!(summary.margen, Decimal::ZERO);
    }

    #[test]
    fn missing_counters_behave_exactly_like_zero() {
        let sparse: RawStoreSnapshot =
            serde_json::from_str(r#"{"utilidad_estimada_mes": 250000}"#).unwrap();
        let explicit: RawStoreSnapshot = serde_json::from_str(
            r#"{"utilidad_estimada_mes": 250000, "gastos_mes": 0, "ventas_netas_mes": 0}"#,
        )
        .unwrap();
        assert_eq!(
            summarize(&sparse, Period::Month),
            summarize(&explicit, Period::Month)
        );
    }

    #[test]
    fn quick_profit_is_flat_twenty_percent_minus_expenses() {
        assert_eq!(quick_profit(dec!(1_000_000), dec!(100_000)), dec!(100_000));
        assert_eq!(quick_profit(dec!(0), dec!(30_000)), dec!(-30_000));
    }

    #[test]
    fn quick_margin_guards_against_zero_sales() {
        assert_eq!(quick_margin(Decimal::ZERO, dec!(30_000)), Decimal::ZERO);
        assert_eq!(quick_margin(dec!(1_000_000), dec!(100_000)), dec!(10));
    }

    #[test]
    fn quick_and_combined_derivations_stay_distinct() {
        // Same month, two views: the combined view trusts the backend counter,
        // the quick widget recomputes from the flat-margin rule.
        let snapshot = month_snapshot();
        let combined = summarize(&snapshot, Period::Month);
        let quick = quick_profit(snapshot.ventas_netas_mes, snapshot.gastos_mes);
        assert_eq!(combined.utilidad, dec!(250_000));
        assert_eq!(quick, dec!(100_000));
        assert_ne!(combined.utilidad, quick);
    }
}
