//! Raw store snapshot and reporting periods.
//!
//! The backend returns a store's accumulated financial counters in up to four
//! period variants: `_dia`, `_mes`, `_ano`, and the unsuffixed "general"
//! (all-time) form. The snapshot is owned by the backend — the core never
//! mutates it and a fresh copy arrives on every fetch.
//!
//! Counters the backend omits, or returns as `null` (empty aggregates), land
//! as zero at deserialization so the aggregator never sees a missing value.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Reporting window a financial summary is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Month,
    Year,
    General,
}

/// Coerce an absent-as-`null` counter to zero.
fn zero_when_null<'de, D>(de: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Decimal>::deserialize(de)?.unwrap_or_default())
}

/// Per-store financial counters as returned by the snapshot endpoint.
///
/// Field names match the backend's wire format. Read-only to the core.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawStoreSnapshot {
    // Net sales
    #[serde(deserialize_with = "zero_when_null")]
    pub ventas_netas: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub ventas_netas_dia: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub ventas_netas_mes: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub ventas_netas_ano: Decimal,

    // Expenses
    #[serde(deserialize_with = "zero_when_null")]
    pub gastos: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub gastos_dia: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub gastos_mes: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub gastos_ano: Decimal,

    // Estimated profit per period; the general view reports realized revenue
    // from finalized sales instead.
    #[serde(deserialize_with = "zero_when_null")]
    pub utilidad_estimada_dia: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub utilidad_estimada_mes: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub utilidad_estimada_ano: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub ingresos_ventas_finalizadas: Decimal,

    // Losses (written-off credits, damaged stock)
    #[serde(deserialize_with = "zero_when_null")]
    pub perdidas: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub perdidas_dia: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub perdidas_mes: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub perdidas_ano: Decimal,

    // Capital contributions
    #[serde(deserialize_with = "zero_when_null")]
    pub aportes: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub aportes_dia: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub aportes_mes: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub aportes_ano: Decimal,

    // Owner withdrawals
    #[serde(deserialize_with = "zero_when_null")]
    pub utilidades: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub utilidades_dia: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub utilidades_mes: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub utilidades_ano: Decimal,

    // Collected installments
    #[serde(deserialize_with = "zero_when_null")]
    pub recaudos: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub recaudos_dia: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub recaudos_mes: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub recaudos_ano: Decimal,

    // Store-wide figures
    #[serde(deserialize_with = "zero_when_null")]
    pub inversion: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub dinero_x_cobrar: Decimal,
    #[serde(deserialize_with = "zero_when_null")]
    pub caja: Decimal,
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn missing_counters_deserialize_as_zero() {
        let snapshot: RawStoreSnapshot = serde_json::from_str("{}").expect("empty snapshot");
        assert_eq!(snapshot.ventas_netas_mes, Decimal::ZERO);
        assert_eq!(snapshot.utilidad_estimada_ano, Decimal::ZERO);
        assert_eq!(snapshot.caja, Decimal::ZERO);
    }

    #[test]
    fn null_counters_deserialize_as_zero() {
        // Empty SQL aggregates come back as null, not 0.
        let snapshot: RawStoreSnapshot = serde_json::from_str(
            r#"{"gastos_mes": null, "ventas_netas_mes": 1500000, "perdidas": null}"#,
        )
        .expect("snapshot with nulls");
        assert_eq!(snapshot.gastos_mes, Decimal::ZERO);
        assert_eq!(snapshot.perdidas, Decimal::ZERO);
        assert_eq!(snapshot.ventas_netas_mes, dec!(1_500_000));
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let snapshot: RawStoreSnapshot = serde_json::from_str(
            r#"{"id": 7, "nombre": "La Esquina", "caja": "125000.50"}"#,
        )
        .expect("snapshot with extra fields");
        assert_eq!(snapshot.caja, dec!(125000.50));
    }

    #[test]
    fn period_serde_round_trip() {
        for period in [Period::Day, Period::Month, Period::Year, Period::General] {
            let json = serde_json::to_string(&period).unwrap();
            let back: Period = serde_json::from_str(&json).unwrap();
            assert_eq!(period, back);
        }
        assert_eq!(serde_json::to_string(&Period::General).unwrap(), "\"general\"");
    }
}
