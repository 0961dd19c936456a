//! The derived-metrics snapshot, replaced section by section on every cascade.

use serde::{Deserialize, Serialize};

/// Where the numbers of a section came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricSource {
    /// Local aggregation, not yet confirmed by the oracle.
    #[default]
    Local,
    /// Authoritative oracle response.
    Oracle,
    /// Local approximation applied because the oracle failed.
    Fallback,
    /// Not computed: preconditions were not met.
    Skipped,
}

/// Equipment totals.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentMetrics {
    pub total_power_w: f64,
    pub total_cost: f64,
    pub total_hashrate_th: f64,
    pub monthly_energy_kwh: f64,
    pub daily_energy_kwh: f64,
    /// Mined coins per month; local estimate until a viability projection replaces it.
    pub monthly_coin_estimate: f64,
    pub source: MetricSource,
}

/// Solar array totals.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SolarMetrics {
    pub panel_count: u64,
    pub total_rated_power_w: f64,
    pub total_cost: f64,
    pub footprint_m2: f64,
    pub monthly_generation_kwh: f64,
    pub generation_source: MetricSource,
}

/// Advisory budget classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetState {
    #[default]
    Ok,
    Warning,
    Exceeded,
}

/// Spend against the budget ceiling.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub budget: f64,
    /// Equipment cost as a percentage of the budget; 0 when the budget is 0.
    pub equipment_spend_pct: f64,
    /// Equipment plus solar cost as a percentage of the budget; 0 when the budget is 0.
    pub combined_spend_pct: f64,
    /// Budget minus equipment cost. May be negative.
    pub equipment_headroom: f64,
    /// Budget minus combined cost. May be negative.
    pub headroom: f64,
    pub equipment_state: BudgetState,
    pub combined_state: BudgetState,
}

/// Intermediate figures the oracle reports alongside a projection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViabilityBreakdown {
    pub solar_energy_used_kwh: f64,
    pub energy_deficit_kwh: f64,
    pub monthly_maintenance_cost: f64,
    pub coin_price: f64,
}

/// Authoritative viability projection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Viability {
    /// Share of monthly consumption offset by solar, in percent.
    pub coverage_pct: f64,
    pub monthly_savings: f64,
    pub monthly_mining_revenue: f64,
    pub payback_months: f64,
    /// Avoided emissions in kg CO₂ per month.
    pub avoided_co2_kg: f64,
    /// Mined coins per month, when the oracle supplied it.
    pub monthly_coin: Option<f64>,
    pub total_investment: f64,
    pub coin_price: f64,
    pub energy_tariff: f64,
    pub energy_cost_without_solar: f64,
    pub energy_deficit_cost: f64,
    pub net_monthly_profit: f64,
    /// Opaque qualitative verdict, passed through as received.
    pub verdict: Option<serde_json::Value>,
    pub breakdown: ViabilityBreakdown,
}

/// The engine's sole output record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub equipment: EquipmentMetrics,
    pub solar: SolarMetrics,
    pub budget: BudgetStatus,
    /// Present only once a viability projection has been received.
    pub viability: Option<Viability>,
}
