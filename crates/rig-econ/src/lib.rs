#![deny(warnings)]

//! Local physics and finance helpers for the rig calculator.
//!
//! This module provides deterministic, I/O-free utilities for:
//! - Reducing equipment and panel selections to totals
//! - The flat-capacity-factor solar generation fallback
//! - The fixed-network mined-coin estimate
//! - Budget spend percentages and headroom classification

use rig_core::{BudgetState, BudgetStatus, SelectedEquipment, SelectedPanel};

pub const HOURS_PER_DAY: f64 = 24.0;
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Network hash rate assumed by the local coin estimate, in TH/s (500 EH/s).
pub const NETWORK_HASHRATE_TH: f64 = 500_000_000.0;
/// Coins per block.
pub const BLOCK_REWARD: f64 = 3.125;
pub const BLOCKS_PER_DAY: f64 = 144.0;

/// Peak sun hours per day used by the generation fallback.
pub const FALLBACK_SUN_HOURS: f64 = 4.5;
/// System performance ratio used by the generation fallback.
pub const FALLBACK_PERFORMANCE_RATIO: f64 = 0.85;

/// Equipment spend above this percentage of the budget is a warning.
pub const EQUIPMENT_WARNING_PCT: f64 = 80.0;
/// Combined spend above this fraction of the budget is a warning.
pub const COMBINED_WARNING_RATIO: f64 = 0.9;

/// Totals over the selected equipment.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EquipmentTotals {
    pub power_w: f64,
    pub cost: f64,
    pub hashrate_th: f64,
    pub monthly_energy_kwh: f64,
    pub daily_energy_kwh: f64,
}

/// Totals over the selected panels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SolarTotals {
    pub panel_count: u64,
    pub rated_power_w: f64,
    pub cost: f64,
    pub footprint_m2: f64,
}

impl SolarTotals {
    /// Mean rated power per panel rounded to whole watts; 0 with no panels.
    pub fn average_panel_power_w(&self) -> u64 {
        if self.panel_count == 0 {
            return 0;
        }
        let avg = (self.rated_power_w / self.panel_count as f64).round();
        if !avg.is_finite() || avg < 0.0 {
            return 0;
        }
        avg as u64
    }
}

/// Monthly energy in kWh for a constant draw: W × 24 × 30 / 1000.
pub fn monthly_energy_kwh(power_w: f64) -> f64 {
    power_w * HOURS_PER_DAY * DAYS_PER_MONTH / 1000.0
}

/// Daily energy in kWh for a constant draw: W × 24 / 1000.
pub fn daily_energy_kwh(power_w: f64) -> f64 {
    power_w * HOURS_PER_DAY / 1000.0
}

/// Sum power, cost and hash rate over equipment selections.
///
/// Example:
/// two units of a 3000 W / 50000 / 90 TH/s rig give 6000 W, 100000,
/// 180 TH/s and 4320 kWh per month.
pub fn aggregate_equipment<'a, I>(selections: I) -> EquipmentTotals
where
    I: IntoIterator<Item = &'a SelectedEquipment>,
{
    let mut t = EquipmentTotals::default();
    for s in selections {
        let q = f64::from(s.quantity);
        t.power_w += s.item.power_w * q;
        t.cost += s.item.unit_cost * q;
        t.hashrate_th += s.item.hashrate_th * q;
    }
    t.monthly_energy_kwh = monthly_energy_kwh(t.power_w);
    t.daily_energy_kwh = daily_energy_kwh(t.power_w);
    t
}

/// Sum count, rated power, price and footprint over panel selections.
pub fn aggregate_panels<'a, I>(selections: I) -> SolarTotals
where
    I: IntoIterator<Item = &'a SelectedPanel>,
{
    let mut t = SolarTotals::default();
    for s in selections {
        let q = f64::from(s.quantity);
        t.panel_count += u64::from(s.quantity);
        t.rated_power_w += s.panel.rated_power_w * q;
        t.cost += s.panel.unit_price * q;
        t.footprint_m2 += s.panel.width_m * s.panel.height_m * q;
    }
    t
}

/// Irradiance-independent generation estimate used when the oracle is unreachable.
///
/// kWh/month = kW × 4.5 × 30 × 0.85; 5000 W gives 573.75.
pub fn fallback_generation_kwh(rated_power_w: f64) -> f64 {
    (rated_power_w / 1000.0) * FALLBACK_SUN_HOURS * DAYS_PER_MONTH * FALLBACK_PERFORMANCE_RATIO
}

/// Coins mined per month by `hashrate_th` against the fixed network model.
///
/// 100 TH/s gives (100 / 5e8) × 450 × 30 = 0.0027.
pub fn monthly_coin_estimate(hashrate_th: f64) -> f64 {
    let share = hashrate_th / NETWORK_HASHRATE_TH;
    share * BLOCK_REWARD * BLOCKS_PER_DAY * DAYS_PER_MONTH
}

/// `cost` as a percentage of `budget`. Zero budget yields 0, never NaN or infinity.
pub fn spend_pct(cost: f64, budget: f64) -> f64 {
    if budget > 0.0 {
        cost / budget * 100.0
    } else {
        0.0
    }
}

fn classify(cost: f64, budget: f64, warn: impl FnOnce() -> bool) -> BudgetState {
    if cost > budget {
        BudgetState::Exceeded
    } else if warn() {
        BudgetState::Warning
    } else {
        BudgetState::Ok
    }
}

/// Compare equipment-only and combined spend against the budget ceiling.
///
/// Each figure is classified independently: `Exceeded` when spend is above
/// the budget, `Warning` when equipment spend is above 80% (or combined
/// spend above 90%), `Ok` otherwise.
pub fn track_budget(equipment_cost: f64, combined_cost: f64, budget: f64) -> BudgetStatus {
    let equipment_spend_pct = spend_pct(equipment_cost, budget);
    let combined_spend_pct = spend_pct(combined_cost, budget);
    BudgetStatus {
        budget,
        equipment_spend_pct,
        combined_spend_pct,
        equipment_headroom: budget - equipment_cost,
        headroom: budget - combined_cost,
        equipment_state: classify(equipment_cost, budget, || {
            equipment_spend_pct > EQUIPMENT_WARNING_PCT
        }),
        combined_state: classify(combined_cost, budget, || {
            budget > 0.0 && combined_cost / budget > COMBINED_WARNING_RATIO
        }),
    }
}
