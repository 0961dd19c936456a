//! Immutable reference data: regions, mining hardware, and solar panels.

use crate::{CatalogError, SelectionError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Tariff applied when the catalog source has no entry for a region.
pub const DEFAULT_TARIFF_PER_KWH: f64 = 0.80;

/// Region code, e.g. "SP" or "BA".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionCode(pub String);

impl RegionCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A selectable region with its solar resource and energy price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub code: RegionCode,
    /// Display name, e.g. "São Paulo".
    pub name: String,
    /// Mean solar irradiance in kWh/m²/day.
    pub irradiance_kwh_m2_day: f64,
    /// Energy tariff in currency per kWh.
    pub tariff_per_kwh: f64,
    /// Grid emission factor in kg CO₂ per kWh, when published.
    pub emission_factor: Option<f64>,
}

/// Mining hardware families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EquipmentCategory {
    /// Application-Specific Integrated Circuit miners
    #[serde(rename = "ASIC")]
    Asic,
    /// Graphics cards
    #[serde(rename = "GPU")]
    Gpu,
}

impl EquipmentCategory {
    pub const ALL: [EquipmentCategory; 2] = [EquipmentCategory::Asic, EquipmentCategory::Gpu];

    pub fn as_str(self) -> &'static str {
        match self {
            EquipmentCategory::Asic => "ASIC",
            EquipmentCategory::Gpu => "GPU",
        }
    }
}

impl fmt::Display for EquipmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipmentCategory {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASIC" => Ok(EquipmentCategory::Asic),
            "GPU" => Ok(EquipmentCategory::Gpu),
            _ => Err(SelectionError::UnknownCategory(s.to_string())),
        }
    }
}

/// A mining hardware model as listed in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEquipment {
    pub model: String,
    pub manufacturer: String,
    /// Power draw in W.
    pub power_w: f64,
    /// Hash rate in TH/s.
    pub hashrate_th: f64,
    /// Unit cost in currency.
    pub unit_cost: f64,
}

/// A solar panel model as listed in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogPanel {
    pub model: String,
    /// Cell technology, e.g. "Monocristalino".
    pub kind: String,
    /// Rated power in Wp.
    pub rated_power_w: f64,
    /// Conversion efficiency ratio in [0, 1].
    pub efficiency: f64,
    pub width_m: f64,
    pub height_m: f64,
    pub cost_per_watt: f64,
    pub unit_price: f64,
}

impl CatalogPanel {
    /// Footprint of one panel in m².
    pub fn area_m2(&self) -> f64 {
        self.width_m * self.height_m
    }
}

/// All reference data supplied once at load.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub regions: BTreeMap<RegionCode, RegionInfo>,
    pub equipment: BTreeMap<EquipmentCategory, Vec<CatalogEquipment>>,
    pub panels: Vec<CatalogPanel>,
}

impl Catalog {
    pub fn region(&self, code: &str) -> Option<&RegionInfo> {
        self.regions.get(&RegionCode(code.to_string()))
    }

    pub fn equipment(&self, category: EquipmentCategory, index: usize) -> Option<&CatalogEquipment> {
        self.equipment.get(&category).and_then(|items| items.get(index))
    }

    pub fn equipment_in(&self, category: EquipmentCategory) -> &[CatalogEquipment] {
        self.equipment
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn panel(&self, index: usize) -> Option<&CatalogPanel> {
        self.panels.get(index)
    }
}

fn check_quantity(field: String, value: f64) -> Result<(), CatalogError> {
    if !value.is_finite() {
        return Err(CatalogError::NonFinite(field));
    }
    if value < 0.0 {
        return Err(CatalogError::NegativeValue(field));
    }
    Ok(())
}

/// Validate catalog reference data: names present, every quantity finite and non-negative.
pub fn validate_catalog(catalog: &Catalog) -> Result<(), CatalogError> {
    for (code, region) in &catalog.regions {
        if code.0.trim().is_empty() || region.name.trim().is_empty() {
            return Err(CatalogError::BlankName(format!("region {code}")));
        }
        check_quantity(format!("region {code} irradiance"), region.irradiance_kwh_m2_day)?;
        check_quantity(format!("region {code} tariff"), region.tariff_per_kwh)?;
        if let Some(factor) = region.emission_factor {
            check_quantity(format!("region {code} emission factor"), factor)?;
        }
    }
    for (category, items) in &catalog.equipment {
        for (i, item) in items.iter().enumerate() {
            if item.model.trim().is_empty() {
                return Err(CatalogError::BlankName(format!("{category}[{i}]")));
            }
            check_quantity(format!("{category}[{i}] power"), item.power_w)?;
            check_quantity(format!("{category}[{i}] hashrate"), item.hashrate_th)?;
            check_quantity(format!("{category}[{i}] cost"), item.unit_cost)?;
        }
    }
    for (i, panel) in catalog.panels.iter().enumerate() {
        if panel.model.trim().is_empty() {
            return Err(CatalogError::BlankName(format!("panel[{i}]")));
        }
        check_quantity(format!("panel[{i}] power"), panel.rated_power_w)?;
        check_quantity(format!("panel[{i}] price"), panel.unit_price)?;
        check_quantity(format!("panel[{i}] width"), panel.width_m)?;
        check_quantity(format!("panel[{i}] height"), panel.height_m)?;
        check_quantity(format!("panel[{i}] efficiency"), panel.efficiency)?;
        check_quantity(format!("panel[{i}] cost per watt"), panel.cost_per_watt)?;
    }
    Ok(())
}
