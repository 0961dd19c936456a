//! The user's current selection: region, budget, equipment and panels.
//!
//! The store is plain data. Mutations never trigger computation; the caller
//! decides when to run a recalculation after changing it.

use crate::catalog::{Catalog, CatalogEquipment, CatalogPanel, EquipmentCategory, RegionInfo};
use crate::{SelectionError, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Spending ceiling in currency. Always finite and non-negative.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize)]
pub struct Budget(f64);

impl Budget {
    /// Ceiling of a fresh simulation.
    pub const DEFAULT_AMOUNT: f64 = 500_000.0;

    pub fn new(amount: f64) -> Result<Self, SelectionError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(SelectionError::InvalidBudget(amount));
        }
        Ok(Budget(amount))
    }

    pub fn amount(self) -> f64 {
        self.0
    }
}

impl Default for Budget {
    fn default() -> Self {
        Budget(Self::DEFAULT_AMOUNT)
    }
}

impl<'de> Deserialize<'de> for Budget {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Budget::new(amount).map_err(serde::de::Error::custom)
    }
}

/// Unique key of an equipment selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EquipmentKey {
    pub category: EquipmentCategory,
    pub index: usize,
}

/// A catalog equipment item with a positive quantity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectedEquipment {
    pub key: EquipmentKey,
    pub item: CatalogEquipment,
    pub quantity: u32,
}

/// A catalog panel with a positive quantity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectedPanel {
    pub index: usize,
    pub panel: CatalogPanel,
    pub quantity: u32,
}

/// Current selections. Zero-quantity entries are never stored.
#[derive(Clone, Debug)]
pub struct SelectionStore {
    catalog: Arc<Catalog>,
    region: Option<RegionInfo>,
    energy_tariff: Option<f64>,
    equipment: BTreeMap<EquipmentKey, SelectedEquipment>,
    panels: BTreeMap<usize, SelectedPanel>,
}

impl SelectionStore {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            region: None,
            energy_tariff: None,
            equipment: BTreeMap::new(),
            panels: BTreeMap::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn region(&self) -> Option<&RegionInfo> {
        self.region.as_ref()
    }

    /// Select a region by code, or clear the selection with `None`.
    pub fn set_region(&mut self, code: Option<&str>) -> Result<(), SelectionError> {
        self.region = match code {
            None => None,
            Some(code) => Some(
                self.catalog
                    .region(code)
                    .cloned()
                    .ok_or_else(|| SelectionError::UnknownRegion(code.to_string()))?,
            ),
        };
        Ok(())
    }

    /// User-supplied tariff override, if any.
    pub fn energy_tariff(&self) -> Option<f64> {
        self.energy_tariff
    }

    pub fn set_energy_tariff(&mut self, tariff: Option<f64>) -> Result<(), SelectionError> {
        if let Some(t) = tariff {
            if !t.is_finite() || t < 0.0 {
                return Err(SelectionError::InvalidTariff(t));
            }
        }
        self.energy_tariff = tariff;
        Ok(())
    }

    /// Insert, update, or (with `quantity == 0`) remove an equipment selection.
    pub fn upsert_equipment(
        &mut self,
        category: EquipmentCategory,
        index: usize,
        quantity: u32,
    ) -> Result<(), SelectionError> {
        let key = EquipmentKey { category, index };
        if quantity == 0 {
            self.equipment.remove(&key);
            return Ok(());
        }
        if let Some(existing) = self.equipment.get_mut(&key) {
            existing.quantity = quantity;
            return Ok(());
        }
        let item = self
            .catalog
            .equipment(category, index)
            .cloned()
            .ok_or(SelectionError::UnknownEquipment { category, index })?;
        self.equipment.insert(
            key,
            SelectedEquipment {
                key,
                item,
                quantity,
            },
        );
        Ok(())
    }

    /// Insert, update, or (with `quantity == 0`) remove a panel selection.
    pub fn upsert_panel(&mut self, index: usize, quantity: u32) -> Result<(), SelectionError> {
        if quantity == 0 {
            self.panels.remove(&index);
            return Ok(());
        }
        if let Some(existing) = self.panels.get_mut(&index) {
            existing.quantity = quantity;
            return Ok(());
        }
        let panel = self
            .catalog
            .panel(index)
            .cloned()
            .ok_or(SelectionError::UnknownPanel(index))?;
        self.panels.insert(
            index,
            SelectedPanel {
                index,
                panel,
                quantity,
            },
        );
        Ok(())
    }

    /// Equipment selections in (category, index) order.
    pub fn equipment(&self) -> impl Iterator<Item = &SelectedEquipment> {
        self.equipment.values()
    }

    /// Panel selections in catalog index order.
    pub fn panels(&self) -> impl Iterator<Item = &SelectedPanel> {
        self.panels.values()
    }

    pub fn equipment_quantity(&self, category: EquipmentCategory, index: usize) -> u32 {
        self.equipment
            .get(&EquipmentKey { category, index })
            .map_or(0, |e| e.quantity)
    }

    pub fn panel_quantity(&self, index: usize) -> u32 {
        self.panels.get(&index).map_or(0, |p| p.quantity)
    }

    pub fn has_equipment(&self) -> bool {
        !self.equipment.is_empty()
    }

    pub fn has_panels(&self) -> bool {
        !self.panels.is_empty()
    }

    /// Start a new simulation: clear region, tariff override and all selections.
    pub fn reset(&mut self) {
        self.region = None;
        self.energy_tariff = None;
        self.equipment.clear();
        self.panels.clear();
    }
}

/// Check every precondition of a full viability request, reporting all failures.
pub fn validate_for_viability(
    store: &SelectionStore,
    budget: Budget,
) -> Result<(), Vec<ValidationError>> {
    let mut reasons = Vec::new();
    if store.region().is_none() {
        reasons.push(ValidationError::MissingRegion);
    }
    if !store.has_equipment() {
        reasons.push(ValidationError::NoEquipment);
    }
    if !store.has_panels() {
        reasons.push(ValidationError::NoPanels);
    }
    if budget.amount() <= 0.0 {
        reasons.push(ValidationError::NonPositiveBudget);
    }
    if reasons.is_empty() {
        Ok(())
    } else {
        Err(reasons)
    }
}
