//! Scenario files: a region, a budget and the selections to load into a session.

use std::path::Path;

use anyhow::{Context, Result};
use rig_core::EquipmentCategory;
use rig_runtime::Session;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct EquipmentEntry {
    /// `ASIC` or `GPU`, case-insensitive.
    pub category: String,
    pub index: usize,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct PanelEntry {
    pub index: usize,
    pub quantity: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub region: Option<String>,
    /// Falls back to the configured default budget.
    pub budget: Option<f64>,
    pub energy_tariff: Option<f64>,
    pub equipment: Vec<EquipmentEntry>,
    pub panels: Vec<PanelEntry>,
}

impl Scenario {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("invalid scenario")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_yaml_str(&text)
    }

    /// Replay the scenario as a sequence of session mutations.
    pub fn apply(&self, session: &mut Session) -> Result<()> {
        session.set_region(self.region.as_deref())?;
        if let Some(budget) = self.budget {
            session.set_budget(budget)?;
        }
        session.set_energy_tariff(self.energy_tariff)?;
        for e in &self.equipment {
            let category: EquipmentCategory = e.category.parse()?;
            session
                .upsert_equipment(category, e.index, e.quantity)
                .with_context(|| format!("equipment {} #{}", e.category, e.index))?;
        }
        for p in &self.panels {
            session
                .upsert_panel(p.index, p.quantity)
                .with_context(|| format!("panel #{}", p.index))?;
        }
        Ok(())
    }
}
