//! Caller-owned selection state with a change signal.
//!
//! Every successful mutation bumps a revision on a `watch` channel. The
//! owner awaits the channel and calls [`crate::Engine::recalculate_session`];
//! the session itself never computes anything.

use std::sync::Arc;

use rig_core::{Budget, Catalog, EquipmentCategory, SelectionError, SelectionStore};
use tokio::sync::watch;

pub struct Session {
    store: SelectionStore,
    budget: Budget,
    default_budget: Budget,
    revision: watch::Sender<u64>,
}

impl Session {
    pub fn new(catalog: Arc<Catalog>, default_budget: Budget) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            store: SelectionStore::new(catalog),
            budget: default_budget,
            default_budget,
            revision,
        }
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Number of mutations applied so far.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// A receiver that wakes after every mutation.
    pub fn triggers(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }

    pub fn set_region(&mut self, code: Option<&str>) -> Result<(), SelectionError> {
        self.store.set_region(code)?;
        self.bump();
        Ok(())
    }

    pub fn set_budget(&mut self, amount: f64) -> Result<(), SelectionError> {
        self.budget = Budget::new(amount)?;
        self.bump();
        Ok(())
    }

    pub fn set_energy_tariff(&mut self, tariff: Option<f64>) -> Result<(), SelectionError> {
        self.store.set_energy_tariff(tariff)?;
        self.bump();
        Ok(())
    }

    pub fn upsert_equipment(
        &mut self,
        category: EquipmentCategory,
        index: usize,
        quantity: u32,
    ) -> Result<(), SelectionError> {
        self.store.upsert_equipment(category, index, quantity)?;
        self.bump();
        Ok(())
    }

    pub fn upsert_panel(&mut self, index: usize, quantity: u32) -> Result<(), SelectionError> {
        self.store.upsert_panel(index, quantity)?;
        self.bump();
        Ok(())
    }

    /// Start a new simulation: clear selections and restore the default budget.
    pub fn reset(&mut self) {
        self.store.reset();
        self.budget = self.default_budget;
        self.bump();
    }
}
