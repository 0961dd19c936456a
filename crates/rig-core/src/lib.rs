#![deny(warnings)]

//! Core domain models and invariants for the solar mining rig calculator.
//!
//! This crate defines the catalog reference data, the user's selection
//! state, and the derived-metrics snapshot produced by the recalculation
//! engine. It performs no computation beyond validation.

mod catalog;
mod metrics;
mod selection;

pub use catalog::{
    validate_catalog, Catalog, CatalogEquipment, CatalogPanel, EquipmentCategory, RegionCode,
    RegionInfo, DEFAULT_TARIFF_PER_KWH,
};
pub use metrics::{
    BudgetState, BudgetStatus, DerivedMetrics, EquipmentMetrics, MetricSource, SolarMetrics,
    Viability, ViabilityBreakdown,
};
pub use selection::{
    validate_for_viability, Budget, EquipmentKey, SelectedEquipment, SelectedPanel,
    SelectionStore,
};

use thiserror::Error;

/// Errors raised when mutating the selection state.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SelectionError {
    /// Region code is not present in the catalog.
    #[error("unknown region: {0}")]
    UnknownRegion(String),
    /// Equipment category name could not be parsed.
    #[error("unknown equipment category: {0}")]
    UnknownCategory(String),
    /// No catalog equipment at this category/index.
    #[error("no {category} equipment at catalog index {index}")]
    UnknownEquipment {
        category: EquipmentCategory,
        index: usize,
    },
    /// No catalog panel at this index.
    #[error("no solar panel at catalog index {0}")]
    UnknownPanel(usize),
    /// Budget must be finite and non-negative.
    #[error("invalid budget: {0}")]
    InvalidBudget(f64),
    /// Tariff override must be finite and non-negative.
    #[error("invalid energy tariff: {0}")]
    InvalidTariff(f64),
}

/// Preconditions for requesting a full viability projection.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no region selected")]
    MissingRegion,
    #[error("no mining equipment selected")]
    NoEquipment,
    #[error("no solar panels selected")]
    NoPanels,
    #[error("budget must be greater than zero")]
    NonPositiveBudget,
}

/// Invalid reference data received from the catalog source.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CatalogError {
    /// Numeric field is NaN or infinite.
    #[error("non-finite value in {0}")]
    NonFinite(String),
    /// Physical or monetary quantity is negative.
    #[error("negative value in {0}")]
    NegativeValue(String),
    /// Display name or code is blank.
    #[error("blank name in {0}")]
    BlankName(String),
}
