#![deny(warnings)]

//! Recalculation runtime: runs the six-step cascade that turns the current
//! selections into a [`rig_core::DerivedMetrics`] snapshot, merging local
//! arithmetic with oracle answers as they land.

mod config;
mod engine;
mod events;
mod session;

pub use config::{EngineConfig, RunOrdering};
pub use engine::Engine;
pub use events::{
    CascadeEvent, CascadeReport, CascadeStep, StepOutcome, StepReport, ViabilityOutcome,
};
pub use session::Session;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The oracle rejected the viability request with an `erro` message.
    #[error("oracle rejected the viability request: {0}")]
    Domain(String),
    /// The viability projection could not be fetched; previous figures stand.
    #[error("viability projection unavailable: {0}")]
    ViabilityUnavailable(String),
    #[error("config error: {0}")]
    Config(String),
}
