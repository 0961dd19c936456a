#![deny(warnings)]

//! Client for the remote pricing/physics oracle.
//!
//! The oracle owns the authoritative tariff, irradiance, coin-price and
//! solar-yield models. This crate only speaks its request/response contract:
//! field names on the wire are fixed and must not change.

mod config;
mod http;
mod mock;
mod retry;
mod wire;

pub use config::{OracleConfig, OraclePaths};
pub use http::HttpOracle;
pub use mock::{Endpoint, MockOracle};
pub use wire::{
    EquipmentLine, EquipmentSimulation, EquipmentSimulationRequest, SolarSimulation,
    SolarSimulationRequest, ViabilityRequest,
};

use async_trait::async_trait;
use rig_core::{Catalog, Viability};
use thiserror::Error;

/// Failures of a single oracle call.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum OracleError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("oracle unreachable: {0}")]
    Transport(String),
    /// Non-success HTTP status without a domain error payload.
    #[error("oracle returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// Body is not the expected JSON shape.
    #[error("malformed oracle response: {0}")]
    Decode(String),
    /// A field is missing, negative, or otherwise unusable.
    #[error("invalid field `{field}` in oracle response: {reason}")]
    InvalidField { field: String, reason: String },
    /// The oracle answered with an `erro` payload.
    #[error("{0}")]
    Domain(String),
}

impl OracleError {
    /// True for every failure except a domain-level `erro` answer.
    pub fn is_transport(&self) -> bool {
        !matches!(self, OracleError::Domain(_))
    }

    /// Worth retrying: the oracle may answer differently next time.
    pub fn is_retryable(&self) -> bool {
        match self {
            OracleError::Transport(_) => true,
            OracleError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// The three independent remote computations plus the catalog load.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Regions, tariffs, equipment and panel catalog.
    async fn initial_data(&self) -> Result<Catalog, OracleError>;

    /// Authoritative equipment totals.
    async fn simulate_equipment(
        &self,
        req: &EquipmentSimulationRequest,
    ) -> Result<EquipmentSimulation, OracleError>;

    /// Monthly solar generation for a region.
    async fn simulate_solar(
        &self,
        req: &SolarSimulationRequest,
    ) -> Result<SolarSimulation, OracleError>;

    /// Coverage, payback, revenue and emissions projection.
    async fn full_viability(&self, req: &ViabilityRequest) -> Result<Viability, OracleError>;
}
