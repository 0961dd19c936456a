//! `reqwest`-backed oracle client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use rig_core::{Catalog, Viability};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::retry::with_retry;
use crate::wire::{
    domain_error, EquipmentSimulationWire, InitialDataWire, SolarSimulationWire, ViabilityWire,
};
use crate::{
    EquipmentSimulation, EquipmentSimulationRequest, Oracle, OracleConfig, OracleError,
    SolarSimulation, SolarSimulationRequest, ViabilityRequest,
};

/// Oracle reached over HTTP/JSON.
#[derive(Clone, Debug)]
pub struct HttpOracle {
    client: Client,
    config: OracleConfig,
}

impl HttpOracle {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let mut builder = Client::builder();
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder
            .build()
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, OracleError> {
        let url = self.config.url(path);
        debug!(%url, "GET");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        decode(resp).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, OracleError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.config.url(path);
        debug!(%url, "POST");
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        decode(resp).await
    }
}

/// Classify a response: `erro` payloads become domain errors unless the
/// server itself failed (5xx).
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, OracleError> {
    let status = resp.status();
    let body = resp
        .bytes()
        .await
        .map_err(|e| OracleError::Transport(e.to_string()))?;
    if !status.is_server_error() {
        if let Some(message) = domain_error(&body) {
            return Err(OracleError::Domain(message));
        }
    }
    if !status.is_success() {
        return Err(OracleError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    serde_json::from_slice(&body).map_err(|e| OracleError::Decode(e.to_string()))
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn initial_data(&self) -> Result<Catalog, OracleError> {
        let this = self;
        let path = self.config.paths.initial_data.as_str();
        let wire: InitialDataWire = with_retry(
            "initial_data",
            self.config.max_attempts,
            self.config.backoff_ms,
            move || this.get_json(path),
        )
        .await?;
        wire.into_catalog()
    }

    async fn simulate_equipment(
        &self,
        req: &EquipmentSimulationRequest,
    ) -> Result<EquipmentSimulation, OracleError> {
        let this = self;
        let path = self.config.paths.equipment.as_str();
        let wire: EquipmentSimulationWire = with_retry(
            "simulate_equipment",
            self.config.max_attempts,
            self.config.backoff_ms,
            move || this.post_json(path, req),
        )
        .await?;
        wire.into_domain()
    }

    async fn simulate_solar(
        &self,
        req: &SolarSimulationRequest,
    ) -> Result<SolarSimulation, OracleError> {
        let this = self;
        let path = self.config.paths.solar.as_str();
        let wire: SolarSimulationWire = with_retry(
            "simulate_solar",
            self.config.max_attempts,
            self.config.backoff_ms,
            move || this.post_json(path, req),
        )
        .await?;
        wire.into_domain()
    }

    async fn full_viability(&self, req: &ViabilityRequest) -> Result<Viability, OracleError> {
        let this = self;
        let path = self.config.paths.viability.as_str();
        let wire: ViabilityWire = with_retry(
            "full_viability",
            self.config.max_attempts,
            self.config.backoff_ms,
            move || this.post_json(path, req),
        )
        .await?;
        wire.into_domain()
    }
}
