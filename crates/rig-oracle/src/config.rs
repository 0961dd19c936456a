//! Oracle endpoint configuration.

use serde::{Deserialize, Serialize};

/// Endpoint paths relative to the oracle base URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OraclePaths {
    pub initial_data: String,
    pub equipment: String,
    pub solar: String,
    pub viability: String,
}

impl Default for OraclePaths {
    fn default() -> Self {
        Self {
            initial_data: "/api/dados-iniciais".into(),
            equipment: "/api/simular-equipamentos".into(),
            solar: "/api/simular-solar".into(),
            viability: "/api/calcular-viabilidade-completa".into(),
        }
    }
}

/// Connection settings for [`crate::HttpOracle`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub base_url: String,
    pub paths: OraclePaths,
    /// Per-request timeout. `None` leaves it to the transport.
    pub timeout_ms: Option<u64>,
    /// Attempts per call including the first; 1 disables retries.
    pub max_attempts: u32,
    /// Base of the exponential backoff between attempts.
    pub backoff_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            paths: OraclePaths::default(),
            timeout_ms: None,
            max_attempts: 1,
            backoff_ms: 200,
        }
    }
}

impl OracleConfig {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
