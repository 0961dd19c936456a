use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rig_core::{Catalog, Viability};

use crate::{
    EquipmentSimulation, EquipmentSimulationRequest, Oracle, OracleError, SolarSimulation,
    SolarSimulationRequest, ViabilityRequest,
};

/// Oracle endpoints, for call accounting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    InitialData,
    Equipment,
    Solar,
    Viability,
}

type Handler<Req, T> = Arc<dyn Fn(&Req) -> Result<T, OracleError> + Send + Sync>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process oracle with scriptable answers.
/// Useful for tests and offline demos.
pub struct MockOracle {
    catalog: Catalog,
    equipment: Mutex<Handler<EquipmentSimulationRequest, EquipmentSimulation>>,
    solar: Mutex<Handler<SolarSimulationRequest, SolarSimulation>>,
    viability: Mutex<Handler<ViabilityRequest, Viability>>,
    delays: Mutex<HashMap<Endpoint, VecDeque<Duration>>>,
    calls: Mutex<Vec<Endpoint>>,
}

impl MockOracle {
    /// Equipment calls echo the request totals; solar and viability calls
    /// fail as unreachable until a handler is installed.
    pub fn new(catalog: Catalog) -> Self {
        let equipment: Handler<EquipmentSimulationRequest, EquipmentSimulation> =
            Arc::new(|req: &EquipmentSimulationRequest| Ok(Self::echo_equipment(req)));
        let solar: Handler<SolarSimulationRequest, SolarSimulation> =
            Arc::new(|_: &SolarSimulationRequest| {
                Err(OracleError::Transport("solar endpoint not scripted".into()))
            });
        let viability: Handler<ViabilityRequest, Viability> = Arc::new(|_: &ViabilityRequest| {
            Err(OracleError::Transport(
                "viability endpoint not scripted".into(),
            ))
        });
        Self {
            catalog,
            equipment: Mutex::new(equipment),
            solar: Mutex::new(solar),
            viability: Mutex::new(viability),
            delays: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Totals the oracle would compute for `req` with the fixed 24 h × 30 d model.
    pub fn echo_equipment(req: &EquipmentSimulationRequest) -> EquipmentSimulation {
        let mut sim = EquipmentSimulation::default();
        for line in &req.equipment {
            let q = f64::from(line.quantity);
            sim.power_w += line.power_w * q;
            sim.cost += line.unit_cost * q;
            sim.hashrate_th += line.hashrate_th * q;
        }
        sim.monthly_energy_kwh = sim.power_w * 24.0 * 30.0 / 1000.0;
        sim.daily_energy_kwh = Some(sim.power_w * 24.0 / 1000.0);
        sim
    }

    pub fn on_equipment<F>(&self, f: F)
    where
        F: Fn(&EquipmentSimulationRequest) -> Result<EquipmentSimulation, OracleError>
            + Send
            + Sync
            + 'static,
    {
        *lock(&self.equipment) = Arc::new(f);
    }

    pub fn on_solar<F>(&self, f: F)
    where
        F: Fn(&SolarSimulationRequest) -> Result<SolarSimulation, OracleError>
            + Send
            + Sync
            + 'static,
    {
        *lock(&self.solar) = Arc::new(f);
    }

    pub fn on_viability<F>(&self, f: F)
    where
        F: Fn(&ViabilityRequest) -> Result<Viability, OracleError> + Send + Sync + 'static,
    {
        *lock(&self.viability) = Arc::new(f);
    }

    /// Delay the next call to `endpoint`. Queued delays are consumed in order.
    pub fn delay_next(&self, endpoint: Endpoint, delay: Duration) {
        lock(&self.delays)
            .entry(endpoint)
            .or_default()
            .push_back(delay);
    }

    /// Endpoints called so far, in call order.
    pub fn calls(&self) -> Vec<Endpoint> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        lock(&self.calls).iter().filter(|e| **e == endpoint).count()
    }

    async fn enter(&self, endpoint: Endpoint) {
        lock(&self.calls).push(endpoint);
        let delay = lock(&self.delays)
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front);
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn initial_data(&self) -> Result<Catalog, OracleError> {
        self.enter(Endpoint::InitialData).await;
        Ok(self.catalog.clone())
    }

    async fn simulate_equipment(
        &self,
        req: &EquipmentSimulationRequest,
    ) -> Result<EquipmentSimulation, OracleError> {
        self.enter(Endpoint::Equipment).await;
        let handler = lock(&self.equipment).clone();
        handler(req)
    }

    async fn simulate_solar(
        &self,
        req: &SolarSimulationRequest,
    ) -> Result<SolarSimulation, OracleError> {
        self.enter(Endpoint::Solar).await;
        let handler = lock(&self.solar).clone();
        handler(req)
    }

    async fn full_viability(&self, req: &ViabilityRequest) -> Result<Viability, OracleError> {
        self.enter(Endpoint::Viability).await;
        let handler = lock(&self.viability).clone();
        handler(req)
    }
}
