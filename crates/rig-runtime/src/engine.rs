//! The recalculation orchestrator.
//!
//! A run executes its six steps strictly in order, suspending at each oracle
//! call. Runs are not interlocked: a second run may start while the first is
//! waiting on the oracle, and readers may observe a snapshot merged from
//! several runs. [`RunOrdering::LastRunWins`] narrows that to whole runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rig_core::{
    validate_for_viability, Budget, DerivedMetrics, EquipmentMetrics, MetricSource,
    SelectionStore, SolarMetrics, ValidationError, Viability,
};
use rig_econ::EquipmentTotals;
use rig_oracle::{
    EquipmentSimulationRequest, Oracle, OracleError, SolarSimulationRequest, ViabilityRequest,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::events::{
    CascadeEvent, CascadeReport, CascadeStep, StepOutcome, StepReport, ViabilityOutcome,
};
use crate::{EngineConfig, RunOrdering, Session};

struct EngineState {
    metrics: DerivedMetrics,
    /// Highest run id that has merged at least one step.
    newest_merged: u64,
}

pub struct Engine {
    oracle: Arc<dyn Oracle>,
    ordering: RunOrdering,
    state: Mutex<EngineState>,
    next_run: AtomicU64,
    events: broadcast::Sender<CascadeEvent>,
}

/// Per-run scratch state; the shared snapshot only sees merged sections.
struct Run<'a> {
    id: u64,
    engine: &'a Engine,
    steps: Vec<StepReport>,
}

impl Run<'_> {
    /// Merge `apply` into the shared snapshot unless a newer run got there first.
    fn merge(
        &mut self,
        step: CascadeStep,
        outcome: StepOutcome,
        apply: impl FnOnce(&mut DerivedMetrics),
    ) -> bool {
        let engine = self.engine;
        let (outcome, snapshot) = {
            let mut state = engine.lock();
            if engine.ordering == RunOrdering::LastRunWins && self.id < state.newest_merged {
                debug!(run_id = self.id, newest = state.newest_merged, step = %step, "discarding stale step result");
                (StepOutcome::Stale, state.metrics.clone())
            } else {
                apply(&mut state.metrics);
                state.newest_merged = state.newest_merged.max(self.id);
                (outcome, state.metrics.clone())
            }
        };
        let merged = outcome != StepOutcome::Stale;
        // No subscribers is fine.
        let _ = engine.events.send(CascadeEvent {
            run_id: self.id,
            step,
            outcome: outcome.clone(),
            snapshot,
        });
        self.steps.push(StepReport { step, outcome });
        merged
    }

    fn merge_viability(&mut self, result: Result<Viability, OracleError>) -> ViabilityOutcome {
        match result {
            Ok(v) => {
                debug!(run_id = self.id, coverage_pct = v.coverage_pct, "viability projection received");
                let coin = v.monthly_coin;
                let merged = self.merge(CascadeStep::Viability, StepOutcome::Applied, |m| {
                    if let Some(coin) = coin {
                        m.equipment.monthly_coin_estimate = coin;
                    }
                    m.viability = Some(v);
                });
                if merged {
                    ViabilityOutcome::Applied
                } else {
                    ViabilityOutcome::Stale
                }
            }
            Err(OracleError::Domain(msg)) => {
                warn!(run_id = self.id, error = %msg, "oracle rejected viability request");
                let merged = self.merge(
                    CascadeStep::Viability,
                    StepOutcome::Rejected(msg.clone()),
                    |_| {},
                );
                if merged {
                    ViabilityOutcome::DomainFailure(msg)
                } else {
                    ViabilityOutcome::Stale
                }
            }
            Err(e) => {
                warn!(run_id = self.id, error = %e, "viability projection unavailable, keeping previous figures");
                let merged = self.merge(
                    CascadeStep::Viability,
                    StepOutcome::Failed(e.to_string()),
                    |_| {},
                );
                if merged {
                    ViabilityOutcome::Unavailable(e.to_string())
                } else {
                    ViabilityOutcome::Stale
                }
            }
        }
    }
}

/// `Rejected` for an `erro` answer, `Fallback` for everything else.
fn failure_outcome(e: &OracleError) -> StepOutcome {
    match e {
        OracleError::Domain(msg) => StepOutcome::Rejected(msg.clone()),
        other => StepOutcome::Fallback(other.to_string()),
    }
}

fn equipment_metrics(t: &EquipmentTotals, source: MetricSource) -> EquipmentMetrics {
    EquipmentMetrics {
        total_power_w: t.power_w,
        total_cost: t.cost,
        total_hashrate_th: t.hashrate_th,
        monthly_energy_kwh: t.monthly_energy_kwh,
        daily_energy_kwh: t.daily_energy_kwh,
        monthly_coin_estimate: rig_econ::monthly_coin_estimate(t.hashrate_th),
        source,
    }
}

impl Engine {
    pub fn new(oracle: Arc<dyn Oracle>, config: &EngineConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            oracle,
            ordering: config.ordering,
            state: Mutex::new(EngineState {
                metrics: DerivedMetrics::default(),
                newest_merged: 0,
            }),
            next_run: AtomicU64::new(1),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ordering(&self) -> RunOrdering {
        self.ordering
    }

    /// The current snapshot, possibly mid-cascade.
    pub fn snapshot(&self) -> DerivedMetrics {
        self.lock().metrics.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CascadeEvent> {
        self.events.subscribe()
    }

    /// Drop every derived figure, as for a new simulation.
    pub fn reset(&self) {
        self.lock().metrics = DerivedMetrics::default();
    }

    pub async fn recalculate_session(&self, session: &Session) -> CascadeReport {
        self.recalculate_all(session.store(), session.budget()).await
    }

    /// Run the six-step cascade against the current selections.
    ///
    /// Never fails as a whole: every oracle failure is contained to its step
    /// and reported in the returned [`CascadeReport`].
    pub async fn recalculate_all(&self, store: &SelectionStore, budget: Budget) -> CascadeReport {
        let id = self.next_run.fetch_add(1, Ordering::SeqCst);
        info!(run_id = id, "cascade started");
        let mut run = Run {
            id,
            engine: self,
            steps: Vec::with_capacity(CascadeStep::ALL.len()),
        };

        // 1. local equipment totals
        let local = rig_econ::aggregate_equipment(store.equipment());
        let mut equipment = equipment_metrics(&local, MetricSource::Local);
        let provisional = equipment.clone();
        run.merge(CascadeStep::LocalEquipment, StepOutcome::Applied, |m| {
            m.equipment = provisional;
        });

        // 2. oracle equipment simulation
        let equipment_req = EquipmentSimulationRequest::from_selections(store.equipment());
        match self.oracle.simulate_equipment(&equipment_req).await {
            Ok(sim) => {
                debug!(run_id = id, power_w = sim.power_w, cost = sim.cost, "oracle equipment totals");
                equipment = equipment_metrics(
                    &EquipmentTotals {
                        power_w: sim.power_w,
                        cost: sim.cost,
                        hashrate_th: sim.hashrate_th,
                        monthly_energy_kwh: sim.monthly_energy_kwh,
                        daily_energy_kwh: sim.daily_energy_kwh.unwrap_or(local.daily_energy_kwh),
                    },
                    MetricSource::Oracle,
                );
                let merged = equipment.clone();
                run.merge(CascadeStep::OracleEquipment, StepOutcome::Applied, |m| {
                    m.equipment = merged;
                });
            }
            Err(e) => {
                warn!(
                    run_id = id,
                    error = %e,
                    local_power_w = local.power_w,
                    local_cost = local.cost,
                    "equipment simulation failed, keeping local totals"
                );
                run.merge(CascadeStep::OracleEquipment, failure_outcome(&e), |_| {});
            }
        }

        // 3. local solar totals, generation untouched
        let panels = rig_econ::aggregate_panels(store.panels());
        let mut solar = SolarMetrics {
            panel_count: panels.panel_count,
            total_rated_power_w: panels.rated_power_w,
            total_cost: panels.cost,
            footprint_m2: panels.footprint_m2,
            monthly_generation_kwh: 0.0,
            generation_source: MetricSource::Skipped,
        };
        run.merge(CascadeStep::LocalSolar, StepOutcome::Applied, |m| {
            m.solar.panel_count = panels.panel_count;
            m.solar.total_rated_power_w = panels.rated_power_w;
            m.solar.total_cost = panels.cost;
            m.solar.footprint_m2 = panels.footprint_m2;
        });

        // 4. solar generation
        let region = store.region().map(|r| r.code.as_str().to_string());
        match (&region, panels.panel_count) {
            (Some(code), count) if count > 0 => {
                let req = SolarSimulationRequest {
                    panel_count: count,
                    panel_power_w: panels.average_panel_power_w(),
                    region: code.clone(),
                };
                let outcome = match self.oracle.simulate_solar(&req).await {
                    Ok(sim) => {
                        debug!(run_id = id, generation_kwh = sim.generation_kwh, "oracle solar generation");
                        solar.monthly_generation_kwh = sim.generation_kwh;
                        solar.generation_source = MetricSource::Oracle;
                        if let Some(area) = sim.footprint_m2 {
                            solar.footprint_m2 = area;
                        }
                        StepOutcome::Applied
                    }
                    Err(e) => {
                        let fallback = rig_econ::fallback_generation_kwh(panels.rated_power_w);
                        warn!(
                            run_id = id,
                            error = %e,
                            fallback_kwh = fallback,
                            "solar simulation failed, using flat capacity-factor estimate"
                        );
                        solar.monthly_generation_kwh = fallback;
                        solar.generation_source = MetricSource::Fallback;
                        failure_outcome(&e)
                    }
                };
                let merged = solar.clone();
                run.merge(CascadeStep::SolarGeneration, outcome, |m| {
                    m.solar.monthly_generation_kwh = merged.monthly_generation_kwh;
                    m.solar.generation_source = merged.generation_source;
                    m.solar.footprint_m2 = merged.footprint_m2;
                });
            }
            _ => {
                run.merge(CascadeStep::SolarGeneration, StepOutcome::Skipped, |m| {
                    m.solar.monthly_generation_kwh = 0.0;
                    m.solar.generation_source = MetricSource::Skipped;
                });
            }
        }

        // 5. budget over this run's final costs
        let status = rig_econ::track_budget(
            equipment.total_cost,
            equipment.total_cost + solar.total_cost,
            budget.amount(),
        );
        run.merge(CascadeStep::Budget, StepOutcome::Applied, |m| {
            m.budget = status;
        });

        // 6. full viability
        let ready = validate_for_viability(store, budget)
            .and(region.ok_or_else(|| vec![ValidationError::MissingRegion]));
        let viability = match ready {
            Ok(code) => {
                let req = ViabilityRequest {
                    region: code,
                    equipment: equipment_req.equipment,
                    panel_count: panels.panel_count,
                    panel_power_w: panels.average_panel_power_w(),
                    solar_system_cost: Some(panels.cost),
                    energy_tariff: store.energy_tariff(),
                    budget: budget.amount(),
                };
                let result = self.oracle.full_viability(&req).await;
                run.merge_viability(result)
            }
            Err(reasons) => {
                debug!(run_id = id, ?reasons, "viability preconditions unmet");
                run.merge(CascadeStep::Viability, StepOutcome::Skipped, |_| {});
                ViabilityOutcome::Skipped(reasons)
            }
        };

        info!(run_id = id, viability = ?viability, "cascade finished");
        CascadeReport {
            run_id: id,
            steps: run.steps,
            viability,
        }
    }
}
