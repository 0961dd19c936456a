use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;
use rig_core::{
    Budget, BudgetState, Catalog, CatalogEquipment, CatalogPanel, DerivedMetrics,
    EquipmentCategory, MetricSource, RegionCode, RegionInfo, SelectionStore, ValidationError,
    Viability, ViabilityBreakdown,
};
use rig_oracle::{Endpoint, EquipmentSimulation, MockOracle, OracleError, SolarSimulation};
use rig_runtime::{
    CascadeStep, Engine, EngineConfig, EngineError, RunOrdering, Session, StepOutcome,
    ViabilityOutcome,
};

fn catalog() -> Catalog {
    let mut c = Catalog::default();
    let code = RegionCode("SP".into());
    c.regions.insert(
        code.clone(),
        RegionInfo {
            code,
            name: "São Paulo".into(),
            irradiance_kwh_m2_day: 1.78,
            tariff_per_kwh: 0.671,
            emission_factor: Some(0.089),
        },
    );
    c.equipment.insert(
        EquipmentCategory::Asic,
        vec![CatalogEquipment {
            model: "Test Rig".into(),
            manufacturer: "Acme".into(),
            power_w: 3000.0,
            hashrate_th: 90.0,
            unit_cost: 50_000.0,
        }],
    );
    c.panels.push(CatalogPanel {
        model: "Test 500W".into(),
        kind: "Monocristalino".into(),
        rated_power_w: 500.0,
        efficiency: 0.21,
        width_m: 2.0,
        height_m: 1.0,
        cost_per_watt: 1.08,
        unit_price: 539.10,
    });
    c
}

/// `catalog()` plus a GPU and a second panel model.
fn wide_catalog() -> Catalog {
    let mut c = catalog();
    c.equipment.insert(
        EquipmentCategory::Gpu,
        vec![CatalogEquipment {
            model: "Test GPU".into(),
            manufacturer: "Acme".into(),
            power_w: 450.0,
            hashrate_th: 0.00012,
            unit_cost: 13_000.0,
        }],
    );
    c.panels.push(CatalogPanel {
        model: "Test 455W".into(),
        kind: "Policristalino".into(),
        rated_power_w: 455.0,
        efficiency: 0.19,
        width_m: 2.1,
        height_m: 1.05,
        cost_per_watt: 0.97,
        unit_price: 441.35,
    });
    c
}

fn setup(ordering: RunOrdering) -> (Arc<MockOracle>, Engine, Arc<Catalog>) {
    let catalog = Arc::new(catalog());
    let oracle = Arc::new(MockOracle::new((*catalog).clone()));
    let config = EngineConfig {
        ordering,
        ..Default::default()
    };
    let engine = Engine::new(oracle.clone(), &config);
    (oracle, engine, catalog)
}

fn projection(coverage_pct: f64) -> Viability {
    Viability {
        coverage_pct,
        monthly_savings: 1_200.0,
        monthly_mining_revenue: 9_800.0,
        payback_months: 14.2,
        avoided_co2_kg: 38.4,
        monthly_coin: Some(0.0123),
        total_investment: 55_391.0,
        coin_price: 350_000.0,
        energy_tariff: 0.671,
        energy_cost_without_solar: 1_449.36,
        energy_deficit_cost: 1_065.0,
        net_monthly_profit: 8_300.0,
        verdict: None,
        breakdown: ViabilityBreakdown {
            solar_energy_used_kwh: 573.0,
            energy_deficit_kwh: 1_587.0,
            monthly_maintenance_cost: 150.0,
            coin_price: 350_000.0,
        },
    }
}

fn full_store(catalog: Arc<Catalog>) -> SelectionStore {
    let mut store = SelectionStore::new(catalog);
    store.set_region(Some("SP")).unwrap();
    store
        .upsert_equipment(EquipmentCategory::Asic, 0, 1)
        .unwrap();
    store.upsert_panel(0, 10).unwrap();
    store
}

#[tokio::test]
async fn two_rigs_over_budget_are_exceeded() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    let mut store = SelectionStore::new(catalog);
    store
        .upsert_equipment(EquipmentCategory::Asic, 0, 2)
        .unwrap();

    let report = engine
        .recalculate_all(&store, Budget::new(80_000.0).unwrap())
        .await;
    let m = engine.snapshot();
    assert_eq!(m.equipment.total_power_w, 6000.0);
    assert_eq!(m.equipment.total_cost, 100_000.0);
    assert_eq!(m.equipment.total_hashrate_th, 180.0);
    assert_eq!(m.equipment.monthly_energy_kwh, 4320.0);
    assert_eq!(m.equipment.source, MetricSource::Oracle);
    assert_eq!(m.budget.equipment_state, BudgetState::Exceeded);
    assert_eq!(m.budget.combined_state, BudgetState::Exceeded);
    assert_eq!(
        report.viability,
        ViabilityOutcome::Skipped(vec![
            ValidationError::MissingRegion,
            ValidationError::NoPanels
        ])
    );
    assert_eq!(oracle.call_count(Endpoint::Viability), 0);
    assert!(report.check().is_ok());
}

#[tokio::test]
async fn domain_failure_leaves_viability_unchanged() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    oracle.on_solar(|_| {
        Ok(SolarSimulation {
            generation_kwh: 610.0,
            ..Default::default()
        })
    });
    oracle.on_viability(|_| Ok(projection(28.1)));
    let store = full_store(catalog);

    let first = engine.recalculate_all(&store, Budget::default()).await;
    assert_eq!(first.viability, ViabilityOutcome::Applied);
    let before = engine.snapshot().viability;
    assert_eq!(before, Some(projection(28.1)));

    oracle.on_viability(|_| Err(OracleError::Domain("estado inválido".into())));
    let second = engine.recalculate_all(&store, Budget::default()).await;
    assert_eq!(
        second.viability,
        ViabilityOutcome::DomainFailure("estado inválido".into())
    );
    assert!(matches!(second.check(), Err(EngineError::Domain(ref m)) if m == "estado inválido"));
    assert_eq!(engine.snapshot().viability, before);
}

#[tokio::test]
async fn unreachable_viability_keeps_previous_figures() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    oracle.on_viability(|_| Ok(projection(30.0)));
    let store = full_store(catalog);
    engine.recalculate_all(&store, Budget::default()).await;

    oracle.on_viability(|_| Err(OracleError::Transport("connection refused".into())));
    let report = engine.recalculate_all(&store, Budget::default()).await;
    assert!(matches!(report.viability, ViabilityOutcome::Unavailable(_)));
    assert!(matches!(
        report.check(),
        Err(EngineError::ViabilityUnavailable(_))
    ));
    assert_eq!(engine.snapshot().viability, Some(projection(30.0)));
}

#[tokio::test]
async fn repeated_runs_are_byte_identical() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    oracle.on_solar(|req| {
        Ok(SolarSimulation {
            generation_kwh: req.panel_count as f64 * 61.0,
            footprint_m2: Some(20.0),
            system_power_kw: Some(5.0),
        })
    });
    oracle.on_viability(|_| Ok(projection(28.1)));
    let store = full_store(catalog);

    engine.recalculate_all(&store, Budget::default()).await;
    let a = serde_json::to_vec(&engine.snapshot()).unwrap();
    engine.recalculate_all(&store, Budget::default()).await;
    let b = serde_json::to_vec(&engine.snapshot()).unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn generation_is_zero_without_region_or_panels() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    oracle.on_solar(|_| {
        Ok(SolarSimulation {
            generation_kwh: 999.0,
            ..Default::default()
        })
    });

    let mut store = SelectionStore::new(catalog.clone());
    store.upsert_panel(0, 10).unwrap();
    let report = engine.recalculate_all(&store, Budget::default()).await;
    assert_eq!(engine.snapshot().solar.monthly_generation_kwh, 0.0);
    assert_eq!(
        engine.snapshot().solar.generation_source,
        MetricSource::Skipped
    );
    assert_eq!(
        report.outcome(CascadeStep::SolarGeneration),
        Some(&StepOutcome::Skipped)
    );

    let mut store = SelectionStore::new(catalog);
    store.set_region(Some("SP")).unwrap();
    engine.recalculate_all(&store, Budget::default()).await;
    assert_eq!(engine.snapshot().solar.monthly_generation_kwh, 0.0);
    assert_eq!(oracle.call_count(Endpoint::Solar), 0);
}

#[tokio::test]
async fn unreachable_solar_uses_flat_estimate() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    let store = full_store(catalog);

    let report = engine.recalculate_all(&store, Budget::default()).await;
    let solar = engine.snapshot().solar;
    assert_eq!(solar.panel_count, 10);
    assert_eq!(solar.total_rated_power_w, 5000.0);
    assert!((solar.monthly_generation_kwh - 573.75).abs() < 1e-9);
    assert_eq!(solar.generation_source, MetricSource::Fallback);
    assert!(matches!(
        report.outcome(CascadeStep::SolarGeneration),
        Some(StepOutcome::Fallback(_))
    ));
    assert_eq!(oracle.call_count(Endpoint::Solar), 1);
}

#[tokio::test]
async fn domain_rejected_solar_falls_back_but_is_reported() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    oracle.on_solar(|_| Err(OracleError::Domain("Estado inválido".into())));
    oracle.on_viability(|_| Ok(projection(28.1)));
    let store = full_store(catalog);
    let report = engine.recalculate_all(&store, Budget::default()).await;
    let solar = engine.snapshot().solar;
    assert!((solar.monthly_generation_kwh - 573.75).abs() < 1e-9);
    assert_eq!(solar.generation_source, MetricSource::Fallback);
    assert_eq!(
        report.outcome(CascadeStep::SolarGeneration),
        Some(&StepOutcome::Rejected("Estado inválido".into()))
    );
    assert_eq!(
        report.rejections().collect::<Vec<_>>(),
        vec![(CascadeStep::SolarGeneration, "Estado inválido")]
    );
    assert!(matches!(report.check(), Err(EngineError::Domain(ref m)) if m == "Estado inválido"));

    oracle.on_solar(|_| Err(OracleError::Transport("connection refused".into())));
    let report = engine.recalculate_all(&store, Budget::default()).await;
    assert!(matches!(
        report.outcome(CascadeStep::SolarGeneration),
        Some(StepOutcome::Fallback(_))
    ));
    assert_eq!(report.rejections().count(), 0);
    assert!(report.check().is_ok());
}

#[tokio::test]
async fn domain_rejected_equipment_keeps_local_totals() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    oracle.on_equipment(|_| Err(OracleError::Domain("Nenhum equipamento".into())));
    let mut store = SelectionStore::new(catalog);
    store
        .upsert_equipment(EquipmentCategory::Asic, 0, 2)
        .unwrap();

    let report = engine.recalculate_all(&store, Budget::default()).await;
    assert_eq!(engine.snapshot().equipment.total_power_w, 6000.0);
    assert_eq!(engine.snapshot().equipment.source, MetricSource::Local);
    assert_eq!(
        report.outcome(CascadeStep::OracleEquipment),
        Some(&StepOutcome::Rejected("Nenhum equipamento".into()))
    );
    assert!(matches!(report.check(), Err(EngineError::Domain(_))));
}

#[tokio::test]
async fn equipment_failure_keeps_local_totals() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    oracle.on_equipment(|_| Err(OracleError::Transport("timed out".into())));
    let mut store = SelectionStore::new(catalog);
    store
        .upsert_equipment(EquipmentCategory::Asic, 0, 2)
        .unwrap();

    let report = engine.recalculate_all(&store, Budget::default()).await;
    let m = engine.snapshot();
    assert_eq!(m.equipment.total_power_w, 6000.0);
    assert_eq!(m.equipment.daily_energy_kwh, 144.0);
    assert_eq!(m.equipment.source, MetricSource::Local);
    assert!(matches!(
        report.outcome(CascadeStep::OracleEquipment),
        Some(StepOutcome::Fallback(_))
    ));
    assert_eq!(report.steps.len(), 6);
}

#[tokio::test]
async fn oracle_equipment_totals_override_local() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    oracle.on_equipment(|_| {
        Ok(EquipmentSimulation {
            power_w: 3100.0,
            cost: 52_000.0,
            hashrate_th: 91.0,
            monthly_energy_kwh: 2232.0,
            daily_energy_kwh: None,
        })
    });
    let mut store = SelectionStore::new(catalog);
    store
        .upsert_equipment(EquipmentCategory::Asic, 0, 1)
        .unwrap();

    engine.recalculate_all(&store, Budget::default()).await;
    let m = engine.snapshot();
    assert_eq!(m.equipment.total_power_w, 3100.0);
    assert_eq!(m.equipment.total_cost, 52_000.0);
    assert_eq!(m.equipment.monthly_energy_kwh, 2232.0);
    assert_eq!(m.equipment.daily_energy_kwh, 72.0);
    assert_eq!(m.budget.equipment_headroom, 500_000.0 - 52_000.0);
}

#[tokio::test]
async fn equipment_call_fires_even_without_equipment() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    let store = SelectionStore::new(catalog);
    engine.recalculate_all(&store, Budget::default()).await;
    assert_eq!(oracle.calls(), vec![Endpoint::Equipment]);
    assert_eq!(engine.snapshot().equipment.total_power_w, 0.0);
}

#[tokio::test]
async fn viability_coin_figure_replaces_local_estimate() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    oracle.on_viability(|_| Ok(projection(28.1)));
    let store = full_store(catalog);
    let mut rx = engine.subscribe();

    engine.recalculate_all(&store, Budget::default()).await;
    let first = rx.recv().await.unwrap();
    assert_eq!(first.step, CascadeStep::LocalEquipment);
    assert!((first.snapshot.equipment.monthly_coin_estimate - 0.00243).abs() < 1e-12);
    assert_eq!(engine.snapshot().equipment.monthly_coin_estimate, 0.0123);
}

#[tokio::test]
async fn viability_request_carries_selection() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    oracle.on_viability(move |req| {
        sink.lock().unwrap().push(req.clone());
        Ok(projection(10.0))
    });
    let mut session = Session::new(catalog, Budget::default());
    session.set_region(Some("SP")).unwrap();
    session
        .upsert_equipment(EquipmentCategory::Asic, 0, 2)
        .unwrap();
    session.upsert_panel(0, 10).unwrap();

    engine.recalculate_session(&session).await;
    session.set_energy_tariff(Some(0.95)).unwrap();
    engine.recalculate_session(&session).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].region, "SP");
    assert_eq!(seen[0].equipment.len(), 1);
    assert_eq!(seen[0].equipment[0].quantity, 2);
    assert_eq!(seen[0].panel_count, 10);
    assert_eq!(seen[0].panel_power_w, 500);
    assert_eq!(seen[0].budget, 500_000.0);
    assert!((seen[0].solar_system_cost.unwrap() - 5391.0).abs() < 1e-9);
    assert_eq!(seen[0].energy_tariff, None);
    assert_eq!(seen[1].energy_tariff, Some(0.95));
}

#[tokio::test]
async fn zero_budget_skips_viability() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    let store = full_store(catalog);
    let report = engine
        .recalculate_all(&store, Budget::new(0.0).unwrap())
        .await;
    assert_eq!(
        report.viability,
        ViabilityOutcome::Skipped(vec![ValidationError::NonPositiveBudget])
    );
    let m = engine.snapshot();
    assert_eq!(m.budget.equipment_spend_pct, 0.0);
    assert_eq!(m.budget.combined_spend_pct, 0.0);
    assert_eq!(oracle.call_count(Endpoint::Viability), 0);
}

#[tokio::test]
async fn emits_events_after_every_step() {
    let (_oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    let store = full_store(catalog);
    let mut rx = engine.subscribe();
    let report = engine.recalculate_all(&store, Budget::default()).await;

    let mut steps = Vec::new();
    let mut sources = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        assert_eq!(ev.run_id, report.run_id);
        steps.push(ev.step);
        sources.push(ev.snapshot.equipment.source);
    }
    assert_eq!(steps, CascadeStep::ALL.to_vec());
    assert_eq!(sources[0], MetricSource::Local);
    assert_eq!(sources[1], MetricSource::Oracle);
}

fn overlapping_stores(catalog: &Arc<Catalog>) -> (SelectionStore, SelectionStore) {
    let mut slow = SelectionStore::new(catalog.clone());
    slow.upsert_equipment(EquipmentCategory::Asic, 0, 1)
        .unwrap();
    let mut fast = SelectionStore::new(catalog.clone());
    fast.upsert_equipment(EquipmentCategory::Asic, 0, 3)
        .unwrap();
    (slow, fast)
}

#[tokio::test]
async fn overlapping_runs_interleave_by_default() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    oracle.delay_next(Endpoint::Equipment, Duration::from_millis(50));
    let (slow, fast) = overlapping_stores(&catalog);

    let (a, b) = tokio::join!(
        engine.recalculate_all(&slow, Budget::default()),
        engine.recalculate_all(&fast, Budget::default())
    );
    assert!(a.run_id < b.run_id);
    // the superseded run landed last and still applied
    assert_eq!(engine.snapshot().equipment.total_power_w, 3000.0);
    assert_eq!(
        a.outcome(CascadeStep::OracleEquipment),
        Some(&StepOutcome::Applied)
    );
}

#[tokio::test]
async fn last_run_wins_discards_superseded_results() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastRunWins);
    oracle.delay_next(Endpoint::Equipment, Duration::from_millis(50));
    let (slow, fast) = overlapping_stores(&catalog);

    let (a, b) = tokio::join!(
        engine.recalculate_all(&slow, Budget::default()),
        engine.recalculate_all(&fast, Budget::default())
    );
    assert!(a.run_id < b.run_id);
    assert_eq!(engine.snapshot().equipment.total_power_w, 9000.0);
    assert_eq!(
        a.outcome(CascadeStep::LocalEquipment),
        Some(&StepOutcome::Applied)
    );
    for step in &CascadeStep::ALL[1..] {
        assert_eq!(a.outcome(*step), Some(&StepOutcome::Stale), "{step}");
    }
    assert!(b.steps.iter().all(|s| s.outcome != StepOutcome::Stale));
}

#[tokio::test]
async fn superseded_viability_failure_is_stale() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastRunWins);
    oracle.on_viability(|req| {
        if req.equipment[0].quantity == 1 {
            Err(OracleError::Domain("old".into()))
        } else {
            Ok(projection(28.1))
        }
    });
    oracle.delay_next(Endpoint::Viability, Duration::from_millis(50));
    let slow = full_store(catalog.clone());
    let mut fast = full_store(catalog);
    fast.upsert_equipment(EquipmentCategory::Asic, 0, 2)
        .unwrap();

    let (a, b) = tokio::join!(
        engine.recalculate_all(&slow, Budget::default()),
        engine.recalculate_all(&fast, Budget::default())
    );
    assert!(a.run_id < b.run_id);
    assert_eq!(b.viability, ViabilityOutcome::Applied);
    assert_eq!(a.viability, ViabilityOutcome::Stale);
    assert_eq!(a.outcome(CascadeStep::Viability), Some(&StepOutcome::Stale));
    assert!(a.check().is_ok());
    assert_eq!(engine.snapshot().viability, Some(projection(28.1)));
}

#[tokio::test]
async fn superseded_unreachable_viability_is_stale() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastRunWins);
    oracle.on_viability(|req| {
        if req.equipment[0].quantity == 1 {
            Err(OracleError::Transport("timed out".into()))
        } else {
            Ok(projection(28.1))
        }
    });
    oracle.delay_next(Endpoint::Viability, Duration::from_millis(50));
    let slow = full_store(catalog.clone());
    let mut fast = full_store(catalog);
    fast.upsert_equipment(EquipmentCategory::Asic, 0, 2)
        .unwrap();

    let (a, _) = tokio::join!(
        engine.recalculate_all(&slow, Budget::default()),
        engine.recalculate_all(&fast, Budget::default())
    );
    assert_eq!(a.viability, ViabilityOutcome::Stale);
    assert!(a.check().is_ok());
}

#[tokio::test]
async fn reset_clears_snapshot() {
    let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
    oracle.on_viability(|_| Ok(projection(28.1)));
    let store = full_store(catalog);
    engine.recalculate_all(&store, Budget::default()).await;
    assert!(engine.snapshot().viability.is_some());
    engine.reset();
    assert_eq!(engine.snapshot(), DerivedMetrics::default());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn generation_zero_iff_region_or_panels_missing(
        with_region in any::<bool>(),
        panels in 0u32..20,
        rigs in 0u32..5,
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (oracle, engine, catalog) = setup(RunOrdering::LastFieldWins);
        oracle.on_solar(|_| Ok(SolarSimulation { generation_kwh: 777.0, ..Default::default() }));
        let mut store = SelectionStore::new(catalog);
        if with_region {
            store.set_region(Some("SP")).unwrap();
        }
        store.upsert_panel(0, panels).unwrap();
        store.upsert_equipment(EquipmentCategory::Asic, 0, rigs).unwrap();

        rt.block_on(engine.recalculate_all(&store, Budget::default()));
        let m = engine.snapshot();
        if with_region && panels > 0 {
            prop_assert_eq!(m.solar.monthly_generation_kwh, 777.0);
        } else {
            prop_assert_eq!(m.solar.monthly_generation_kwh, 0.0);
        }
        prop_assert_eq!(m.equipment.total_power_w, 3000.0 * f64::from(rigs));
        prop_assert!(m.budget.combined_spend_pct.is_finite());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn removed_items_leave_no_residual(
        rigs in 0u32..5,
        panels in 0u32..20,
        gpus in 1u32..10,
        extra_panels in 1u32..20,
        oracle_up in any::<bool>(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let catalog = Arc::new(wide_catalog());
        let oracle = Arc::new(MockOracle::new((*catalog).clone()));
        if !oracle_up {
            oracle.on_equipment(|_| Err(OracleError::Transport("down".into())));
        }
        let engine = Engine::new(oracle.clone(), &EngineConfig::default());
        let mut store = SelectionStore::new(catalog);
        store.set_region(Some("SP")).unwrap();
        store.upsert_equipment(EquipmentCategory::Asic, 0, rigs).unwrap();
        store.upsert_panel(0, panels).unwrap();

        rt.block_on(engine.recalculate_all(&store, Budget::default()));
        let before = engine.snapshot();

        store.upsert_equipment(EquipmentCategory::Gpu, 0, gpus).unwrap();
        store.upsert_panel(1, extra_panels).unwrap();
        rt.block_on(engine.recalculate_all(&store, Budget::default()));
        let with_extra = engine.snapshot();
        prop_assert!(with_extra.equipment.total_power_w > before.equipment.total_power_w);
        prop_assert!(with_extra.solar.panel_count > before.solar.panel_count);

        store.upsert_equipment(EquipmentCategory::Gpu, 0, 0).unwrap();
        store.upsert_panel(1, 0).unwrap();
        rt.block_on(engine.recalculate_all(&store, Budget::default()));
        let after = engine.snapshot();

        prop_assert_eq!(after.equipment.total_power_w, before.equipment.total_power_w);
        prop_assert_eq!(after.equipment.total_cost, before.equipment.total_cost);
        prop_assert_eq!(after.equipment.total_hashrate_th, before.equipment.total_hashrate_th);
        prop_assert_eq!(after.solar.panel_count, before.solar.panel_count);
        prop_assert_eq!(after.solar.total_rated_power_w, before.solar.total_rated_power_w);
        prop_assert_eq!(after.solar.total_cost, before.solar.total_cost);
        prop_assert_eq!(after.solar.footprint_m2, before.solar.footprint_m2);
        prop_assert_eq!(after, before);
    }
}
