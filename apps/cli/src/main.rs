#![deny(warnings)]

//! Headless driver: fetch the catalog, replay a scenario and print the derived metrics.

mod scenario;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rig_core::{Catalog, DerivedMetrics, EquipmentCategory};
use rig_oracle::{HttpOracle, Oracle};
use rig_runtime::{CascadeEvent, CascadeStep, Engine, EngineConfig, EngineError, Session};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::scenario::Scenario;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_SHA"),
    " ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(name = "rig-calc", version = VERSION)]
#[command(about = "Solar-powered mining rig viability calculator")]
struct Cli {
    /// Engine configuration (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the oracle base URL
    #[arg(long, global = true)]
    oracle_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List regions, equipment and panels with their catalog indices
    Catalog,
    /// Run one recalculation cascade for a scenario
    Run {
        /// Scenario file (YAML)
        #[arg(long)]
        scenario: PathBuf,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(url) = &cli.oracle_url {
        config.oracle.base_url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

fn print_catalog(catalog: &Catalog) {
    println!("Regions:");
    for r in catalog.regions.values() {
        println!(
            "  {:<3} {:<22} irradiance {:.2} kWh/m²/day | tariff {:.3}/kWh",
            r.code, r.name, r.irradiance_kwh_m2_day, r.tariff_per_kwh
        );
    }
    for category in EquipmentCategory::ALL {
        println!("{category}:");
        for (i, e) in catalog.equipment_in(category).iter().enumerate() {
            println!(
                "  [{i}] {} {} | {} W | {} TH/s | {:.2}",
                e.manufacturer, e.model, e.power_w, e.hashrate_th, e.unit_cost
            );
        }
    }
    println!("Panels:");
    for (i, p) in catalog.panels.iter().enumerate() {
        println!(
            "  [{i}] {} ({}) | {} Wp | {:.2} m² | {:.2}",
            p.model,
            p.kind,
            p.rated_power_w,
            p.area_m2(),
            p.unit_price
        );
    }
}

fn print_event(ev: &CascadeEvent) {
    println!("step {} [run {}] -> {:?}", ev.step, ev.run_id, ev.outcome);
}

fn print_snapshot(m: &DerivedMetrics) {
    let e = &m.equipment;
    println!(
        "Equipment | power: {:.0} W | cost: {:.2} | hashrate: {:.2} TH/s | energy: {:.1} kWh/month ({:.1} kWh/day) | coin: {:.6}/month | {:?}",
        e.total_power_w,
        e.total_cost,
        e.total_hashrate_th,
        e.monthly_energy_kwh,
        e.daily_energy_kwh,
        e.monthly_coin_estimate,
        e.source
    );
    let s = &m.solar;
    println!(
        "Solar | panels: {} | rated: {:.0} W | cost: {:.2} | area: {:.2} m² | generation: {:.2} kWh/month ({:?})",
        s.panel_count,
        s.total_rated_power_w,
        s.total_cost,
        s.footprint_m2,
        s.monthly_generation_kwh,
        s.generation_source
    );
    let b = &m.budget;
    println!(
        "Budget | {:.2} | equipment: {:.1}% {:?} | combined: {:.1}% {:?} | headroom: {:.2}",
        b.budget,
        b.equipment_spend_pct,
        b.equipment_state,
        b.combined_spend_pct,
        b.combined_state,
        b.headroom
    );
    match &m.viability {
        Some(v) => println!(
            "Viability | coverage: {:.1}% | savings: {:.2}/month | revenue: {:.2}/month | profit: {:.2}/month | payback: {:.1} months | CO₂ avoided: {:.1} kg",
            v.coverage_pct,
            v.monthly_savings,
            v.monthly_mining_revenue,
            v.net_monthly_profit,
            v.payback_months,
            v.avoided_co2_kg
        ),
        None => println!("Viability | not available"),
    }
}

async fn run(config: EngineConfig, scenario: PathBuf, json: bool) -> Result<ExitCode> {
    let scenario = Scenario::load(&scenario)?;
    let oracle = Arc::new(HttpOracle::new(config.oracle.clone())?);
    let catalog = oracle
        .initial_data()
        .await
        .context("loading catalog from oracle")?;
    info!(
        regions = catalog.regions.len(),
        panels = catalog.panels.len(),
        "catalog loaded"
    );

    let mut session = Session::new(Arc::new(catalog), config.default_budget);
    scenario.apply(&mut session)?;

    let engine = Engine::new(oracle, &config);
    let mut events = engine.subscribe();
    let printer = async {
        while let Ok(ev) = events.recv().await {
            if !json {
                print_event(&ev);
            }
            if ev.step == CascadeStep::Viability {
                break;
            }
        }
    };
    let (report, ()) = tokio::join!(engine.recalculate_session(&session), printer);

    let snapshot = engine.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }

    match report.check() {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(EngineError::Domain(_)) => {
            for (step, msg) in report.rejections() {
                eprintln!("error: oracle rejected step {step}: {msg}");
            }
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            warn!(error = %e, "viability figures may be stale");
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!(oracle = %config.oracle.base_url, ordering = ?config.ordering, "starting rig-calc");

    match cli.command {
        Commands::Catalog => {
            let oracle = HttpOracle::new(config.oracle)?;
            let catalog = oracle
                .initial_data()
                .await
                .context("loading catalog from oracle")?;
            print_catalog(&catalog);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run { scenario, json } => run(config, scenario, json).await,
    }
}
