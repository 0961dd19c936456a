//! Per-step cascade events and the run report.

use std::fmt;

use rig_core::{DerivedMetrics, ValidationError};
use serde::Serialize;

use crate::EngineError;

/// The six cascade steps, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStep {
    LocalEquipment,
    OracleEquipment,
    LocalSolar,
    SolarGeneration,
    Budget,
    Viability,
}

impl CascadeStep {
    pub const ALL: [CascadeStep; 6] = [
        CascadeStep::LocalEquipment,
        CascadeStep::OracleEquipment,
        CascadeStep::LocalSolar,
        CascadeStep::SolarGeneration,
        CascadeStep::Budget,
        CascadeStep::Viability,
    ];

    /// 1-based position in the cascade.
    pub fn number(self) -> u8 {
        match self {
            CascadeStep::LocalEquipment => 1,
            CascadeStep::OracleEquipment => 2,
            CascadeStep::LocalSolar => 3,
            CascadeStep::SolarGeneration => 4,
            CascadeStep::Budget => 5,
            CascadeStep::Viability => 6,
        }
    }
}

impl fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CascadeStep::LocalEquipment => "local equipment totals",
            CascadeStep::OracleEquipment => "oracle equipment simulation",
            CascadeStep::LocalSolar => "local solar totals",
            CascadeStep::SolarGeneration => "solar generation",
            CascadeStep::Budget => "budget",
            CascadeStep::Viability => "viability",
        };
        write!(f, "{}. {name}", self.number())
    }
}

/// What a step did to the snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Result merged into the snapshot.
    Applied,
    /// Oracle unreachable; a local value was merged instead.
    Fallback(String),
    /// Oracle answered with an `erro` message; the local value stands.
    Rejected(String),
    /// Preconditions unmet; no oracle call was made.
    Skipped,
    /// Oracle failed and nothing was merged.
    Failed(String),
    /// A newer run already merged; this result was dropped.
    Stale,
}

/// Emitted after each step, carrying the snapshot as merged at that point.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CascadeEvent {
    pub run_id: u64,
    pub step: CascadeStep,
    pub outcome: StepOutcome,
    pub snapshot: DerivedMetrics,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepReport {
    pub step: CascadeStep,
    pub outcome: StepOutcome,
}

/// Result of the full-viability step.
#[derive(Clone, Debug, PartialEq)]
pub enum ViabilityOutcome {
    Applied,
    /// Preconditions unmet, every failing reason listed.
    Skipped(Vec<ValidationError>),
    /// The oracle answered with an `erro` message.
    DomainFailure(String),
    /// Transport failure; previous figures stand.
    Unavailable(String),
    /// Superseded by a newer run.
    Stale,
}

/// Summary of one `recalculate_all` run.
#[derive(Clone, Debug, PartialEq)]
pub struct CascadeReport {
    pub run_id: u64,
    pub steps: Vec<StepReport>,
    pub viability: ViabilityOutcome,
}

impl CascadeReport {
    pub fn outcome(&self, step: CascadeStep) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|r| r.step == step)
            .map(|r| &r.outcome)
    }

    /// Steps the oracle refused, with its message, in cascade order.
    pub fn rejections(&self) -> impl Iterator<Item = (CascadeStep, &str)> + '_ {
        self.steps.iter().filter_map(|r| match &r.outcome {
            StepOutcome::Rejected(msg) => Some((r.step, msg.as_str())),
            _ => None,
        })
    }

    /// Err when the oracle rejected any step or the viability step failed.
    /// Skipped and stale runs are Ok.
    pub fn check(&self) -> Result<(), EngineError> {
        if let Some((_, msg)) = self.rejections().next() {
            return Err(EngineError::Domain(msg.to_string()));
        }
        match &self.viability {
            ViabilityOutcome::DomainFailure(msg) => Err(EngineError::Domain(msg.clone())),
            ViabilityOutcome::Unavailable(msg) => {
                Err(EngineError::ViabilityUnavailable(msg.clone()))
            }
            _ => Ok(()),
        }
    }
}
