//! JSON job and report models for driving the solver from files.

use crate::grid::{GridError, RadialGrid};
use crate::solver::BoundStateOutcome;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to parse solve job: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("failed to render report: {0}")]
    Render(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveJob {
    #[serde(default)]
    pub relativistic: bool,
    pub nuclear_charge: f64,
    pub grid: GridSpec,
    #[serde(default)]
    pub potential: PotentialSpec,
    pub states: Vec<StateSpec>,
}

impl SolveJob {
    pub fn from_json_str(source: &str) -> Result<Self, ModelError> {
        serde_json::from_str(source).map_err(ModelError::Parse)
    }

    pub fn build_grid(&self) -> Result<RadialGrid, GridError> {
        match &self.grid {
            GridSpec::Exponential {
                r_min,
                r_max,
                point_count,
            } => RadialGrid::exponential(*r_min, *r_max, *point_count),
            GridSpec::Explicit { points } => RadialGrid::from_points(points.clone()),
        }
    }

    /// Tabulated screening part of the potential, one value per grid point.
    /// Length is validated by the solver.
    pub fn potential_values(&self, point_count: usize) -> Vec<f64> {
        match &self.potential {
            PotentialSpec::Zero => vec![0.0; point_count],
            PotentialSpec::Tabulated { values } => values.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum GridSpec {
    #[serde(rename_all = "camelCase")]
    Exponential {
        r_min: f64,
        r_max: f64,
        point_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    Explicit { points: Vec<f64> },
}

/// Screening part of the potential; the nuclear tail always comes from
/// `nuclearCharge`. `Zero` means a bare Coulomb problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PotentialSpec {
    #[default]
    Zero,
    #[serde(rename_all = "camelCase")]
    Tabulated { values: Vec<f64> },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSpec {
    pub n: u32,
    pub l: u32,
    pub trial_energy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveReport {
    pub states: Vec<StateReport>,
}

impl SolveReport {
    pub fn to_json_string(&self) -> Result<String, ModelError> {
        serde_json::to_string_pretty(self).map_err(ModelError::Render)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateReport {
    pub n: u32,
    pub l: u32,
    pub energy: f64,
    pub node_count: usize,
    pub iterations: usize,
    pub converged: bool,
    pub warnings: Vec<String>,
}

impl StateReport {
    pub fn from_outcome(state: &StateSpec, outcome: &BoundStateOutcome) -> Self {
        Self {
            n: state.n,
            l: state.l,
            energy: outcome.energy,
            node_count: outcome.node_count,
            iterations: outcome.iterations,
            converged: outcome.converged(),
            warnings: outcome
                .warnings
                .iter()
                .map(|warning| warning.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub l: u32,
    pub energy: f64,
    pub node_count: usize,
}

impl ProbeReport {
    pub fn to_json_string(&self) -> Result<String, ModelError> {
        serde_json::to_string(self).map_err(ModelError::Render)
    }
}
