//! Radial bound-state solver for spherically symmetric potentials.
//!
//! Integrates the scalar-relativistic radial equation on a fixed mesh and
//! searches for discrete bound-state energies by node counting, producing
//! normalized radial functions for atomic basis construction.

pub mod common;
pub mod grid;
pub mod model;
pub mod solver;
pub mod spline;

pub use grid::{GridError, RadialGrid};
pub use model::{
    GridSpec, ModelError, PotentialSpec, ProbeReport, SolveJob, SolveReport, StateReport, StateSpec,
};
pub use solver::{
    BoundStateInput, BoundStateOutcome, BoundStateWarning, IntegrateInput, IntegrateOutput,
    RadialSolver, RadialSolverError, SolveInput, SolveOutput, SolverConfig,
};
pub use spline::{CubicSpline, SplineError};
