use super::CliError;
use anyhow::Context;
use radsolve_core::{
    BoundStateInput, CubicSpline, IntegrateInput, ProbeReport, RadialSolver, SolveJob,
    SolveReport, SolverConfig, StateReport,
};
use std::path::{Path, PathBuf};

#[derive(clap::Args)]
pub(super) struct SolveArgs {
    /// Path to the JSON job file
    pub job: PathBuf,
    /// Write the JSON report here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct ProbeArgs {
    /// Path to the JSON job file supplying grid, charge, and potential
    pub job: PathBuf,
    /// Angular quantum number
    #[arg(long)]
    pub l: u32,
    /// Fixed trial energy
    #[arg(long, allow_negative_numbers = true)]
    pub energy: f64,
}

pub(super) fn run_solve_command(args: SolveArgs) -> Result<i32, CliError> {
    let job = load_job(&args.job)?;
    let grid = job.build_grid()?;
    let potential = job.potential_values(grid.point_count());
    let solver = RadialSolver::new(SolverConfig {
        relativistic: job.relativistic,
        ..SolverConfig::default()
    });

    let mut states = Vec::with_capacity(job.states.len());
    for state in &job.states {
        let outcome = solver.bound_state(&BoundStateInput {
            n: state.n,
            l: state.l,
            trial_energy: state.trial_energy,
            zn: job.nuclear_charge,
            grid: &grid,
            potential: &potential,
        })?;

        tracing::info!(
            n = state.n,
            l = state.l,
            energy = outcome.energy,
            nodes = outcome.node_count,
            iterations = outcome.iterations,
            "bound state solved"
        );
        for warning in &outcome.warnings {
            tracing::warn!(n = state.n, l = state.l, "{warning}");
        }

        states.push(StateReport::from_outcome(state, &outcome));
    }

    let rendered = SolveReport { states }.to_json_string()?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write report '{}'", path.display()))?;
        }
        None => println!("{rendered}"),
    }

    Ok(0)
}

pub(super) fn run_probe_command(args: ProbeArgs) -> Result<i32, CliError> {
    let job = load_job(&args.job)?;
    let grid = job.build_grid()?;
    let potential = job.potential_values(grid.point_count());
    let solver = RadialSolver::new(SolverConfig {
        relativistic: job.relativistic,
        ..SolverConfig::default()
    });

    let ve = CubicSpline::new(&grid, &potential).map_err(radsolve_core::RadialSolverError::from)?;
    let zero = vec![0.0_f64; grid.point_count()];
    let mp = CubicSpline::new(&grid, &zero).map_err(radsolve_core::RadialSolverError::from)?;

    let output = solver.integrate(&IntegrateInput {
        l: args.l,
        enu: args.energy,
        zn: job.nuclear_charge,
        grid: &grid,
        potential: &ve,
        perturbation: &mp,
    })?;

    let report = ProbeReport {
        l: args.l,
        energy: args.energy,
        node_count: output.node_count,
    };
    println!("{}", report.to_json_string()?);

    Ok(0)
}

fn load_job(path: &Path) -> Result<SolveJob, CliError> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read job file '{}'", path.display()))?;
    Ok(SolveJob::from_json_str(&source)?)
}
