use std::path::{Path, PathBuf};

use anyhow::Context;
use soluna_engine::StateSpace;
use soluna_solver::{
    Solver,
    pass::Pass,
    strategy::{DEFAULT_MAX_ITERATIONS, StrategyConfig},
};

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct SolveArg {
    /// Pass to run; may be repeated. Runs every pass when omitted
    #[arg(long = "pass", value_name = "PASS")]
    passes: Vec<Pass>,
    /// JSON file of manual best-move overrides, keyed by state
    #[arg(long)]
    overrides: Option<PathBuf>,
    /// Upper bound on best-move fixed-point iterations
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,
}

pub(crate) fn run(store_path: &Path, arg: &SolveArg) -> anyhow::Result<()> {
    let SolveArg {
        passes,
        overrides,
        max_iterations,
    } = arg;

    let overrides = match overrides {
        Some(path) => util::read_override_file(path)?.overrides,
        None => Default::default(),
    };
    let config = StrategyConfig {
        overrides,
        max_iterations: *max_iterations,
    };

    let space = StateSpace::from_starting_configurations();
    tracing::info!(
        positions = space.len(),
        max_ply = space.max_ply(),
        "enumerated state space"
    );

    let mut store = util::open_store(store_path)?;
    let passes = if passes.is_empty() {
        Pass::ALL.to_vec()
    } else {
        passes.clone()
    };
    Solver::new(&mut store, &space)
        .with_strategy_config(config)
        .run(&passes)
        .with_context(|| format!("Failed to solve into {}", store_path.display()))?;
    Ok(())
}
