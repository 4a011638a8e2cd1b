use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use soluna_engine::StateSpace;
use soluna_solver::{pass::Pass, set_cover::SetCoverProblem};

use crate::{schema::report::SetCoverReport, util};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct SetCoverArg {
    /// JSON array of candidates to pick once no choice is forced
    #[arg(long)]
    picks: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(store_path: &Path, arg: &SetCoverArg) -> anyhow::Result<()> {
    let SetCoverArg { picks, output } = arg;

    let manual_picks = match picks {
        Some(path) => util::read_pick_file(path)?.picks,
        None => vec![],
    };

    let space = StateSpace::from_starting_configurations();
    let store = util::open_solved_store(store_path, Pass::Evaluate)?;
    let problem = SetCoverProblem::from_store(&store, &space)
        .with_context(|| format!("Failed to read set-cover input from {}", store_path.display()))?;
    tracing::info!(
        universe = problem.universe().len(),
        candidates = problem.candidates().len(),
        "built set-cover problem"
    );

    let solution = problem.solve(&manual_picks);
    for pick in &solution.ignored_picks {
        tracing::warn!(state = %pick.key(), "manual pick ignored; not a useful candidate");
    }
    for element in &solution.uncovered {
        tracing::warn!(state = %element.key(), "no candidate covers this position");
    }
    let anchor_count = solution.picks.len();
    tracing::info!(anchors = anchor_count, "solved set cover");

    let report = SetCoverReport {
        generated_at: Utc::now(),
        universe_size: problem.universe().len(),
        candidate_count: problem.candidates().len(),
        anchor_count,
        solution,
    };
    util::save_json(&report, output.as_deref())?;
    Ok(())
}
