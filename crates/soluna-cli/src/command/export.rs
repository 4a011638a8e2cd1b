use std::path::{Path, PathBuf};

use anyhow::Context;
use soluna_solver::{pass::Pass, store::RecordStore};

use crate::{schema::report::ExportReport, util};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ExportArg {
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(store_path: &Path, arg: &ExportArg) -> anyhow::Result<()> {
    let ExportArg { output } = arg;

    let store = util::open_solved_store(store_path, Pass::Evaluate)?;
    let records = store
        .records()
        .with_context(|| format!("Failed to read record store: {}", store_path.display()))?;
    tracing::info!(records = records.len(), "exporting records");

    let report = ExportReport::new(store_path.display().to_string(), records);
    util::save_json(&report, output.as_deref())?;
    Ok(())
}
