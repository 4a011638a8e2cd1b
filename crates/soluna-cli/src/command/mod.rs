use std::path::PathBuf;

use clap::{Parser, Subcommand};

use self::{export::ExportArg, set_cover::SetCoverArg, show::ShowArg, solve::SolveArg};

mod export;
mod set_cover;
mod show;
mod solve;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// JSON file holding the evaluation records
    #[arg(long, global = true, default_value = "soluna-store.json")]
    store: PathBuf,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Enumerate, evaluate and annotate every reachable position
    Solve(#[clap(flatten)] SolveArg),
    /// Reduce player 2's first-move strategy with set cover
    SetCover(#[clap(flatten)] SetCoverArg),
    /// Export the records as one sheet per ply
    Export(#[clap(flatten)] ExportArg),
    /// Show a position, its record and its moves
    Show(#[clap(flatten)] ShowArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match &args.mode {
        Mode::Solve(arg) => solve::run(&args.store, arg)?,
        Mode::SetCover(arg) => set_cover::run(&args.store, arg)?,
        Mode::Export(arg) => export::run(&args.store, arg)?,
        Mode::Show(arg) => show::run(&args.store, arg)?,
    }
    Ok(())
}
