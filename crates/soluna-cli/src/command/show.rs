use std::path::Path;

use anyhow::Context;
use soluna_engine::Position;
use soluna_solver::{record::EvaluationRecord, store::RecordStore};

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ShowArg {
    /// Position as a list of piles, e.g. "[[5], [1, 2], [2, 2], []]"
    state: Position,
}

pub(crate) fn run(store_path: &Path, arg: &ShowArg) -> anyhow::Result<()> {
    let ShowArg { state } = arg;

    let store = util::open_store(store_path)?;
    let read_context = || format!("Failed to read record store: {}", store_path.display());
    let record = store.get(state).with_context(read_context)?;
    let moves = state.moves();
    let children = store.get_many(&moves).with_context(read_context)?;

    println!("{state}");
    println!();
    println!("state:  {}", state.key());
    println!("ply:    {}", state.ply());
    println!("to move: {}", state.player_to_move().label());
    match &record {
        Some(record) => print_record(record),
        None => println!("record: not in {}", store_path.display()),
    }

    println!();
    println!("moves ({}):", moves.len());
    for child in &moves {
        let value = children
            .iter()
            .find(|c| &c.state == child)
            .map_or("?", |c| c.eval.label());
        let marker = if record.as_ref().and_then(|r| r.best_move.as_ref()) == Some(child) {
            "*"
        } else {
            " "
        };
        println!("{marker} {}  wins: {value}", child.key());
    }
    Ok(())
}

fn print_record(record: &EvaluationRecord) {
    println!("id:     {}", record.id);
    let side = if record.is_winning_for_mover() {
        "player to move"
    } else {
        "opponent"
    };
    println!("wins:   {} ({side})", record.eval.label());
    println!("determined: {}", record.is_determined);
    if let Some(stats) = &record.stats {
        println!(
            "moves:  {} winning, {} losing ({:.1}% / {:.1}%), {} parents",
            stats.num_winning_moves,
            stats.num_losing_moves,
            stats.winning_move_percentage,
            stats.losing_move_percentage,
            stats.total_parents
        );
    }
    if let Some(explanation) = record.move_explanation {
        let best = record
            .best_move
            .as_ref()
            .map_or_else(|| "-".to_owned(), Position::key);
        println!("best:   {best} ({explanation})");
    }
    let flags = record.reachability;
    println!(
        "reachable: p1/p1 {} p1/p2 {} p2/p1 {} p2/p2 {}",
        flags.p1_optimal_p1_wins,
        flags.p1_optimal_p2_wins,
        flags.p2_optimal_p1_wins,
        flags.p2_optimal_p2_wins
    );
}
