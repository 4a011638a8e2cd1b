//! Reachability of positions under the chosen strategy.
//!
//! For each [`OptimalPlay`] scenario the walk starts from every starting
//! position won by `winner`. On the optimal player's turn it follows the
//! position's best move; on the other player's turn it follows every legal
//! move. A position whose best move has not been chosen yet ends the walk on
//! the optimal player's turn.

use std::collections::{HashMap, HashSet};

use soluna_engine::{Position, StateSpace};

use crate::{
    pass::PassError,
    record::{OptimalPlay, RecordUpdate, ReachabilityFlags},
    store::RecordStore,
};

use super::StrategyGraph;

/// Reachability flags of every position reached in at least one scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reachability {
    flags: HashMap<Position, ReachabilityFlags>,
}

impl Reachability {
    #[must_use]
    pub fn compute(graph: &StrategyGraph) -> Self {
        let mut flags = HashMap::<Position, ReachabilityFlags>::new();
        for play in OptimalPlay::ALL {
            for position in reachable(graph, play) {
                flags.entry(position).or_default().set(play, true);
            }
        }
        Self { flags }
    }

    /// Flags of `position`; all unset if it is never reached.
    #[must_use]
    pub fn flags(&self, position: &Position) -> ReachabilityFlags {
        self.flags.get(position).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn is_reachable(&self, position: &Position, play: OptimalPlay) -> bool {
        self.flags.get(position).is_some_and(|f| f.get(play))
    }

    /// Number of positions reached in `play`.
    #[must_use]
    pub fn count(&self, play: OptimalPlay) -> usize {
        self.flags.values().filter(|f| f.get(play)).count()
    }
}

fn reachable(graph: &StrategyGraph, play: OptimalPlay) -> HashSet<Position> {
    let mut seen = HashSet::new();
    let mut stack = graph
        .starts()
        .iter()
        .filter(|start| graph.get(start).is_some_and(|n| n.eval == play.winner))
        .cloned()
        .collect::<Vec<_>>();

    while let Some(position) = stack.pop() {
        if !seen.insert(position.clone()) {
            continue;
        }
        let Some(node) = graph.get(&position) else {
            continue;
        };
        if position.player_to_move() == play.optimal {
            stack.extend(node.best_move.iter().cloned());
        } else {
            stack.extend(node.moves.iter().cloned());
        }
    }
    seen
}

/// Writes the reachability flags of the stored strategy to every record.
///
/// Returns the computed reachability.
pub fn write_reachability<S>(store: &mut S, space: &StateSpace) -> Result<Reachability, PassError>
where
    S: RecordStore + ?Sized,
{
    let graph = StrategyGraph::load(store, space)?;
    let reachability = Reachability::compute(&graph);
    for position in space.iter() {
        store.update(
            position,
            RecordUpdate::Reachability(reachability.flags(position)),
        )?;
    }
    for play in OptimalPlay::ALL {
        tracing::debug!(
            optimal = play.optimal.label(),
            winner = play.winner.label(),
            positions = reachability.count(play),
            "reachable positions"
        );
    }
    Ok(reachability)
}
