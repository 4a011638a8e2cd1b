use std::collections::{BTreeMap, HashMap};

use soluna_engine::{Player, Position, StateSpace};

use crate::{
    pass::PassError,
    record::{EvaluationRecord, MoveStats},
    store::RecordStore,
};

/// What the strategy passes need to know about one position.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyNode {
    pub eval: Player,
    pub is_determined: bool,
    pub stats: MoveStats,
    pub moves: Vec<Position>,
    pub best_move: Option<Position>,
}

impl StrategyNode {
    fn from_record(record: EvaluationRecord) -> Result<Self, PassError> {
        let stats = record.stats.ok_or_else(|| PassError::MissingStats {
            state: record.state.key(),
        })?;
        Ok(Self {
            eval: record.eval,
            is_determined: record.is_determined,
            stats,
            moves: record.state.moves(),
            best_move: record.best_move,
        })
    }
}

/// The evaluated game graph, held in memory while best moves are chosen.
///
/// Loaded once from the store with a single scan, so the fixed point can
/// iterate without a store round trip per lookup.
#[derive(Debug, Clone)]
pub struct StrategyGraph {
    nodes: BTreeMap<Position, StrategyNode>,
    starts: Vec<Position>,
}

impl StrategyGraph {
    /// Loads every position of `space` from `store`.
    pub fn load<S>(store: &S, space: &StateSpace) -> Result<Self, PassError>
    where
        S: RecordStore + ?Sized,
    {
        let mut records = store
            .records()?
            .into_iter()
            .map(|record| (record.state.clone(), record))
            .collect::<HashMap<_, _>>();

        let mut nodes = BTreeMap::new();
        for position in space.iter() {
            let record = records
                .remove(position)
                .ok_or_else(|| PassError::NotEvaluated {
                    state: position.key(),
                })?;
            nodes.insert(position.clone(), StrategyNode::from_record(record)?);
        }
        Ok(Self {
            nodes,
            starts: space.starts().cloned().collect(),
        })
    }

    #[must_use]
    pub fn get(&self, position: &Position) -> Option<&StrategyNode> {
        self.nodes.get(position)
    }

    pub(crate) fn set_best_move(&mut self, position: &Position, best_move: Option<Position>) {
        if let Some(node) = self.nodes.get_mut(position) {
            node.best_move = best_move;
        }
    }

    pub(crate) fn clear_best_moves(&mut self) {
        for node in self.nodes.values_mut() {
            node.best_move = None;
        }
    }

    #[must_use]
    pub fn starts(&self) -> &[Position] {
        &self.starts
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// All positions with their nodes, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&Position, &StrategyNode)> + '_ {
        self.nodes.iter()
    }

    /// The currently chosen best move of `position`, if any.
    #[must_use]
    pub fn best_move(&self, position: &Position) -> Option<&Position> {
        self.nodes.get(position)?.best_move.as_ref()
    }

    /// Moves of `position` that reach positions the mover wins.
    #[must_use]
    pub fn winning_moves(&self, position: &Position) -> Vec<Position> {
        let Some(node) = self.nodes.get(position) else {
            return vec![];
        };
        let mover = position.player_to_move();
        node.moves
            .iter()
            .filter(|child| self.nodes.get(*child).is_some_and(|c| c.eval == mover))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
impl StrategyGraph {
    /// Builds a graph from hand-written `(position, value, moves)` nodes.
    ///
    /// Move statistics are counted from the listed values and moves; tests
    /// adjust them through [`Self::node_mut`].
    pub(crate) fn from_parts(starts: &[Position], parts: &[(Position, Player, Vec<Position>)]) -> Self {
        let evals = parts
            .iter()
            .map(|(position, eval, _)| (position, *eval))
            .collect::<HashMap<_, _>>();
        let mut parents = HashMap::<&Position, usize>::new();
        for child in parts.iter().flat_map(|(_, _, moves)| moves) {
            *parents.entry(child).or_default() += 1;
        }

        let nodes = parts
            .iter()
            .map(|(position, eval, moves)| {
                let mover = position.player_to_move();
                let winning = moves
                    .iter()
                    .filter(|child| evals.get(child) == Some(&mover))
                    .count();
                let stats = MoveStats::new(
                    winning,
                    moves.len() - winning,
                    parents.get(position).copied().unwrap_or(0),
                );
                let node = StrategyNode {
                    eval: *eval,
                    is_determined: false,
                    stats,
                    moves: moves.clone(),
                    best_move: None,
                };
                (position.clone(), node)
            })
            .collect();
        Self {
            nodes,
            starts: starts.to_vec(),
        }
    }

    pub(crate) fn node_mut(&mut self, position: &Position) -> Option<&mut StrategyNode> {
        self.nodes.get_mut(position)
    }
}
