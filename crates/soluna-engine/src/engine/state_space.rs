use std::collections::BTreeSet;

use crate::core::{MAX_PLY, Position};

use super::starting_positions;

/// Every canonical position reachable from a set of starting positions,
/// partitioned by ply.
///
/// Built by breadth-first layer expansion: layer `k + 1` is the set of moves
/// from all positions in layer `k`. Since every move removes one stack, a
/// position can only ever appear in the layer matching its own ply, and the
/// expansion ends once a layer has no moves (at the latest at [`MAX_PLY`]).
///
/// # Example
///
/// ```
/// use soluna_engine::StateSpace;
///
/// let space = StateSpace::from_starting_configurations();
/// assert_eq!(space.layer(1).map(|l| l.len()), Some(16));
/// assert_eq!(space.max_ply(), 12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StateSpace {
    // `layers[k]` holds the positions at ply `k + 1`.
    layers: Vec<BTreeSet<Position>>,
}

impl StateSpace {
    /// Enumerates everything reachable from the sixteen starting configurations.
    #[must_use]
    pub fn from_starting_configurations() -> Self {
        Self::enumerate(starting_positions())
    }

    /// Enumerates everything reachable from `starts`.
    ///
    /// Starts need not share a ply; each is placed in the layer of its own ply.
    #[must_use]
    pub fn enumerate<I>(starts: I) -> Self
    where
        I: IntoIterator<Item = Position>,
    {
        let mut layers = vec![BTreeSet::new(); MAX_PLY];
        for start in starts {
            layers[start.ply() - 1].insert(start);
        }

        for ply in 1..MAX_PLY {
            let (current, next) = layers.split_at_mut(ply);
            let next = &mut next[0];
            for position in &current[ply - 1] {
                next.extend(position.moves());
            }
        }

        while layers.last().is_some_and(BTreeSet::is_empty) {
            layers.pop();
        }
        Self { layers }
    }

    /// Layers in increasing ply order; index `k` holds ply `k + 1`.
    #[must_use]
    pub fn layers(&self) -> &[BTreeSet<Position>] {
        &self.layers
    }

    /// Positions at the given ply (1-based), if any layer exists there.
    #[must_use]
    pub fn layer(&self, ply: usize) -> Option<&BTreeSet<Position>> {
        ply.checked_sub(1).and_then(|index| self.layers.get(index))
    }

    /// Deepest ply that holds at least one position.
    #[must_use]
    pub fn max_ply(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.iter().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(BTreeSet::is_empty)
    }

    #[must_use]
    pub fn contains(&self, position: &Position) -> bool {
        self.layer(position.ply())
            .is_some_and(|layer| layer.contains(position))
    }

    /// Starting positions: the shallowest nonempty layer.
    pub fn starts(&self) -> impl Iterator<Item = &Position> + '_ {
        self.layers
            .iter()
            .find(|layer| !layer.is_empty())
            .into_iter()
            .flatten()
    }

    /// All positions, shallowest ply first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Position> + '_ {
        self.layers.iter().flatten()
    }

    /// All positions, deepest ply first, so every position comes after all of
    /// its moves.
    pub fn iter_deepest_first(&self) -> impl Iterator<Item = &Position> + '_ {
        self.layers.iter().rev().flatten()
    }
}
