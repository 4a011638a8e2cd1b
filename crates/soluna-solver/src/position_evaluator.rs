//! Position evaluation: the game value of every position by backward induction.
//!
//! # How It Works
//!
//! A position with no moves is lost by the player to move. Any other position
//! is won by the player to move if at least one of its moves leads to a
//! position that player still wins, and lost otherwise:
//!
//! ```text
//! value(p) = opponent(mover(p))                      if p has no moves
//! value(p) = mover(p)  if any child c: value(c) == mover(p)
//! value(p) = opponent(mover(p))                      otherwise
//! ```
//!
//! Values are expressed as the [`Player`] who can force the win, so they are
//! absolute rather than relative to the mover and need no negation between
//! plies.
//!
//! # Memoization
//!
//! [`PositionEvaluator`] owns its memo table. A lookup checks the memo, then
//! the store, and only recurses when neither knows the position. Every computed
//! value is written to the store before it is returned, so each canonical
//! position is evaluated at most once however many parents reach it. The game
//! graph is acyclic and at most [`MAX_PLY`](soluna_engine::MAX_PLY) deep, so
//! direct recursion is safe.
//!
//! All children are evaluated even after a winning move has been found, so the
//! store ends up holding every reachable position.

use std::collections::HashMap;

use soluna_engine::{Player, Position, StateSpace};

use crate::{pass::PassError, store::RecordStore};

/// Counts from one [`PositionEvaluator::evaluate_all`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationSummary {
    pub positions: usize,
    /// Records created by this run; the rest were already in the store.
    pub inserted: usize,
    pub first_player_wins: usize,
    pub second_player_wins: usize,
}

#[derive(Debug)]
pub struct PositionEvaluator<'a, S: ?Sized> {
    store: &'a mut S,
    memo: HashMap<Position, Player>,
    inserted: usize,
}

impl<'a, S> PositionEvaluator<'a, S>
where
    S: RecordStore + ?Sized,
{
    pub fn new(store: &'a mut S) -> Self {
        Self {
            store,
            memo: HashMap::new(),
            inserted: 0,
        }
    }

    /// Number of records this evaluator has written so far.
    #[must_use]
    pub fn inserted(&self) -> usize {
        self.inserted
    }

    /// Returns the player who can force a win from `position`.
    pub fn evaluate(&mut self, position: &Position) -> Result<Player, PassError> {
        if let Some(&value) = self.memo.get(position) {
            return Ok(value);
        }
        if let Some(record) = self.store.get(position)? {
            self.memo.insert(position.clone(), record.eval);
            return Ok(record.eval);
        }

        let mover = position.player_to_move();
        let mut value = mover.opponent();
        for child in position.moves() {
            if self.evaluate(&child)? == mover {
                value = mover;
            }
        }

        if self.store.insert_if_absent(position.clone(), value)? {
            self.inserted += 1;
        }
        self.memo.insert(position.clone(), value);
        Ok(value)
    }

    /// Evaluates every position of `space`, deepest ply first.
    ///
    /// Going deepest first means every recursive call hits the memo, so the
    /// recursion never goes more than one level down.
    pub fn evaluate_all(&mut self, space: &StateSpace) -> Result<EvaluationSummary, PassError> {
        let before = self.inserted;
        let mut summary = EvaluationSummary::default();
        for ply in (1..=space.max_ply()).rev() {
            let Some(layer) = space.layer(ply) else {
                continue;
            };
            for position in layer {
                match self.evaluate(position)? {
                    Player::First => summary.first_player_wins += 1,
                    Player::Second => summary.second_player_wins += 1,
                }
            }
            tracing::debug!(ply, positions = layer.len(), "evaluated layer");
        }
        summary.positions = summary.first_player_wins + summary.second_player_wins;
        summary.inserted = self.inserted - before;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn position(piles: [&[i32]; 4]) -> Position {
        Position::new(piles).unwrap()
    }

    #[test]
    fn test_terminal_value_depends_on_mover() {
        let mut store = MemoryStore::new();
        let mut evaluator = PositionEvaluator::new(&mut store);

        // ply 12, player 2 to move
        let p2_stuck = position([&[12], &[], &[], &[]]);
        assert_eq!(evaluator.evaluate(&p2_stuck).unwrap(), Player::First);

        // ply 11, player 1 to move
        let p1_stuck = position([&[7], &[5], &[], &[]]);
        assert!(p1_stuck.is_terminal());
        assert_eq!(evaluator.evaluate(&p1_stuck).unwrap(), Player::Second);
    }

    #[test]
    fn test_mover_picks_winning_child() {
        let mut store = MemoryStore::new();
        let mut evaluator = PositionEvaluator::new(&mut store);

        // ply 10, player 2 to move; every move reaches a ply 11 position with
        // player 1 stuck.
        let p = position([&[4], &[4], &[4], &[]]);
        assert_eq!(evaluator.evaluate(&p).unwrap(), Player::Second);
        assert_eq!(evaluator.inserted(), 2);

        let record = store.get(&p).unwrap().unwrap();
        assert_eq!(record.eval, Player::Second);
        assert_eq!(record.move_num, 10);
        let child = position([&[8], &[4], &[], &[]]);
        assert_eq!(store.get(&child).unwrap().unwrap().eval, Player::Second);
    }

    #[test]
    fn test_store_values_are_reused() {
        let mut store = MemoryStore::new();
        let p = position([&[4], &[4], &[4], &[]]);
        // A value already in the store wins over recomputation.
        store.insert_if_absent(p.clone(), Player::First).unwrap();

        let mut evaluator = PositionEvaluator::new(&mut store);
        assert_eq!(evaluator.evaluate(&p).unwrap(), Player::First);
        assert_eq!(evaluator.inserted(), 0);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_evaluate_all_persists_every_position() {
        let start = position([&[2, 2], &[2, 2], &[2, 2], &[]]);
        let space = StateSpace::enumerate([start.clone()]);

        let mut store = MemoryStore::new();
        let summary = PositionEvaluator::new(&mut store)
            .evaluate_all(&space)
            .unwrap();
        assert_eq!(summary.positions, space.len());
        assert_eq!(summary.inserted, space.len());
        assert_eq!(store.len().unwrap(), space.len());

        // Running again against the same store inserts nothing.
        let again = PositionEvaluator::new(&mut store)
            .evaluate_all(&space)
            .unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(again.positions, summary.positions);
    }
}
