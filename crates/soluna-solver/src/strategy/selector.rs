//! Best-move selection rules.
//!
//! Rules are tried in priority order and the first one that applies decides:
//!
//! 1. no moves: `terminal`
//! 2. one move: `forced`
//! 3. one winning move: `only winning move`
//! 4. no winning move and exactly one move to an undetermined position:
//!    `only non-losing candidate`
//! 5. several winning moves: reuse a move already chosen elsewhere on an
//!    optimal line (`confirmed shadow` / `probabilistic shadow`)
//! 6. no winning move: the move leaving the opponent the largest share of
//!    losing replies (`best odds against random play`)
//! 7. anything still tied: most parents, then the manual override list, then
//!    canonical order
//!
//! Rule 5 depends on reachability, which depends on the moves already chosen,
//! so positions it applies to stay pending until the fixed point in
//! [`StrategyBuilder`](super::StrategyBuilder) resolves them.
//!
//! # Shadow Scenarios
//!
//! A confirmed shadow for mover `M` must be reached with `M` playing optimally
//! from a start `M` wins. A probabilistic shadow is reached with `M` playing
//! optimally from a start the opponent wins, so the opponent has left optimal
//! play at some earlier ply. This is looser than requiring the mistake on the
//! ply just before: every position reached that way is also reached here, but
//! not the other way round.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashSet},
};

use soluna_engine::Position;

use crate::record::{MoveExplanation, OptimalPlay};

use super::{Reachability, StrategyGraph};

/// A chosen best move and the rule that chose it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub best_move: Option<Position>,
    pub explanation: MoveExplanation,
}

impl Selection {
    fn new(best_move: Position, explanation: MoveExplanation) -> Self {
        Self {
            best_move: Some(best_move),
            explanation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Choice {
    Selected(Selection),
    /// Several winning moves; decided by shadowing or by tie-breaking.
    Pending(Vec<Position>),
}

#[derive(Debug)]
pub(crate) struct Selector<'a> {
    graph: &'a StrategyGraph,
    overrides: &'a BTreeMap<Position, Position>,
}

impl<'a> Selector<'a> {
    pub(crate) fn new(graph: &'a StrategyGraph, overrides: &'a BTreeMap<Position, Position>) -> Self {
        Self { graph, overrides }
    }

    /// Applies every rule that does not depend on reachability.
    pub(crate) fn select(&self, position: &Position) -> Choice {
        let moves = self
            .graph
            .get(position)
            .map(|node| node.moves.as_slice())
            .unwrap_or_default();

        match moves {
            [] => {
                return Choice::Selected(Selection {
                    best_move: None,
                    explanation: MoveExplanation::Terminal,
                });
            }
            [only] => {
                return Choice::Selected(Selection::new(only.clone(), MoveExplanation::Forced));
            }
            _ => {}
        }

        let winning = self.graph.winning_moves(position);
        match winning.len() {
            0 => Choice::Selected(self.select_losing(position, moves)),
            1 => Choice::Selected(Selection::new(
                winning[0].clone(),
                MoveExplanation::OnlyWinningMove,
            )),
            _ => Choice::Pending(winning),
        }
    }

    fn select_losing(&self, position: &Position, moves: &[Position]) -> Selection {
        let undetermined = moves
            .iter()
            .filter(|child| self.graph.get(child).is_some_and(|n| !n.is_determined))
            .cloned()
            .collect::<Vec<_>>();
        if let [only] = undetermined.as_slice() {
            return Selection::new(only.clone(), MoveExplanation::OnlyNonLosingCandidate);
        }

        let candidates = if undetermined.is_empty() {
            moves.to_vec()
        } else {
            undetermined
        };
        let best = self.best_odds(&candidates);
        if let [only] = best.as_slice() {
            return Selection::new(only.clone(), MoveExplanation::BestOddsAgainstRandomPlay);
        }
        self.break_tie(position, &best)
    }

    /// Candidates whose share of losing replies for the opponent is largest.
    fn best_odds(&self, candidates: &[Position]) -> Vec<Position> {
        let mut best: Vec<Position> = vec![];
        let mut best_odds = (0, 1);
        for child in candidates {
            let odds = self.graph.get(child).map_or((0, 1), |node| {
                let stats = node.stats;
                (stats.num_losing_moves, stats.possible_move_count.max(1))
            });
            match compare_fractions(odds, best_odds) {
                Ordering::Greater => {
                    best_odds = odds;
                    best.clear();
                    best.push(child.clone());
                }
                Ordering::Equal => best.push(child.clone()),
                Ordering::Less => {}
            }
        }
        best
    }

    /// Tries rule 5 on a pending position.
    pub(crate) fn select_shadow(
        &self,
        position: &Position,
        winning: &[Position],
        reachability: &Reachability,
        targets: &HashSet<Position>,
    ) -> Option<Selection> {
        let mover = position.player_to_move();
        let rules = [
            (
                OptimalPlay::new(mover, mover),
                MoveExplanation::ConfirmedShadow,
            ),
            (
                OptimalPlay::new(mover, mover.opponent()),
                MoveExplanation::ProbabilisticShadow,
            ),
        ];
        for (play, explanation) in rules {
            let shadows = winning
                .iter()
                .filter(|child| targets.contains(*child) && reachability.is_reachable(child, play))
                .cloned()
                .collect::<Vec<_>>();
            if shadows.is_empty() {
                continue;
            }
            let mut selection = self.break_tie(position, &shadows);
            selection.explanation = explanation;
            return Some(selection);
        }
        None
    }

    /// Rule 7. `tied` must not be empty.
    pub(crate) fn break_tie(&self, position: &Position, tied: &[Position]) -> Selection {
        let parents = |child: &Position| self.graph.get(child).map_or(0, |n| n.stats.total_parents);
        let most = tied.iter().map(parents).max().unwrap_or(0);
        let tied = tied
            .iter()
            .filter(|child| parents(*child) == most)
            .collect::<Vec<_>>();

        if let [only] = tied.as_slice() {
            return Selection::new((*only).clone(), MoveExplanation::MostParents);
        }
        if let Some(choice) = self.overrides.get(position).filter(|c| tied.contains(c)) {
            return Selection::new(choice.clone(), MoveExplanation::ManualOverride);
        }
        let first = tied.into_iter().min().cloned();
        Selection {
            best_move: first,
            explanation: MoveExplanation::CanonicalOrder,
        }
    }
}

/// Compares `a.0 / a.1` with `b.0 / b.1`; both denominators are positive.
fn compare_fractions(a: (usize, usize), b: (usize, usize)) -> Ordering {
    (a.0 * b.1).cmp(&(b.0 * a.1))
}

#[cfg(test)]
mod tests {
    use soluna_engine::Player;

    use super::*;
    use crate::record::MoveStats;

    fn position(key: &str) -> Position {
        key.parse().unwrap()
    }

    fn selected(best_move: &Position, explanation: MoveExplanation) -> Choice {
        Choice::Selected(Selection::new(best_move.clone(), explanation))
    }

    /// Player 1 to move at `parent`, with three moves.
    fn three_moves(parent_eval: Player, child_evals: [Player; 3]) -> (StrategyGraph, Position, [Position; 3]) {
        let parent = position("[[9], [1], [1], [1]]");
        let children = [
            position("[[10], [1], [1], []]"),
            position("[[9], [2], [1], []]"),
            position("[[8], [3], [1], []]"),
        ];
        let mut parts = vec![(parent.clone(), parent_eval, children.to_vec())];
        for (child, eval) in children.iter().zip(child_evals) {
            parts.push((child.clone(), eval, vec![]));
        }
        (StrategyGraph::from_parts(&[], &parts), parent, children)
    }

    #[test]
    fn test_terminal_and_forced() {
        let parent = position("[[8], [2], [1], [1]]");
        let child = position("[[10], [1], [1], []]");
        let graph = StrategyGraph::from_parts(
            &[],
            &[
                (parent.clone(), Player::First, vec![child.clone()]),
                (child.clone(), Player::First, vec![]),
            ],
        );
        let overrides = BTreeMap::new();
        let selector = Selector::new(&graph, &overrides);

        assert_eq!(
            selector.select(&child),
            Choice::Selected(Selection {
                best_move: None,
                explanation: MoveExplanation::Terminal,
            })
        );
        assert_eq!(
            selector.select(&parent),
            selected(&child, MoveExplanation::Forced)
        );
    }

    #[test]
    fn test_only_winning_move() {
        let (graph, parent, [a, _, _]) =
            three_moves(Player::First, [Player::First, Player::Second, Player::Second]);
        let overrides = BTreeMap::new();
        let selector = Selector::new(&graph, &overrides);
        assert_eq!(
            selector.select(&parent),
            selected(&a, MoveExplanation::OnlyWinningMove)
        );
    }

    #[test]
    fn test_several_winning_moves_stay_pending() {
        let (graph, parent, [a, _, c]) =
            three_moves(Player::First, [Player::First, Player::Second, Player::First]);
        let overrides = BTreeMap::new();
        let selector = Selector::new(&graph, &overrides);
        assert_eq!(selector.select(&parent), Choice::Pending(vec![a, c]));
    }

    #[test]
    fn test_only_non_losing_candidate() {
        let (mut graph, parent, [a, b, c]) = three_moves(Player::Second, [Player::Second; 3]);
        graph.node_mut(&b).unwrap().is_determined = true;
        graph.node_mut(&c).unwrap().is_determined = true;
        let overrides = BTreeMap::new();
        let selector = Selector::new(&graph, &overrides);
        assert_eq!(
            selector.select(&parent),
            selected(&a, MoveExplanation::OnlyNonLosingCandidate)
        );
    }

    #[test]
    fn test_best_odds_against_random_play() {
        let (mut graph, parent, [a, b, c]) = three_moves(Player::Second, [Player::Second; 3]);
        // Share of losing replies for player 2: a 1/2, b 2/3, c 1/3.
        graph.node_mut(&a).unwrap().stats = MoveStats::new(1, 1, 1);
        graph.node_mut(&b).unwrap().stats = MoveStats::new(1, 2, 1);
        graph.node_mut(&c).unwrap().stats = MoveStats::new(2, 1, 1);
        let overrides = BTreeMap::new();
        assert_eq!(
            Selector::new(&graph, &overrides).select(&parent),
            selected(&b, MoveExplanation::BestOddsAgainstRandomPlay)
        );

        // Determined children are skipped while two or more are undetermined.
        graph.node_mut(&b).unwrap().is_determined = true;
        assert_eq!(
            Selector::new(&graph, &overrides).select(&parent),
            selected(&a, MoveExplanation::BestOddsAgainstRandomPlay)
        );

        // With every child determined, all moves compete again.
        graph.node_mut(&a).unwrap().is_determined = true;
        graph.node_mut(&c).unwrap().is_determined = true;
        assert_eq!(
            Selector::new(&graph, &overrides).select(&parent),
            selected(&b, MoveExplanation::BestOddsAgainstRandomPlay)
        );
    }

    #[test]
    fn test_tie_break_order() {
        let (mut graph, parent, [a, b, c]) = three_moves(Player::First, [Player::First; 3]);
        graph.node_mut(&a).unwrap().stats.total_parents = 2;
        graph.node_mut(&b).unwrap().stats.total_parents = 3;
        graph.node_mut(&c).unwrap().stats.total_parents = 3;
        let tied = [a.clone(), b.clone(), c.clone()];
        let first = b.clone().min(c.clone());
        let second = b.clone().max(c.clone());

        let none = BTreeMap::new();
        assert_eq!(
            Selector::new(&graph, &none).break_tie(&parent, &tied),
            Selection::new(first.clone(), MoveExplanation::CanonicalOrder)
        );

        let listed = BTreeMap::from([(parent.clone(), second.clone())]);
        assert_eq!(
            Selector::new(&graph, &listed).break_tie(&parent, &tied),
            Selection::new(second, MoveExplanation::ManualOverride)
        );

        // An override outside the most-parents tie is not consulted.
        let outside = BTreeMap::from([(parent.clone(), a.clone())]);
        assert_eq!(
            Selector::new(&graph, &outside).break_tie(&parent, &tied),
            Selection::new(first, MoveExplanation::CanonicalOrder)
        );

        graph.node_mut(&c).unwrap().stats.total_parents = 4;
        assert_eq!(
            Selector::new(&graph, &listed).break_tie(&parent, &tied),
            Selection::new(c, MoveExplanation::MostParents)
        );
    }

    #[test]
    fn test_shadow_scenarios() {
        // Player 2 moves at ply 8, player 1 at ply 9.
        let won = position("[[8, 1], [1], [1], [1]]");
        let lost = position("[[7, 2], [1], [1], [1]]");
        let a = position("[[9], [1], [1], [1]]");
        let b = position("[[8], [2], [1], [1]]");
        let q = position("[[7], [3], [1], [1]]");
        let c = position("[[6], [4], [1], [1]]");
        let e = position("[[6], [3], [2], [1]]");
        let [x, y, z, u, v, w] = [
            "[[10], [1], [1], []]",
            "[[9], [2], [1], []]",
            "[[8], [3], [1], []]",
            "[[7], [4], [1], []]",
            "[[6], [5], [1], []]",
            "[[8], [2], [2], []]",
        ]
        .map(position);
        let mut parts = vec![
            (won.clone(), Player::First, vec![a.clone(), b.clone()]),
            (lost.clone(), Player::Second, vec![c.clone(), e.clone()]),
            (a.clone(), Player::First, vec![x.clone(), y.clone()]),
            (b.clone(), Player::First, vec![x.clone(), z.clone()]),
            (q.clone(), Player::First, vec![z.clone(), w.clone()]),
            (c.clone(), Player::First, vec![u.clone(), v.clone()]),
            (e.clone(), Player::First, vec![u.clone(), w.clone()]),
        ];
        for leaf in [&x, &y, &z, &u, &v, &w] {
            parts.push((leaf.clone(), Player::First, vec![]));
        }
        let mut graph = StrategyGraph::from_parts(&[won, lost], &parts);
        graph.set_best_move(&a, Some(x.clone()));
        graph.set_best_move(&q, Some(z.clone()));
        graph.set_best_move(&c, Some(u.clone()));

        let reachability = Reachability::compute(&graph);
        let targets = HashSet::from([x.clone(), z.clone(), u.clone()]);
        let overrides = BTreeMap::new();
        let selector = Selector::new(&graph, &overrides);

        // `x` is chosen at `a`, which player 1 reaches from a start they win.
        assert_eq!(
            selector.select_shadow(&b, &[x.clone(), z.clone()], &reachability, &targets),
            Some(Selection::new(x, MoveExplanation::ConfirmedShadow))
        );
        // `u` is only reached from a start player 2 wins.
        assert_eq!(
            selector.select_shadow(&e, &[u.clone(), w.clone()], &reachability, &targets),
            Some(Selection::new(u, MoveExplanation::ProbabilisticShadow))
        );
        // `z` is chosen, but only at a position no scenario reaches.
        assert_eq!(
            selector.select_shadow(&b, &[z], &reachability, &targets),
            None
        );
    }

    #[test]
    fn test_compare_fractions() {
        assert_eq!(compare_fractions((1, 2), (2, 4)), Ordering::Equal);
        assert_eq!(compare_fractions((2, 3), (3, 5)), Ordering::Greater);
        assert_eq!(compare_fractions((0, 1), (1, 7)), Ordering::Less);
    }
}
