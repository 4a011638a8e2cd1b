//! Strategy construction: one best move per position.
//!
//! - [`StrategyGraph`] - the evaluated game graph, loaded from the store
//! - selection rules - the priority chain that picks a move ([`Selection`])
//! - [`Reachability`] - which positions each optimal-play scenario reaches
//! - [`StrategyBuilder`] - the fixed point between shadowing and reachability
//!
//! # Fixed Point
//!
//! Shadowing reuses a winning move that is already some other position's best
//! move and that an optimal player actually reaches. Which positions are
//! reached depends on the best moves chosen so far, so the builder iterates:
//!
//! 1. apply every rule that does not need reachability; positions with several
//!    winning moves stay pending
//! 2. recompute reachability and the set of chosen moves
//! 3. let positions already decided by a tie-break switch to a shadow that has
//!    become available; otherwise shadow pending positions; otherwise
//!    tie-break a batch of pending positions, shallowest ply first
//! 4. repeat from step 2 until an iteration decides nothing
//!
//! A tie-break is never final while a shadow may still appear, so on
//! convergence no position decided by rule 7 has a shadow available.
//!
//! Every productive iteration either moves a pending position out of the
//! pending list or moves a tie-broken position to a shadow, and shadows are
//! never revisited. The loop therefore ends within twice as many iterations
//! as there were pending positions. The iteration limit is a guard only; if
//! it is hit, whatever is still pending is tie-broken.

use std::{
    collections::{BTreeMap, HashSet},
    mem,
};

use soluna_engine::{Player, Position, StateSpace};

use crate::{
    pass::PassError,
    record::{MoveExplanation, OptimalPlay, RecordUpdate},
    store::RecordStore,
};

pub use self::{graph::*, reachability::*, selector::Selection};
use self::selector::{Choice, Selector};

mod graph;
mod reachability;
mod selector;

pub const DEFAULT_MAX_ITERATIONS: usize = 4096;

/// Tunables of best-move selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyConfig {
    /// Manual choices for positions still tied after the parent count, keyed
    /// by position.
    pub overrides: BTreeMap<Position, Position>,
    /// Upper bound on fixed-point iterations.
    pub max_iterations: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            overrides: BTreeMap::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategySummary {
    /// Fixed-point iterations run, including the final one that decided nothing.
    pub iterations: usize,
    /// `false` if the iteration limit stopped the fixed point.
    pub converged: bool,
    pub explanations: BTreeMap<MoveExplanation, usize>,
    /// Override entries that were never consulted.
    pub unused_overrides: Vec<Position>,
}

/// A complete strategy: the selection of every position.
#[derive(Debug, Clone)]
pub struct Strategy {
    pub graph: StrategyGraph,
    pub selections: BTreeMap<Position, Selection>,
    pub reachability: Reachability,
    pub summary: StrategySummary,
}

#[derive(Debug)]
pub struct StrategyBuilder<'a> {
    graph: StrategyGraph,
    config: &'a StrategyConfig,
}

impl<'a> StrategyBuilder<'a> {
    /// Prepares a builder, rejecting overrides that do not name a position of
    /// `graph` and one of its moves.
    pub fn new(mut graph: StrategyGraph, config: &'a StrategyConfig) -> Result<Self, PassError> {
        for (position, choice) in &config.overrides {
            let valid = graph
                .get(position)
                .is_some_and(|node| node.moves.contains(choice));
            if !valid {
                return Err(PassError::UnknownOverride {
                    state: position.key(),
                });
            }
        }
        graph.clear_best_moves();
        Ok(Self { graph, config })
    }

    #[must_use]
    pub fn build(mut self) -> Strategy {
        let mut selections = BTreeMap::new();

        let choices = {
            let selector = Selector::new(&self.graph, &self.config.overrides);
            self.graph
                .iter()
                .map(|(position, _)| (position.clone(), selector.select(position)))
                .collect::<Vec<_>>()
        };
        let mut pending = vec![];
        for (position, choice) in choices {
            match choice {
                Choice::Selected(selection) => self.assign(&mut selections, position, selection),
                Choice::Pending(winning) => pending.push(Contested { position, winning }),
            }
        }
        pending.sort_by_key(|contested| contested.position.ply());
        tracing::debug!(
            positions = self.graph.len(),
            assigned = selections.len(),
            pending = pending.len(),
            "applied direct rules"
        );

        let mut tie_broken = vec![];
        let mut iterations = 0;
        let mut converged = false;
        while iterations < self.config.max_iterations {
            iterations += 1;
            let step = self.step(&mut pending, &mut tie_broken);
            tracing::debug!(
                iteration = iterations,
                step = %step.kind,
                assigned = step.selections.len(),
                pending = pending.len(),
                tie_broken = tie_broken.len(),
                "strategy iteration"
            );
            if step.selections.is_empty() {
                converged = true;
                break;
            }
            for (position, selection) in step.selections {
                self.assign(&mut selections, position, selection);
            }
        }
        if !converged {
            tracing::warn!(
                iterations,
                pending = pending.len(),
                "strategy stopped at the iteration limit"
            );
            let tie_breaks = {
                let selector = Selector::new(&self.graph, &self.config.overrides);
                pending
                    .drain(..)
                    .map(|contested| {
                        let selection = selector.break_tie(&contested.position, &contested.winning);
                        (contested.position, selection)
                    })
                    .collect::<Vec<_>>()
            };
            for (position, selection) in tie_breaks {
                self.assign(&mut selections, position, selection);
            }
        }

        let mut summary = StrategySummary {
            iterations,
            converged,
            ..StrategySummary::default()
        };
        for selection in selections.values() {
            *summary.explanations.entry(selection.explanation).or_insert(0) += 1;
        }
        summary.unused_overrides = self
            .config
            .overrides
            .keys()
            .filter(|position| {
                selections
                    .get(*position)
                    .is_none_or(|s| s.explanation != MoveExplanation::ManualOverride)
            })
            .cloned()
            .collect();

        let reachability = Reachability::compute(&self.graph);
        Strategy {
            graph: self.graph,
            selections,
            reachability,
            summary,
        }
    }

    /// Runs one iteration of the fixed point and returns what it decided.
    ///
    /// Tried in order, the first that decides anything ends the iteration:
    ///
    /// 1. tie-broken positions that can now shadow switch to the shadow
    /// 2. pending positions that can shadow take the shadow
    /// 3. pending positions are tie-broken: every one the mover's optimal lines
    ///    never reach, and those at the shallowest reached ply whose winning
    ///    moves do not overlap
    ///
    /// Positions decided in step 3 are kept in `tie_broken`. Only reached
    /// positions make new shadows possible, and only for positions sharing a
    /// winning move with them.
    fn step(&self, pending: &mut Vec<Contested>, tie_broken: &mut Vec<Contested>) -> Step {
        let reachability = Reachability::compute(&self.graph);
        let targets = self
            .graph
            .iter()
            .filter_map(|(_, node)| node.best_move.clone())
            .collect::<HashSet<_>>();
        let selector = Selector::new(&self.graph, &self.config.overrides);

        let mut selections = vec![];
        tie_broken.retain(|contested| {
            let chosen = self.graph.best_move(&contested.position);
            let others = contested
                .winning
                .iter()
                .filter(|child| Some(*child) != chosen)
                .cloned()
                .collect::<Vec<_>>();
            match selector.select_shadow(&contested.position, &others, &reachability, &targets) {
                Some(selection) => {
                    selections.push((contested.position.clone(), selection));
                    false
                }
                None => true,
            }
        });
        if !selections.is_empty() {
            return Step::new(StepKind::Reshadow, selections);
        }

        pending.retain(|contested| {
            match selector.select_shadow(
                &contested.position,
                &contested.winning,
                &reachability,
                &targets,
            ) {
                Some(selection) => {
                    selections.push((contested.position.clone(), selection));
                    false
                }
                None => true,
            }
        });
        if !selections.is_empty() {
            return Step::new(StepKind::Shadow, selections);
        }

        let mover_reaches = |position: &Position| {
            let mover = position.player_to_move();
            Player::ALL
                .into_iter()
                .any(|winner| reachability.is_reachable(position, OptimalPlay::new(mover, winner)))
        };
        let shallowest = pending
            .iter()
            .filter(|contested| mover_reaches(&contested.position))
            .map(|contested| contested.position.ply())
            .min();
        let mut claimed = HashSet::new();
        let mut batch = vec![];
        for contested in mem::take(pending) {
            let reached = mover_reaches(&contested.position);
            let independent = !reached
                || (Some(contested.position.ply()) == shallowest
                    && contested.winning.iter().all(|child| !claimed.contains(child)));
            if independent {
                if reached {
                    claimed.extend(contested.winning.iter().cloned());
                }
                batch.push(contested);
            } else {
                pending.push(contested);
            }
        }
        for contested in batch {
            let selection = selector.break_tie(&contested.position, &contested.winning);
            selections.push((contested.position.clone(), selection));
            tie_broken.push(contested);
        }
        Step::new(StepKind::TieBreak, selections)
    }

    fn assign(
        &mut self,
        selections: &mut BTreeMap<Position, Selection>,
        position: Position,
        selection: Selection,
    ) {
        self.graph
            .set_best_move(&position, selection.best_move.clone());
        selections.insert(position, selection);
    }
}

/// A position with several winning moves.
#[derive(Debug)]
struct Contested {
    position: Position,
    winning: Vec<Position>,
}

#[derive(Debug, Clone, Copy, derive_more::Display)]
enum StepKind {
    #[display("reshadow")]
    Reshadow,
    #[display("shadow")]
    Shadow,
    #[display("tie-break")]
    TieBreak,
}

#[derive(Debug)]
struct Step {
    kind: StepKind,
    selections: Vec<(Position, Selection)>,
}

impl Step {
    fn new(kind: StepKind, selections: Vec<(Position, Selection)>) -> Self {
        Self { kind, selections }
    }
}

/// Chooses and stores the best move of every position in `space`.
pub fn select_best_moves<S>(
    store: &mut S,
    space: &StateSpace,
    config: &StrategyConfig,
) -> Result<StrategySummary, PassError>
where
    S: RecordStore + ?Sized,
{
    let graph = StrategyGraph::load(store, space)?;
    let strategy = StrategyBuilder::new(graph, config)?.build();

    for (position, selection) in &strategy.selections {
        store.update(
            position,
            RecordUpdate::BestMove {
                best_move: selection.best_move.clone(),
                explanation: selection.explanation,
            },
        )?;
    }

    for position in &strategy.summary.unused_overrides {
        tracing::warn!(
            state = %position.key(),
            "override not used; the position was decided by another rule"
        );
    }
    for play in OptimalPlay::ALL {
        tracing::debug!(
            optimal = play.optimal.label(),
            winner = play.winner.label(),
            positions = strategy.reachability.count(play),
            "strategy reaches"
        );
    }
    Ok(strategy.summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(key: &str) -> Position {
        key.parse().unwrap()
    }

    fn selection(best_move: &Position, explanation: MoveExplanation) -> Selection {
        Selection {
            best_move: Some(best_move.clone()),
            explanation,
        }
    }

    #[test]
    fn test_tie_break_gives_way_to_later_shadow() {
        // Player 1 wins at both `p` and `r`, which share the winning move `y`.
        let start = position("[[8, 1], [1], [1], [1]]");
        let p = position("[[9], [1], [1], [1]]");
        let r = position("[[8], [2], [1], [1]]");
        let [x, y, z] = ["[[10], [1], [1], []]", "[[9], [2], [1], []]", "[[8], [3], [1], []]"]
            .map(position);
        let mut graph = StrategyGraph::from_parts(
            &[start.clone()],
            &[
                (start, Player::First, vec![p.clone(), r.clone()]),
                (p.clone(), Player::First, vec![x.clone(), y.clone()]),
                (r.clone(), Player::First, vec![y.clone(), z.clone()]),
                (x.clone(), Player::First, vec![]),
                (y.clone(), Player::First, vec![]),
                (z.clone(), Player::First, vec![]),
            ],
        );
        // `p` alone prefers `x`, `r` alone prefers `y`.
        for (leaf, parents) in [(&x, 3), (&y, 2), (&z, 1)] {
            graph.node_mut(leaf).unwrap().stats.total_parents = parents;
        }

        let config = StrategyConfig::default();
        let strategy = StrategyBuilder::new(graph, &config).unwrap().build();

        assert!(strategy.summary.converged);
        assert_eq!(
            strategy.selections[&r],
            selection(&y, MoveExplanation::MostParents)
        );
        assert_eq!(
            strategy.selections[&p],
            selection(&y, MoveExplanation::ConfirmedShadow)
        );
        assert!(strategy.reachability.is_reachable(&y, OptimalPlay::new(Player::First, Player::First)));
        assert!(!strategy.reachability.is_reachable(&x, OptimalPlay::new(Player::First, Player::First)));
    }

    #[test]
    fn test_overrides_decide_remaining_ties() {
        let p = position("[[9], [1], [1], [1]]");
        let forced = position("[[8], [2], [1], [1]]");
        let [x, y, z] = ["[[10], [1], [1], []]", "[[9], [2], [1], []]", "[[8], [3], [1], []]"]
            .map(position);
        let graph = StrategyGraph::from_parts(
            &[],
            &[
                (p.clone(), Player::First, vec![x.clone(), y.clone()]),
                (forced.clone(), Player::First, vec![z.clone()]),
                (x.clone(), Player::First, vec![]),
                (y.clone(), Player::First, vec![]),
                (z.clone(), Player::First, vec![]),
            ],
        );
        let first = x.clone().min(y.clone());
        let second = x.max(y);

        let plain = StrategyBuilder::new(graph.clone(), &StrategyConfig::default())
            .unwrap()
            .build();
        assert_eq!(
            plain.selections[&p],
            selection(&first, MoveExplanation::CanonicalOrder)
        );

        let config = StrategyConfig {
            overrides: BTreeMap::from([
                (p.clone(), second.clone()),
                (forced.clone(), z.clone()),
            ]),
            ..StrategyConfig::default()
        };
        let strategy = StrategyBuilder::new(graph.clone(), &config).unwrap().build();
        assert_eq!(
            strategy.selections[&p],
            selection(&second, MoveExplanation::ManualOverride)
        );
        assert_eq!(
            strategy.selections[&forced],
            selection(&z, MoveExplanation::Forced)
        );
        assert_eq!(strategy.summary.unused_overrides, vec![forced.clone()]);
        assert_eq!(strategy.summary.explanations[&MoveExplanation::ManualOverride], 1);

        let invalid = StrategyConfig {
            overrides: BTreeMap::from([(forced, first)]),
            ..StrategyConfig::default()
        };
        assert!(matches!(
            StrategyBuilder::new(graph, &invalid),
            Err(PassError::UnknownOverride { .. })
        ));
    }

    #[test]
    fn test_iteration_limit_still_annotates_everything() {
        let start = position("[[8, 1], [1], [1], [1]]");
        let p = position("[[9], [1], [1], [1]]");
        let [x, y] = ["[[10], [1], [1], []]", "[[9], [2], [1], []]"].map(position);
        let graph = StrategyGraph::from_parts(
            &[start.clone()],
            &[
                (start.clone(), Player::First, vec![p.clone()]),
                (p.clone(), Player::First, vec![x.clone(), y.clone()]),
                (x.clone(), Player::First, vec![]),
                (y.clone(), Player::First, vec![]),
            ],
        );
        let config = StrategyConfig {
            max_iterations: 0,
            ..StrategyConfig::default()
        };
        let strategy = StrategyBuilder::new(graph, &config).unwrap().build();

        assert!(!strategy.summary.converged);
        assert_eq!(strategy.selections.len(), 4);
        assert_eq!(
            strategy.selections[&p],
            selection(&x.min(y), MoveExplanation::CanonicalOrder)
        );
        assert_eq!(
            strategy.selections[&start],
            selection(&p, MoveExplanation::Forced)
        );
    }
}
