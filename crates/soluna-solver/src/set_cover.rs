//! Set-cover reduction of player 2's first-move strategy.
//!
//! Player 2 needs to remember a reply for each position after player 1's first
//! move that player 2 wins. Many such positions share winning replies, so a
//! small set of reply positions ("anchors") can cover all of them.
//!
//! - universe: ply 2 positions won by player 2
//! - candidates: ply 3 positions won by player 2; each covers the universe
//!   positions that have a move to it
//!
//! # Heuristics
//!
//! The problem is solved by simplification to a fixed point:
//!
//! 1. drop empty candidates and candidates whose coverage is a strict subset
//!    of another candidate's
//! 2. if some element is covered by exactly one candidate, pick that candidate,
//!    remove what it covers from the problem and go back to 1
//!
//! What is left after that is resolved by the manual pick list, in order, and
//! finally by greedy completion (most uncovered elements first, canonical order
//! on ties), so no element is ever left uncovered.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use soluna_engine::{Player, Position, StateSpace};

use crate::{
    pass::{PassError, evaluated_records},
    record::EvaluationRecord,
    store::RecordStore,
};

/// Ply of the universe: positions right after player 1's first move.
pub const UNIVERSE_PLY: usize = 2;

/// How a candidate ended up in the solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PickReason {
    /// Sole remaining coverer of some element.
    Forced,
    Manual,
    Greedy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pick<T> {
    pub candidate: T,
    pub reason: PickReason,
    /// Elements first covered by this pick.
    pub covers: BTreeSet<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetCoverSolution<T: Ord> {
    pub picks: Vec<Pick<T>>,
    /// Element to the first pick covering it.
    pub assignment: BTreeMap<T, T>,
    /// Elements no candidate covers at all.
    pub uncovered: BTreeSet<T>,
    /// Manual picks that were not candidates, or no longer covered anything.
    pub ignored_picks: Vec<T>,
}

impl<T: Ord> SetCoverSolution<T> {
    #[must_use]
    pub fn anchors(&self) -> impl Iterator<Item = &T> + '_ {
        self.picks.iter().map(|p| &p.candidate)
    }
}

/// A set-cover instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCoverProblem<T: Ord> {
    universe: BTreeSet<T>,
    candidates: BTreeMap<T, BTreeSet<T>>,
}

impl<T> SetCoverProblem<T>
where
    T: Ord + Clone,
{
    /// Builds an instance; coverage outside `universe` is ignored.
    pub fn new<I>(universe: BTreeSet<T>, candidates: I) -> Self
    where
        I: IntoIterator<Item = (T, BTreeSet<T>)>,
    {
        let candidates = candidates
            .into_iter()
            .map(|(candidate, covers)| {
                let covers = covers.intersection(&universe).cloned().collect();
                (candidate, covers)
            })
            .collect();
        Self {
            universe,
            candidates,
        }
    }

    #[must_use]
    pub fn universe(&self) -> &BTreeSet<T> {
        &self.universe
    }

    #[must_use]
    pub fn candidates(&self) -> &BTreeMap<T, BTreeSet<T>> {
        &self.candidates
    }

    /// Solves the instance with the heuristics described at the module level.
    #[must_use]
    pub fn solve(&self, manual_picks: &[T]) -> SetCoverSolution<T> {
        let mut state = SolveState {
            uncovered: self.universe.clone(),
            candidates: self.candidates.clone(),
            picks: vec![],
        };
        let uncoverable = state
            .uncovered
            .iter()
            .filter(|element| !self.candidates.values().any(|c| c.contains(*element)))
            .cloned()
            .collect::<BTreeSet<_>>();
        for element in &uncoverable {
            state.uncovered.remove(element);
        }

        state.simplify();

        let mut ignored_picks = vec![];
        for candidate in manual_picks {
            let useful = state
                .candidates
                .get(candidate)
                .is_some_and(|covers| !covers.is_empty());
            if useful {
                state.pick(candidate, PickReason::Manual);
                state.simplify();
            } else {
                ignored_picks.push(candidate.clone());
            }
        }

        while !state.uncovered.is_empty() {
            let best = state
                .candidates
                .iter()
                .filter(|(_, covers)| !covers.is_empty())
                .max_by(|(a, ca), (b, cb)| ca.len().cmp(&cb.len()).then_with(|| b.cmp(a)))
                .map(|(candidate, _)| candidate.clone());
            let Some(best) = best else {
                break;
            };
            state.pick(&best, PickReason::Greedy);
        }

        let mut assignment = BTreeMap::new();
        for pick in &state.picks {
            for element in &pick.covers {
                assignment.insert(element.clone(), pick.candidate.clone());
            }
        }
        SetCoverSolution {
            picks: state.picks,
            assignment,
            uncovered: uncoverable,
            ignored_picks,
        }
    }
}

#[derive(Debug)]
struct SolveState<T: Ord> {
    uncovered: BTreeSet<T>,
    candidates: BTreeMap<T, BTreeSet<T>>,
    picks: Vec<Pick<T>>,
}

impl<T> SolveState<T>
where
    T: Ord + Clone,
{
    fn simplify(&mut self) {
        loop {
            self.remove_dominated();
            let forced = self.uncovered.iter().find_map(|element| {
                let mut coverers = self
                    .candidates
                    .iter()
                    .filter(|(_, covers)| covers.contains(element));
                match (coverers.next(), coverers.next()) {
                    (Some((candidate, _)), None) => Some(candidate.clone()),
                    _ => None,
                }
            });
            let Some(forced) = forced else {
                break;
            };
            self.pick(&forced, PickReason::Forced);
        }
    }

    /// Drops empty candidates and candidates strictly dominated by another.
    fn remove_dominated(&mut self) {
        let dominated = self
            .candidates
            .iter()
            .filter(|(_, covers)| {
                covers.is_empty()
                    || self
                        .candidates
                        .values()
                        .any(|other| covers.len() < other.len() && covers.is_subset(other))
            })
            .map(|(candidate, _)| candidate.clone())
            .collect::<Vec<_>>();
        for candidate in dominated {
            self.candidates.remove(&candidate);
        }
    }

    fn pick(&mut self, candidate: &T, reason: PickReason) {
        let Some(covers) = self.candidates.remove(candidate) else {
            return;
        };
        for element in &covers {
            self.uncovered.remove(element);
        }
        for other in self.candidates.values_mut() {
            other.retain(|element| !covers.contains(element));
        }
        self.picks.push(Pick {
            candidate: candidate.clone(),
            reason,
            covers,
        });
    }
}

impl SetCoverProblem<Position> {
    /// Builds the player 2 first-move instance from evaluated records.
    pub fn from_store<S>(store: &S, space: &StateSpace) -> Result<Self, PassError>
    where
        S: RecordStore + ?Sized,
    {
        let layer = space
            .layer(UNIVERSE_PLY)
            .map(|layer| layer.iter().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        let universe = evaluated_records(store, &layer)?
            .into_iter()
            .filter(|record| record.eval == Player::Second)
            .map(|record| record.state)
            .collect::<BTreeSet<_>>();

        let mut candidates = BTreeMap::<_, BTreeSet<_>>::new();
        for element in &universe {
            let children = evaluated_records(store, &element.moves())?;
            for EvaluationRecord { state, eval, .. } in children {
                if eval == Player::Second {
                    candidates.entry(state).or_default().insert(element.clone());
                }
            }
        }
        Ok(Self::new(universe, candidates))
    }
}
