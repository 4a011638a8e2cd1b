use std::time::Instant;

use soluna_engine::StateSpace;

use crate::{
    determinacy::propagate_determinacy,
    move_stats::compute_move_stats,
    pass::{Pass, PassError},
    position_evaluator::PositionEvaluator,
    store::RecordStore,
    strategy::{StrategyConfig, select_best_moves, write_reachability},
};

/// Runs solver passes against one store, in dependency order.
///
/// Every pass checks its preconditions first, and on success is recorded as
/// completed and committed before the next one starts. A failing pass is not
/// committed.
#[derive(Debug)]
pub struct Solver<'a, S: ?Sized> {
    store: &'a mut S,
    space: &'a StateSpace,
    strategy: StrategyConfig,
}

impl<'a, S> Solver<'a, S>
where
    S: RecordStore + ?Sized,
{
    pub fn new(store: &'a mut S, space: &'a StateSpace) -> Self {
        Self {
            store,
            space,
            strategy: StrategyConfig::default(),
        }
    }

    #[must_use]
    pub fn with_strategy_config(mut self, config: StrategyConfig) -> Self {
        self.strategy = config;
        self
    }

    /// Runs every pass.
    pub fn run_all(&mut self) -> Result<(), PassError> {
        self.run(&Pass::ALL)
    }

    /// Runs the given passes, sorted into dependency order.
    pub fn run(&mut self, passes: &[Pass]) -> Result<(), PassError> {
        let mut passes = passes.to_vec();
        passes.sort_unstable();
        passes.dedup();
        for pass in passes {
            self.run_pass(pass)?;
        }
        Ok(())
    }

    pub fn run_pass(&mut self, pass: Pass) -> Result<(), PassError> {
        pass.check_preconditions(&*self.store)?;
        tracing::info!(%pass, "starting pass");
        let started = Instant::now();

        match pass {
            Pass::Evaluate => {
                let summary = PositionEvaluator::new(&mut *self.store).evaluate_all(self.space)?;
                tracing::info!(
                    positions = summary.positions,
                    inserted = summary.inserted,
                    p1_wins = summary.first_player_wins,
                    p2_wins = summary.second_player_wins,
                    "evaluated positions"
                );
            }
            Pass::Determinacy => {
                let summary = propagate_determinacy(&mut *self.store, self.space)?;
                tracing::info!(
                    positions = summary.positions,
                    determined = summary.determined,
                    newly_determined = summary.newly_determined,
                    "propagated determinacy"
                );
            }
            Pass::Statistics => {
                let updated = compute_move_stats(&mut *self.store, self.space)?;
                tracing::info!(updated, "computed move statistics");
            }
            Pass::Strategy => {
                let summary = select_best_moves(&mut *self.store, self.space, &self.strategy)?;
                for (explanation, count) in &summary.explanations {
                    tracing::debug!(%explanation, count, "best moves by rule");
                }
                tracing::info!(
                    iterations = summary.iterations,
                    converged = summary.converged,
                    "selected best moves"
                );
            }
            Pass::Reachability => {
                let reachability = write_reachability(&mut *self.store, self.space)?;
                tracing::info!(
                    reachable = self.space.iter().filter(|p| reachability.flags(p).any()).count(),
                    "wrote reachability flags"
                );
            }
        }

        self.store.mark_pass_complete(pass)?;
        self.store.commit()?;
        tracing::info!(%pass, elapsed = ?started.elapsed(), "finished pass");
        Ok(())
    }
}
