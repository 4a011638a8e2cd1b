//! Solver for Soluna: game values, determinacy, statistics and a compact
//! optimal-play strategy for every reachable position.
//!
//! The solver runs as a sequence of passes over a [`RecordStore`](store::RecordStore),
//! each reading what the earlier ones wrote:
//!
//! 1. **Evaluate** ([`position_evaluator`]) - memoized backward induction;
//!    creates one record per reachable position
//! 2. **Determinacy** ([`determinacy`]) - marks positions whose outcome no
//!    longer depends on play
//! 3. **Statistics** ([`move_stats`]) - move counts, win/loss shares and parent
//!    counts
//! 4. **Strategy** ([`strategy`]) - one best move per position, shrunk by the
//!    shadowing fixed point
//! 5. **Reachability** ([`strategy`]) - which positions each optimal-play
//!    scenario reaches
//!
//! [`Solver`] runs passes in that order and refuses to run a pass whose
//! prerequisites have not completed against the store. The set-cover reduction
//! ([`set_cover`]) is separate and only reads the store.
//!
//! # Architecture
//!
//! ```text
//! StateSpace (soluna-engine)
//!     ↓ positions, deepest first
//! PositionEvaluator ──→ RecordStore ←── Determinacy / Statistics
//!                            ↓
//!                      StrategyGraph ──→ StrategyBuilder ⟲ Reachability
//!                            ↓
//!                      SetCoverProblem
//! ```
//!
//! # Example
//!
//! ```
//! use soluna_engine::{Position, StateSpace};
//! use soluna_solver::{Solver, record::MoveExplanation, store::{MemoryStore, RecordStore}};
//!
//! let start = Position::new([vec![2, 2], vec![2, 2], vec![2, 2], vec![]]).unwrap();
//! let space = StateSpace::enumerate([start.clone()]);
//! let mut store = MemoryStore::new();
//! Solver::new(&mut store, &space).run_all().unwrap();
//!
//! let record = store.get(&start).unwrap().unwrap();
//! assert!(record.best_move.is_some());
//! assert_ne!(record.move_explanation, Some(MoveExplanation::Terminal));
//! ```

pub use self::solver::Solver;

pub mod determinacy;
pub mod move_stats;
pub mod pass;
pub mod position_evaluator;
pub mod record;
pub mod set_cover;
mod solver;
pub mod store;
pub mod strategy;
