//! Game rules and state-space traversal.
//!
//! - [`Position::moves`](crate::Position::moves) - every position reachable by one legal merge
//! - [`starting_positions`] - the sixteen ways the twelve tiles can land at the start
//! - [`StateSpace`] - every position reachable from a set of starts, layered by ply
//!
//! # Moves
//!
//! A move merges two stacks into one:
//!
//! 1. two stacks of the same symbol, of any heights, or
//! 2. two stacks of different symbols that have equal heights; the merged stack
//!    takes either symbol.
//!
//! Every move keeps the tile count and removes exactly one stack, so the ply
//! strictly increases and the game graph is a layered DAG of depth at most
//! [`MAX_PLY`](crate::MAX_PLY). The player who cannot move loses.

pub use self::{start::*, state_space::*};

mod move_generator;
mod start;
mod state_space;
