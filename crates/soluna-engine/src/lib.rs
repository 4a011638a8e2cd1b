//! Game model for Soluna: positions, legal moves and the full state space.
//!
//! - [`core`] - Board representation ([`Position`], [`Pile`]), validation,
//!   canonicalization and the [`Player`] to move
//! - [`engine`] - Move generation, the sixteen starting configurations and
//!   breadth-first enumeration of every reachable position ([`StateSpace`])
//!
//! # Example
//!
//! ```
//! use soluna_engine::Position;
//!
//! let position = Position::new([vec![5], vec![1, 2], vec![2, 2], vec![]]).unwrap();
//! assert_eq!(position.to_string(), "2A 2A\n2B 1B\n5C");
//! assert_eq!(position.key(), "[[2, 2], [2, 1], [5], []]");
//! assert_eq!(position.moves().len(), 4);
//! ```

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;
