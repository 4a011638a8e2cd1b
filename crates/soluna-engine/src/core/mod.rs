pub use self::{player::*, position::*};

pub(crate) mod player;
pub(crate) mod position;

/// Number of symbols on the board (A, B, C, D).
pub const NUM_SYMBOLS: usize = 4;

/// Number of tiles in play. Conserved by every move.
pub const NUM_TILES: usize = 12;

/// Deepest possible move number: every tile merged into a single stack.
pub const MAX_PLY: usize = NUM_TILES;

const SYMBOL_LABELS: [char; NUM_SYMBOLS] = ['A', 'B', 'C', 'D'];
