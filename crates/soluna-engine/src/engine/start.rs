use crate::core::{NUM_SYMBOLS, NUM_TILES, Pile, Position};

/// Number of single tiles per symbol for each starting configuration.
///
/// These are the sixteen partitions of [`NUM_TILES`] into at most
/// [`NUM_SYMBOLS`] parts with no part larger than six, i.e. every way the
/// twelve double-sided tiles can land.
pub const STARTING_CONFIGURATIONS: [[u8; NUM_SYMBOLS]; 16] = [
    [3, 3, 3, 3],
    [4, 3, 3, 2],
    [4, 4, 2, 2],
    [4, 4, 3, 1],
    [4, 4, 4, 0],
    [5, 3, 2, 2],
    [5, 3, 3, 1],
    [5, 4, 2, 1],
    [5, 4, 3, 0],
    [5, 5, 1, 1],
    [5, 5, 2, 0],
    [6, 2, 2, 2],
    [6, 3, 2, 1],
    [6, 3, 3, 0],
    [6, 4, 1, 1],
    [6, 4, 2, 0],
];

/// Returns the canonical starting positions: every tile is a stack of height one.
#[must_use]
pub fn starting_positions() -> Vec<Position> {
    STARTING_CONFIGURATIONS
        .iter()
        .map(|counts| {
            let piles = counts.map(|count| {
                let mut pile = Pile::default();
                for _ in 0..count {
                    pile.push(1);
                }
                pile
            });
            Position::from_piles(piles)
        })
        .collect()
}

const _: () = {
    let mut i = 0;
    while i < STARTING_CONFIGURATIONS.len() {
        let c = STARTING_CONFIGURATIONS[i];
        assert!(c[0] as usize + c[1] as usize + c[2] as usize + c[3] as usize == NUM_TILES);
        i += 1;
    }
};
