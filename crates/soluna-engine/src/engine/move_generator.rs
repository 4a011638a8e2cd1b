use std::collections::BTreeSet;

use crate::core::{NUM_SYMBOLS, Pile, Position};

impl Position {
    /// Returns every distinct canonical position reachable in one move, in
    /// ascending key order.
    ///
    /// Different merges frequently collapse into the same canonical position;
    /// each result appears once. `self` is not modified.
    ///
    /// # Example
    ///
    /// ```
    /// use soluna_engine::Position;
    ///
    /// let position = Position::new([vec![3, 2, 1], vec![2, 1], vec![2], vec![1]]).unwrap();
    /// let moves = position.moves();
    /// assert_eq!(moves.len(), 16);
    /// assert!(moves.iter().all(|m| m.total_stacks() == position.total_stacks() - 1));
    /// ```
    #[must_use]
    pub fn moves(&self) -> Vec<Position> {
        let mut moves = BTreeSet::new();

        // Same-symbol merges, once per distinct pair of heights.
        for (index, pile) in self.piles().iter().enumerate() {
            for (a, b) in same_symbol_pairs(pile) {
                let mut piles = self.piles().clone();
                piles[index].remove_one(a);
                piles[index].remove_one(b);
                piles[index].push(a + b);
                moves.insert(Position::from_piles(piles));
            }
        }

        // Cross-symbol merges of equal heights; the result may go to either symbol.
        for i in 0..NUM_SYMBOLS {
            for j in (i + 1)..NUM_SYMBOLS {
                let (pile_i, pile_j) = (&self.piles()[i], &self.piles()[j]);
                for height in pile_i.distinct_heights().filter(|&h| pile_j.contains(h)) {
                    for target in [i, j] {
                        let mut piles = self.piles().clone();
                        piles[i].remove_one(height);
                        piles[j].remove_one(height);
                        piles[target].push(height * 2);
                        moves.insert(Position::from_piles(piles));
                    }
                }
            }
        }

        moves.into_iter().collect()
    }

    /// Returns `true` if the player to move has no legal move.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        let piles = self.piles();
        let same_symbol = piles.iter().any(|pile| pile.len() >= 2);
        let cross_symbol = (0..NUM_SYMBOLS).any(|i| {
            ((i + 1)..NUM_SYMBOLS)
                .any(|j| piles[i].distinct_heights().any(|h| piles[j].contains(h)))
        });
        !same_symbol && !cross_symbol
    }
}

/// Distinct unordered pairs of stack heights that can merge within `pile`.
///
/// Two equal heights form a pair only if the pile holds at least two such stacks.
fn same_symbol_pairs(pile: &Pile) -> impl Iterator<Item = (u8, u8)> + '_ {
    pile.distinct_heights().flat_map(move |a| {
        pile.distinct_heights()
            .filter(move |&b| b < a || (b == a && count(pile, a) >= 2))
            .map(move |b| (a, b))
    })
}

fn count(pile: &Pile, height: u8) -> usize {
    pile.stacks().iter().filter(|&&h| h == height).count()
}
