use std::{cmp::Ordering, fmt, str::FromStr};

use arrayvec::ArrayVec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{NUM_SYMBOLS, NUM_TILES, Player, SYMBOL_LABELS};

/// Reasons a board fails validation.
///
/// Validation runs before canonicalization, so a malformed board is rejected
/// as given rather than silently normalized.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PositionError {
    #[display("invalid board: board does not have exactly {NUM_SYMBOLS} symbols (found {found})")]
    WrongSymbolCount { found: usize },
    #[display("invalid board: board does not have exactly {NUM_TILES} tiles (found {found})")]
    WrongTileCount { found: i64 },
    #[display("invalid board: board's stacks must be positive integers (found {height})")]
    NonPositiveStack { height: i32 },
    #[display("invalid board {input:?}: {reason}")]
    Parse { input: String, reason: &'static str },
}

/// The stacks belonging to one symbol.
///
/// Inside a canonical [`Position`] stack heights are nonincreasing.
/// A pile may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pile {
    stacks: ArrayVec<u8, NUM_TILES>,
}

impl Pile {
    #[must_use]
    pub fn stacks(&self) -> &[u8] {
        &self.stacks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Total number of tiles in this pile.
    #[must_use]
    pub fn tiles(&self) -> usize {
        self.stacks.iter().map(|&h| usize::from(h)).sum()
    }

    /// Returns `true` if some stack in this pile has the given height.
    #[must_use]
    pub fn contains(&self, height: u8) -> bool {
        self.stacks.contains(&height)
    }

    /// Distinct stack heights, highest first. Requires sorted stacks.
    pub fn distinct_heights(&self) -> impl Iterator<Item = u8> + '_ {
        self.stacks
            .iter()
            .enumerate()
            .filter(|&(i, h)| i == 0 || self.stacks[i - 1] != *h)
            .map(|(_, &h)| h)
    }

    pub(crate) fn remove_one(&mut self, height: u8) -> bool {
        match self.stacks.iter().position(|&h| h == height) {
            Some(index) => {
                self.stacks.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn push(&mut self, height: u8) {
        self.stacks.push(height);
    }

    fn sort_descending(&mut self) {
        self.stacks.sort_unstable_by(|a, b| b.cmp(a));
    }

    /// Ordering used to arrange piles: by stack count, then by contents.
    fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.len()
            .cmp(&other.len())
            .then_with(|| self.stacks().cmp(other.stacks()))
    }
}

/// A board state: the piles of the four symbols.
///
/// A `Position` is always valid and canonical:
///
/// - exactly [`NUM_SYMBOLS`] piles,
/// - [`NUM_TILES`] tiles in total, every stack at least one tile high,
/// - stack heights within a pile are nonincreasing,
/// - piles are ordered by (stack count, contents), largest first.
///
/// Canonical form identifies every board that differs only by relabeling
/// symbols or reordering stacks, so it is the key under which evaluation
/// records are stored.
///
/// # Example
///
/// ```
/// use soluna_engine::Position;
///
/// let a = Position::new([vec![1], vec![3, 1], vec![2, 2], vec![1, 1, 1]]).unwrap();
/// let b = Position::new([vec![1, 1, 1], vec![2, 2], vec![1, 3], vec![1]]).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.key(), "[[1, 1, 1], [3, 1], [2, 2], [1]]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    piles: [Pile; NUM_SYMBOLS],
}

impl Position {
    /// Validates a board given as stack heights per symbol and returns its canonical form.
    ///
    /// Checks, in order: the number of symbols, the total tile count, and that
    /// every stack height is positive.
    pub fn new<I, P>(piles: I) -> Result<Self, PositionError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[i32]>,
    {
        let piles = piles.into_iter().collect::<Vec<_>>();
        if piles.len() != NUM_SYMBOLS {
            return Err(PositionError::WrongSymbolCount { found: piles.len() });
        }

        let total = piles
            .iter()
            .flat_map(|pile| pile.as_ref())
            .map(|&h| i64::from(h))
            .sum::<i64>();
        if usize::try_from(total).ok() != Some(NUM_TILES) {
            return Err(PositionError::WrongTileCount { found: total });
        }

        if let Some(&height) = piles.iter().flat_map(|pile| pile.as_ref()).find(|&&h| h < 1) {
            return Err(PositionError::NonPositiveStack { height });
        }

        // Positive heights summing to NUM_TILES always fit in a pile.
        let mut result: [Pile; NUM_SYMBOLS] = Default::default();
        for (dst, src) in result.iter_mut().zip(&piles) {
            for &height in src.as_ref() {
                let height = u8::try_from(height)
                    .map_err(|_| PositionError::WrongTileCount { found: total })?;
                dst.push(height);
            }
        }
        Ok(Self::from_piles(result))
    }

    /// Builds a position from piles already known to hold [`NUM_TILES`]
    /// positive-height stacks, canonicalizing them.
    pub(crate) fn from_piles(mut piles: [Pile; NUM_SYMBOLS]) -> Self {
        for pile in &mut piles {
            pile.sort_descending();
        }
        piles.sort_by(|a, b| b.canonical_cmp(a));
        let position = Self { piles };
        debug_assert!(position.is_canonical());
        debug_assert_eq!(position.tiles(), NUM_TILES);
        debug_assert!(position.piles.iter().all(|p| p.stacks().iter().all(|&h| h >= 1)));
        position
    }

    #[must_use]
    pub fn piles(&self) -> &[Pile; NUM_SYMBOLS] {
        &self.piles
    }

    /// Stack heights per symbol, in the form accepted by [`Self::new`].
    #[cfg(test)]
    pub(crate) fn to_heights(&self) -> [Vec<i32>; NUM_SYMBOLS] {
        self.piles
            .each_ref()
            .map(|pile| pile.stacks().iter().map(|&h| i32::from(h)).collect())
    }

    /// Returns `true` if piles and stacks are in canonical order.
    ///
    /// Always holds for values built through the public API.
    pub(crate) fn is_canonical(&self) -> bool {
        self.piles
            .iter()
            .all(|pile| pile.stacks().windows(2).all(|w| w[0] >= w[1]))
            && self
                .piles
                .windows(2)
                .all(|w| w[0].canonical_cmp(&w[1]) != Ordering::Less)
    }

    #[must_use]
    pub fn tiles(&self) -> usize {
        self.piles.iter().map(Pile::tiles).sum()
    }

    #[must_use]
    pub fn total_stacks(&self) -> usize {
        self.piles.iter().map(Pile::len).sum()
    }

    /// Move number of this position: `1` for starting positions, one more
    /// for every merge made since.
    #[must_use]
    pub fn ply(&self) -> usize {
        NUM_TILES - self.total_stacks() + 1
    }

    #[must_use]
    pub fn player_to_move(&self) -> Player {
        Player::to_move_at(self.ply())
    }

    /// Store key: the nested-list rendering, e.g. `[[2, 2], [2, 1], [5], []]`.
    #[must_use]
    pub fn key(&self) -> String {
        KeyDisplay(self).to_string()
    }
}

impl fmt::Display for Position {
    /// One line per nonempty pile; each stack is its height followed by the
    /// symbol letter.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first_line = true;
        for (pile, label) in self.piles.iter().zip(SYMBOL_LABELS) {
            if pile.is_empty() {
                continue;
            }
            if !first_line {
                writeln!(f)?;
            }
            first_line = false;
            for (i, height) in pile.stacks().iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{height}{label}")?;
            }
        }
        Ok(())
    }
}

struct KeyDisplay<'a>(&'a Position);

impl fmt::Display for KeyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, pile) in self.0.piles.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[")?;
            for (j, height) in pile.stacks().iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{height}")?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}

impl FromStr for Position {
    type Err = PositionError;

    /// Parses the nested-list form produced by [`Position::key`].
    ///
    /// The input need not be canonical; it is validated and canonicalized.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_error = |reason| PositionError::Parse {
            input: s.to_owned(),
            reason,
        };

        let compact = s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        let inner = compact
            .strip_prefix("[[")
            .and_then(|rest| rest.strip_suffix("]]"))
            .ok_or_else(|| parse_error("expected a list of lists like [[1, 1], [2], [], []]"))?;

        let piles = inner
            .split("],[")
            .map(|pile| {
                pile.split(',')
                    .filter(|token| !token.is_empty())
                    .map(|token| token.parse::<i32>())
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| parse_error("stack heights must be integers"))?;

        Self::new(piles)
    }
}

impl Serialize for Position {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&KeyDisplay(self))
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng as _, seq::SliceRandom as _};
    use rand_pcg::Pcg32;

    use super::*;

    fn position(piles: [Vec<i32>; NUM_SYMBOLS]) -> Position {
        Position::new(piles).unwrap()
    }

    #[test]
    fn test_valid_board_is_kept_when_canonical() {
        let p = position([vec![4, 1], vec![2, 2], vec![2, 1], vec![]]);
        assert_eq!(p.to_heights(), [vec![4, 1], vec![2, 2], vec![2, 1], vec![]]);
        assert!(p.is_canonical());
    }

    #[test]
    fn test_canonical_order() {
        let p = position([vec![1], vec![3, 1], vec![2, 2], vec![1, 1, 1]]);
        assert_eq!(p.to_heights(), [vec![1, 1, 1], vec![3, 1], vec![2, 2], vec![1]]);
    }

    #[test]
    fn test_display() {
        let p = position([vec![5], vec![1, 2], vec![2, 2], vec![]]);
        assert_eq!(p.to_string(), "2A 2A\n2B 1B\n5C");

        let p = position([vec![4, 1], vec![2, 2], vec![2], vec![1]]);
        assert_eq!(p.to_string(), "4A 1A\n2B 2B\n2C\n1D");
    }

    #[test]
    fn test_wrong_symbol_count() {
        let err = Position::new([vec![4, 1], vec![2, 2], vec![2, 1], vec![], vec![]]).unwrap_err();
        assert_eq!(err, PositionError::WrongSymbolCount { found: 5 });
        assert!(err.to_string().contains("exactly 4 symbols"));
    }

    #[test]
    fn test_wrong_tile_count() {
        let err = Position::new([vec![3, 1, 1], vec![2, 2], vec![2, 1], vec![1]]).unwrap_err();
        assert_eq!(err, PositionError::WrongTileCount { found: 13 });
        assert!(err.to_string().contains("exactly 12 tiles"));
    }

    #[test]
    fn test_non_positive_stack() {
        let err = Position::new([vec![4, 1], vec![2, 2], vec![2, 1], vec![0]]);
        assert_eq!(err, Err(PositionError::NonPositiveStack { height: 0 }));

        let err = Position::new([vec![4, 1], vec![2, 2], vec![2, 1], vec![1, -1]]).unwrap_err();
        assert!(err.to_string().contains("positive integers"));
    }

    #[test]
    fn test_canonicalization_is_idempotent() {
        let p = position([vec![1, 2, 1], vec![3], vec![1, 1, 1], vec![2, 1]]);
        let again = Position::new(p.to_heights()).unwrap();
        assert_eq!(again, p);
        assert_eq!(again.to_heights(), p.to_heights());
    }

    #[test]
    fn test_canonicalization_ignores_permutations() {
        let mut rng = Pcg32::seed_from_u64(0x5011_7a);
        let base = [vec![3, 1, 1], vec![2, 1], vec![1, 1], vec![2]];
        let expected = position(base.clone());
        for _ in 0..200 {
            let mut piles = base.clone();
            piles.shuffle(&mut rng);
            for pile in &mut piles {
                pile.shuffle(&mut rng);
            }
            assert_eq!(position(piles), expected);
        }
    }

    #[test]
    fn test_equal_length_piles_reverse_lexicographic() {
        let p = position([vec![1, 1], vec![2, 1], vec![3, 1], vec![1, 1, 1]]);
        assert_eq!(p.to_heights(), [vec![1, 1, 1], vec![3, 1], vec![2, 1], vec![1, 1]]);
    }

    #[test]
    fn test_ply_and_player() {
        let start = position([vec![1, 1, 1], vec![1, 1, 1], vec![1, 1, 1], vec![1, 1, 1]]);
        assert_eq!(start.ply(), 1);
        assert_eq!(start.player_to_move(), Player::First);

        let p = position([vec![12], vec![], vec![], vec![]]);
        assert_eq!(p.ply(), 12);
        assert_eq!(p.player_to_move(), Player::Second);
    }

    #[test]
    fn test_key_roundtrip() {
        let p = position([vec![5], vec![1, 2], vec![2, 2], vec![]]);
        assert_eq!(p.key(), "[[2, 2], [2, 1], [5], []]");
        assert_eq!(p.key().parse::<Position>().unwrap(), p);
        assert_eq!("[[5,],[1,2],[2,2],[]]".parse::<Position>().unwrap(), p);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "2A 2A".parse::<Position>(),
            Err(PositionError::Parse { .. })
        ));
        assert!(matches!(
            "[[x], [2], [], []]".parse::<Position>(),
            Err(PositionError::Parse { .. })
        ));
        assert!(matches!(
            "[[6], [6], []]".parse::<Position>(),
            Err(PositionError::WrongSymbolCount { found: 3 })
        ));
    }

    #[test]
    fn test_serde_uses_key() {
        let p = position([vec![4, 1], vec![2, 2], vec![2, 1], vec![]]);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"[[4, 1], [2, 2], [2, 1], []]\"");
        let back: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);

        let err = serde_json::from_str::<Position>("\"[[4], [4], [4], [4]]\"").unwrap_err();
        assert!(err.to_string().contains("12 tiles"));
    }
}
