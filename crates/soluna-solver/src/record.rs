//! Evaluation records: everything the solver learns about one canonical position.
//!
//! A record is created once, by the position evaluator, the first time its
//! position is evaluated. Later passes only ever fill in more columns through
//! [`RecordUpdate`]; no record is deleted or duplicated.

use serde::{Deserialize, Serialize};
use soluna_engine::{Player, Position};

/// One row of the record table, keyed by [`EvaluationRecord::state`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Store-assigned identifier, in insertion order. Not portable between stores.
    pub id: u32,
    /// Ply of `state`.
    pub move_num: usize,
    pub state: Position,
    /// Player who can force a win (`1` / `-1` when serialized).
    pub eval: Player,
    /// Every line of play from here ends with `eval` winning.
    pub is_determined: bool,
    /// Filled by the statistics pass.
    pub stats: Option<MoveStats>,
    pub best_move: Option<Position>,
    pub move_explanation: Option<MoveExplanation>,
    pub reachability: ReachabilityFlags,
}

impl EvaluationRecord {
    #[must_use]
    pub fn new(id: u32, state: Position, eval: Player) -> Self {
        Self {
            id,
            move_num: state.ply(),
            state,
            eval,
            is_determined: false,
            stats: None,
            best_move: None,
            move_explanation: None,
            reachability: ReachabilityFlags::default(),
        }
    }

    /// Returns `true` if the player to move can force a win.
    #[must_use]
    pub fn is_winning_for_mover(&self) -> bool {
        self.eval == self.state.player_to_move()
    }
}

/// Move statistics of a position, counted from the point of view of the
/// player to move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveStats {
    pub possible_move_count: usize,
    /// Moves to positions the mover still wins.
    pub num_winning_moves: usize,
    /// Moves to positions the mover loses.
    pub num_losing_moves: usize,
    /// `100 * num_winning_moves / possible_move_count`, `0` without moves.
    pub winning_move_percentage: f64,
    /// `100 * num_losing_moves / possible_move_count`, `0` without moves.
    pub losing_move_percentage: f64,
    /// Distinct positions with a move to this one.
    pub total_parents: usize,
}

impl MoveStats {
    #[must_use]
    pub fn new(num_winning_moves: usize, num_losing_moves: usize, total_parents: usize) -> Self {
        let possible_move_count = num_winning_moves + num_losing_moves;
        Self {
            possible_move_count,
            num_winning_moves,
            num_losing_moves,
            winning_move_percentage: percentage(num_winning_moves, possible_move_count),
            losing_move_percentage: percentage(num_losing_moves, possible_move_count),
            total_parents,
        }
    }
}

#[expect(clippy::cast_precision_loss)]
fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * count as f64 / total as f64
    }
}

/// Why a best move was chosen. Serialized as the human-readable tag.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
pub enum MoveExplanation {
    /// No legal moves.
    #[display("terminal")]
    #[serde(rename = "terminal")]
    Terminal,
    /// Exactly one legal move.
    #[display("forced")]
    #[serde(rename = "forced")]
    Forced,
    #[display("only winning move")]
    #[serde(rename = "only winning move")]
    OnlyWinningMove,
    /// Losing position where one move is not yet a certain loss.
    #[display("only non-losing candidate")]
    #[serde(rename = "only non-losing candidate")]
    OnlyNonLosingCandidate,
    /// Reuses a move already chosen elsewhere on an optimal line.
    #[display("confirmed shadow")]
    #[serde(rename = "confirmed shadow")]
    ConfirmedShadow,
    /// Reuses a move already chosen elsewhere on a line that needs an opponent mistake.
    #[display("probabilistic shadow")]
    #[serde(rename = "probabilistic shadow")]
    ProbabilisticShadow,
    /// Losing position: the move that leaves the opponent the most ways to go wrong.
    #[display("best odds against random play")]
    #[serde(rename = "best odds against random play")]
    BestOddsAgainstRandomPlay,
    #[display("most parents")]
    #[serde(rename = "most parents")]
    MostParents,
    #[display("manual override")]
    #[serde(rename = "manual override")]
    ManualOverride,
    /// Still tied after every other rule; lowest key wins.
    #[display("canonical order")]
    #[serde(rename = "canonical order")]
    CanonicalOrder,
}

/// An optimal-play scenario: `optimal` follows its best moves while the other
/// player may play anything, starting from every start that `winner` wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptimalPlay {
    pub optimal: Player,
    pub winner: Player,
}

impl OptimalPlay {
    pub const ALL: [Self; 4] = [
        Self::new(Player::First, Player::First),
        Self::new(Player::First, Player::Second),
        Self::new(Player::Second, Player::First),
        Self::new(Player::Second, Player::Second),
    ];

    #[must_use]
    pub const fn new(optimal: Player, winner: Player) -> Self {
        Self { optimal, winner }
    }
}

/// Whether a position occurs in each [`OptimalPlay`] scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachabilityFlags {
    pub p1_optimal_p1_wins: bool,
    pub p1_optimal_p2_wins: bool,
    pub p2_optimal_p1_wins: bool,
    pub p2_optimal_p2_wins: bool,
}

impl ReachabilityFlags {
    #[must_use]
    pub fn get(&self, play: OptimalPlay) -> bool {
        match (play.optimal, play.winner) {
            (Player::First, Player::First) => self.p1_optimal_p1_wins,
            (Player::First, Player::Second) => self.p1_optimal_p2_wins,
            (Player::Second, Player::First) => self.p2_optimal_p1_wins,
            (Player::Second, Player::Second) => self.p2_optimal_p2_wins,
        }
    }

    pub fn set(&mut self, play: OptimalPlay, reachable: bool) {
        let flag = match (play.optimal, play.winner) {
            (Player::First, Player::First) => &mut self.p1_optimal_p1_wins,
            (Player::First, Player::Second) => &mut self.p1_optimal_p2_wins,
            (Player::Second, Player::First) => &mut self.p2_optimal_p1_wins,
            (Player::Second, Player::Second) => &mut self.p2_optimal_p2_wins,
        };
        *flag = reachable;
    }

    #[must_use]
    pub fn any(&self) -> bool {
        OptimalPlay::ALL.iter().any(|&play| self.get(play))
    }
}

/// A field-level change to one record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordUpdate {
    /// Marks the record determined. Never unmarks.
    Determined,
    Stats(MoveStats),
    BestMove {
        best_move: Option<Position>,
        explanation: MoveExplanation,
    },
    Reachability(ReachabilityFlags),
}

impl RecordUpdate {
    pub fn apply(self, record: &mut EvaluationRecord) {
        match self {
            Self::Determined => record.is_determined = true,
            Self::Stats(stats) => record.stats = Some(stats),
            Self::BestMove {
                best_move,
                explanation,
            } => {
                record.best_move = best_move;
                record.move_explanation = Some(explanation);
            }
            Self::Reachability(flags) => record.reachability = flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> Position {
        Position::new([vec![1, 1, 1], vec![1, 1, 1], vec![1, 1, 1], vec![1, 1, 1]]).unwrap()
    }

    #[test]
    fn test_move_stats_percentages() {
        let stats = MoveStats::new(1, 3, 2);
        assert_eq!(stats.possible_move_count, 4);
        assert!((stats.winning_move_percentage - 25.0).abs() < f64::EPSILON);
        assert!((stats.losing_move_percentage - 75.0).abs() < f64::EPSILON);

        let terminal = MoveStats::new(0, 0, 5);
        assert!(terminal.winning_move_percentage.abs() < f64::EPSILON);
        assert!(terminal.losing_move_percentage.abs() < f64::EPSILON);
    }

    #[test]
    fn test_reachability_flags_are_independent() {
        let mut flags = ReachabilityFlags::default();
        assert!(!flags.any());
        for (i, play) in OptimalPlay::ALL.into_iter().enumerate() {
            flags.set(play, true);
            let set = OptimalPlay::ALL.iter().filter(|&&p| flags.get(p)).count();
            assert_eq!(set, i + 1);
        }
        flags.set(OptimalPlay::new(Player::First, Player::Second), false);
        assert!(!flags.p1_optimal_p2_wins);
        assert!(flags.p2_optimal_p1_wins);
    }

    #[test]
    fn test_determined_update_is_monotonic() {
        let mut record = EvaluationRecord::new(1, start(), Player::Second);
        RecordUpdate::Determined.apply(&mut record);
        RecordUpdate::Stats(MoveStats::new(0, 1, 0)).apply(&mut record);
        assert!(record.is_determined);
        assert_eq!(record.move_num, 1);
        assert!(!record.is_winning_for_mover());
    }

    #[test]
    fn test_record_json_columns() {
        let mut record = EvaluationRecord::new(7, start(), Player::First);
        RecordUpdate::BestMove {
            best_move: None,
            explanation: MoveExplanation::OnlyNonLosingCandidate,
        }
        .apply(&mut record);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["eval"], 1);
        assert_eq!(json["state"], "[[1, 1, 1], [1, 1, 1], [1, 1, 1], [1, 1, 1]]");
        assert_eq!(json["move_explanation"], "only non-losing candidate");
        assert_eq!(json["reachability"]["p2_optimal_p1_wins"], false);

        let back: EvaluationRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
