use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One of the two players.
///
/// Player 1 moves on odd plies, player 2 on even plies. A game value is
/// expressed as the player who can force a win, serialized as `1` for player 1
/// and `-1` for player 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::IsVariant)]
pub enum Player {
    First,
    Second,
}

impl Player {
    pub const ALL: [Self; 2] = [Self::First, Self::Second];

    /// Returns the player who moves at the given ply (1-based move number).
    #[must_use]
    pub const fn to_move_at(ply: usize) -> Self {
        if ply % 2 == 1 {
            Self::First
        } else {
            Self::Second
        }
    }

    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    /// Returns the game value this player wants: `+1` for player 1, `-1` for player 2.
    #[must_use]
    pub const fn value(self) -> i8 {
        match self {
            Self::First => 1,
            Self::Second => -1,
        }
    }

    #[must_use]
    pub const fn from_value(value: i8) -> Option<Self> {
        match value {
            1 => Some(Self::First),
            -1 => Some(Self::Second),
            _ => None,
        }
    }

    /// Short label used in column names and logs (`p1` / `p2`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::First => "p1",
            Self::Second => "p2",
        }
    }
}

impl Serialize for Player {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i8(self.value())
    }
}

impl<'de> Deserialize<'de> for Player {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i8::deserialize(deserializer)?;
        Self::from_value(value).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid game value: expected 1 or -1, got {value}"))
        })
    }
}
