use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use soluna_engine::Position;

/// Manual best-move choices used when every other tie-break is exhausted.
///
/// Stored as a JSON object from state to chosen move, both written as
/// canonical state strings:
///
/// ```json
/// { "[[3, 1], [3, 1], [2, 2], []]": "[[3, 1], [3, 1], [4], []]" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideList {
    pub overrides: BTreeMap<Position, Position>,
}
