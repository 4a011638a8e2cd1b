use serde::{Deserialize, Serialize};
use soluna_engine::Position;

/// Candidates to pick, in order, once the set-cover heuristics run out of
/// forced choices. A JSON array of canonical state strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PickList {
    pub picks: Vec<Position>,
}
