//! Move statistics: how many moves a position has, how many of them keep the
//! mover winning, and how many positions lead to it.

use std::collections::HashMap;

use soluna_engine::{Position, StateSpace};

use crate::{
    pass::{PassError, evaluated_record, evaluated_records},
    record::{MoveStats, RecordUpdate},
    store::RecordStore,
};

/// Counts the distinct parents of every position in `space`.
///
/// Starting positions have no parents and are absent from the map.
#[must_use]
pub fn count_parents(space: &StateSpace) -> HashMap<Position, usize> {
    let mut parents = HashMap::new();
    for position in space.iter() {
        for child in position.moves() {
            *parents.entry(child).or_insert(0) += 1;
        }
    }
    parents
}

/// Writes [`MoveStats`] for every position of `space`.
///
/// Returns the number of records updated.
pub fn compute_move_stats<S>(store: &mut S, space: &StateSpace) -> Result<usize, PassError>
where
    S: RecordStore + ?Sized,
{
    let parents = count_parents(space);
    let mut updated = 0;
    for position in space.iter() {
        let record = evaluated_record(store, position)?;
        let children = evaluated_records(store, &position.moves())?;

        let mover = position.player_to_move();
        let winning = children.iter().filter(|c| c.eval == mover).count();
        let losing = children.len() - winning;
        let total_parents = parents.get(position).copied().unwrap_or(0);

        store.update(
            &record.state,
            RecordUpdate::Stats(MoveStats::new(winning, losing, total_parents)),
        )?;
        updated += 1;
    }
    Ok(updated)
}
