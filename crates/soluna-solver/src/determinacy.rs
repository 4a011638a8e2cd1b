//! Determinacy propagation.
//!
//! A position is determined when its outcome no longer depends on how anyone
//! plays: it has no moves, or every move leads to a determined position with
//! the same value as its own. Positions are visited deepest ply first, so all
//! children are settled before their parents are looked at.
//!
//! The pass only ever sets the flag. A record that is already determined is
//! left alone.

use soluna_engine::StateSpace;

use crate::{
    pass::{PassError, evaluated_record, evaluated_records},
    record::RecordUpdate,
    store::RecordStore,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeterminacySummary {
    pub positions: usize,
    pub determined: usize,
    /// Records this run marked; the rest of `determined` were already marked.
    pub newly_determined: usize,
}

pub fn propagate_determinacy<S>(
    store: &mut S,
    space: &StateSpace,
) -> Result<DeterminacySummary, PassError>
where
    S: RecordStore + ?Sized,
{
    let mut summary = DeterminacySummary::default();
    for position in space.iter_deepest_first() {
        summary.positions += 1;
        let record = evaluated_record(store, position)?;
        if record.is_determined {
            summary.determined += 1;
            continue;
        }

        let children = evaluated_records(store, &position.moves())?;
        let determined = children
            .iter()
            .all(|child| child.is_determined && child.eval == record.eval);
        if determined {
            store.update(position, RecordUpdate::Determined)?;
            summary.determined += 1;
            summary.newly_determined += 1;
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use soluna_engine::{Player, Position};

    use super::*;
    use crate::{position_evaluator::PositionEvaluator, store::MemoryStore};

    fn position(piles: [&[i32]; 4]) -> Position {
        Position::new(piles).unwrap()
    }

    fn solved(start: &Position) -> (MemoryStore, StateSpace) {
        let space = StateSpace::enumerate([start.clone()]);
        let mut store = MemoryStore::new();
        PositionEvaluator::new(&mut store)
            .evaluate_all(&space)
            .unwrap();
        (store, space)
    }

    #[test]
    fn test_single_line_is_determined() {
        let start = position([&[4], &[4], &[4], &[]]);
        let (mut store, space) = solved(&start);
        let summary = propagate_determinacy(&mut store, &space).unwrap();
        assert_eq!(summary.positions, 2);
        assert_eq!(summary.determined, 2);
        assert!(store.get(&start).unwrap().unwrap().is_determined);
    }

    #[test]
    fn test_mixed_children_are_not_determined() {
        // ply 9, player 1 to move; two moves reach positions player 1 wins,
        // [[6, 3], [3], [], []] is won by player 2.
        let start = position([&[3, 3], &[3], &[3], &[]]);
        let (mut store, space) = solved(&start);
        propagate_determinacy(&mut store, &space).unwrap();

        let record = store.get(&start).unwrap().unwrap();
        assert_eq!(record.eval, Player::First);
        assert!(!record.is_determined);

        let children = store.get_many(&start.moves()).unwrap();
        let values = children.iter().map(|c| c.eval).collect::<Vec<_>>();
        assert!(values.contains(&Player::First) && values.contains(&Player::Second));

        let stuck = position([&[9], &[3], &[], &[]]);
        assert!(store.get(&stuck).unwrap().unwrap().is_determined);
    }

    #[test]
    fn test_propagation_is_monotonic() {
        let start = position([&[2, 2], &[2, 2], &[2, 2], &[]]);
        let (mut store, space) = solved(&start);
        let first = propagate_determinacy(&mut store, &space).unwrap();
        let marked = store
            .records()
            .unwrap()
            .into_iter()
            .filter(|r| r.is_determined)
            .map(|r| r.state)
            .collect::<Vec<_>>();

        let second = propagate_determinacy(&mut store, &space).unwrap();
        assert_eq!(second.newly_determined, 0);
        assert_eq!(second.determined, first.determined);
        for state in marked {
            assert!(store.get(&state).unwrap().unwrap().is_determined);
        }
    }

    #[test]
    fn test_missing_record_is_reported() {
        let start = position([&[4], &[4], &[4], &[]]);
        let space = StateSpace::enumerate([start]);
        let mut store = MemoryStore::new();
        let err = propagate_determinacy(&mut store, &space).unwrap_err();
        assert!(matches!(err, PassError::NotEvaluated { .. }));
    }
}
