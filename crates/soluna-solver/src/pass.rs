//! Solver passes and their ordering preconditions.
//!
//! Each pass reads what earlier passes wrote to the store. Completed passes are
//! recorded in the store itself, so a pass started against a store that lacks
//! one of its prerequisites fails with [`PassError::PreconditionNotMet`]
//! instead of silently reading missing columns.

use serde::{Deserialize, Serialize};
use soluna_engine::Position;

use crate::{
    record::EvaluationRecord,
    store::{RecordStore, StoreError},
};

/// A pass that writes to the record store, in dependency order.
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
    derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
pub enum Pass {
    /// Backward induction over every reachable position.
    #[display("evaluate")]
    Evaluate,
    #[display("determinacy")]
    Determinacy,
    /// Move counts, win/loss percentages and parent counts.
    #[display("statistics")]
    Statistics,
    /// Best-move selection (with the shadowing fixed point).
    #[display("strategy")]
    Strategy,
    /// Reachability flags for the selected strategy.
    #[display("reachability")]
    Reachability,
}

impl Pass {
    pub const ALL: [Self; 5] = [
        Self::Evaluate,
        Self::Determinacy,
        Self::Statistics,
        Self::Strategy,
        Self::Reachability,
    ];

    /// Passes whose output this pass reads.
    #[must_use]
    pub const fn requires(self) -> &'static [Pass] {
        match self {
            Self::Evaluate => &[],
            Self::Determinacy | Self::Statistics => &[Self::Evaluate],
            Self::Strategy => &[Self::Evaluate, Self::Determinacy, Self::Statistics],
            Self::Reachability => &[Self::Strategy],
        }
    }

    /// Fails unless every prerequisite of this pass is recorded in `store`.
    pub fn check_preconditions<S>(self, store: &S) -> Result<(), PassError>
    where
        S: RecordStore + ?Sized,
    {
        let completed = store.completed_passes()?;
        match self.requires().iter().find(|p| !completed.contains_key(p)) {
            Some(&requires) => Err(PassError::PreconditionNotMet {
                pass: self,
                requires,
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum PassError {
    #[display("record store failure: {_0}")]
    Store(StoreError),
    #[display("the {pass} pass requires the {requires} pass to have completed")]
    #[from(ignore)]
    PreconditionNotMet { pass: Pass, requires: Pass },
    #[display("position {state} has not been evaluated")]
    #[from(ignore)]
    NotEvaluated { state: String },
    #[display("position {state} has no move statistics")]
    #[from(ignore)]
    MissingStats { state: String },
    #[display("override for {state} does not name a reachable position and one of its moves")]
    #[from(ignore)]
    UnknownOverride { state: String },
}

/// Fetches the record of `state`, which an earlier pass must have written.
pub(crate) fn evaluated_record<S>(store: &S, state: &Position) -> Result<EvaluationRecord, PassError>
where
    S: RecordStore + ?Sized,
{
    store
        .get(state)?
        .ok_or_else(|| PassError::NotEvaluated { state: state.key() })
}

/// Fetches the records of every state in `states`, in the same order.
pub(crate) fn evaluated_records<S>(
    store: &S,
    states: &[Position],
) -> Result<Vec<EvaluationRecord>, PassError>
where
    S: RecordStore + ?Sized,
{
    let records = store.get_many(states)?;
    if records.len() == states.len() {
        return Ok(records);
    }
    let missing = states
        .iter()
        .find(|state| records.iter().all(|r| &r.state != *state))
        .map_or_else(String::new, Position::key);
    Err(PassError::NotEvaluated { state: missing })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_pass_names() {
        for pass in Pass::ALL {
            assert_eq!(pass.to_string().parse::<Pass>().unwrap(), pass);
        }
        assert_eq!("Strategy".parse::<Pass>().unwrap(), Pass::Strategy);
    }

    #[test]
    fn test_requirements_come_earlier() {
        for pass in Pass::ALL {
            assert!(pass.requires().iter().all(|&r| r < pass));
        }
    }

    #[test]
    fn test_precondition_check() {
        let mut store = MemoryStore::new();
        assert!(Pass::Evaluate.check_preconditions(&store).is_ok());

        let err = Pass::Strategy.check_preconditions(&store).unwrap_err();
        assert!(matches!(
            err,
            PassError::PreconditionNotMet {
                pass: Pass::Strategy,
                requires: Pass::Evaluate
            }
        ));
        assert_eq!(
            err.to_string(),
            "the strategy pass requires the evaluate pass to have completed"
        );

        store.mark_pass_complete(Pass::Evaluate).unwrap();
        store.mark_pass_complete(Pass::Determinacy).unwrap();
        let err = Pass::Strategy.check_preconditions(&store).unwrap_err();
        assert!(matches!(
            err,
            PassError::PreconditionNotMet {
                requires: Pass::Statistics,
                ..
            }
        ));
    }
}
