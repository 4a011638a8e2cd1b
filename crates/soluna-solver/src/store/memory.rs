use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soluna_engine::{Player, Position};

use crate::{
    pass::Pass,
    record::{EvaluationRecord, RecordUpdate},
};

use super::{RecordStore, StoreError};

/// Serialized layout of a record table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct StoreContents {
    pub(super) passes: BTreeMap<Pass, DateTime<Utc>>,
    pub(super) next_id: u32,
    pub(super) records: Vec<EvaluationRecord>,
}

/// An in-process record table.
///
/// Records are kept in insertion order with a state index beside them, so ids
/// are dense and [`RecordStore::records`] needs no sort.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    passes: BTreeMap<Pass, DateTime<Utc>>,
    next_id: u32,
    records: Vec<EvaluationRecord>,
    index: HashMap<Position, usize>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            passes: BTreeMap::new(),
            next_id: 1,
            records: vec![],
            index: HashMap::new(),
        }
    }

    pub(super) fn from_contents(contents: StoreContents) -> Result<Self, StoreError> {
        let StoreContents {
            passes,
            next_id,
            mut records,
        } = contents;
        records.sort_by_key(|r| r.id);

        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if index.insert(record.state.clone(), i).is_some() {
                return Err(StoreError::DuplicateRecord {
                    state: record.state.key(),
                });
            }
        }

        let next_id = records
            .last()
            .map_or(next_id, |last| next_id.max(last.id + 1))
            .max(1);
        Ok(Self {
            passes,
            next_id,
            records,
            index,
        })
    }

    pub(super) fn to_contents(&self) -> StoreContents {
        StoreContents {
            passes: self.passes.clone(),
            next_id: self.next_id,
            records: self.records.clone(),
        }
    }

    fn record_mut(&mut self, state: &Position) -> Result<&mut EvaluationRecord, StoreError> {
        let i = *self
            .index
            .get(state)
            .ok_or_else(|| StoreError::MissingRecord { state: state.key() })?;
        Ok(&mut self.records[i])
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, state: &Position) -> Result<Option<EvaluationRecord>, StoreError> {
        Ok(self.index.get(state).map(|&i| self.records[i].clone()))
    }

    fn get_many(&self, states: &[Position]) -> Result<Vec<EvaluationRecord>, StoreError> {
        Ok(states
            .iter()
            .filter_map(|state| self.index.get(state))
            .map(|&i| self.records[i].clone())
            .collect())
    }

    fn insert_if_absent(&mut self, state: Position, eval: Player) -> Result<bool, StoreError> {
        if self.index.contains_key(&state) {
            return Ok(false);
        }
        let record = EvaluationRecord::new(self.next_id, state.clone(), eval);
        self.next_id += 1;
        self.index.insert(state, self.records.len());
        self.records.push(record);
        Ok(true)
    }

    fn update(&mut self, state: &Position, update: RecordUpdate) -> Result<(), StoreError> {
        update.apply(self.record_mut(state)?);
        Ok(())
    }

    fn records(&self) -> Result<Vec<EvaluationRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records.len())
    }

    fn completed_passes(&self) -> Result<BTreeMap<Pass, DateTime<Utc>>, StoreError> {
        Ok(self.passes.clone())
    }

    fn mark_pass_complete(&mut self, pass: Pass) -> Result<(), StoreError> {
        self.passes.insert(pass, Utc::now());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}
