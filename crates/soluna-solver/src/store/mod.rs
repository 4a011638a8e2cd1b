//! Persistence of evaluation records.
//!
//! The solver talks to its record table only through [`RecordStore`], the
//! interface the original database layer offered: point lookup by state, batch
//! lookup of a set of states, insert-if-absent, field-level update keyed by
//! state, and a full scan. There is no delete.
//!
//! Two implementations are provided:
//!
//! - [`MemoryStore`] - a plain in-process table, used by tests and as the
//!   working copy of every other store
//! - [`JsonFileStore`] - a [`MemoryStore`] loaded from and committed back to a
//!   JSON file
//!
//! All access is synchronous and single-writer. Passes commit once when they
//! finish; a failed pass leaves the backing file as the previous commit left it.

use std::{collections::BTreeMap, io, path::PathBuf};

use chrono::{DateTime, Utc};
use soluna_engine::{Player, Position};

use crate::{
    pass::Pass,
    record::{EvaluationRecord, RecordUpdate},
};

pub use self::{json::*, memory::*};

mod json;
mod memory;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum StoreError {
    #[display("failed to access record store {}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("failed to decode record store {}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display("no record for state {state}")]
    MissingRecord { state: String },
    #[display("record store holds state {state} more than once")]
    DuplicateRecord { state: String },
}

/// The record table.
pub trait RecordStore {
    /// Looks up the record of one state.
    fn get(&self, state: &Position) -> Result<Option<EvaluationRecord>, StoreError>;

    /// Looks up the records of several states at once.
    ///
    /// States without a record are skipped; the others are returned in the
    /// order they were requested.
    fn get_many(&self, states: &[Position]) -> Result<Vec<EvaluationRecord>, StoreError>;

    /// Inserts a fresh record for `state` unless one exists.
    ///
    /// Returns `true` if a record was inserted.
    fn insert_if_absent(&mut self, state: Position, eval: Player) -> Result<bool, StoreError>;

    /// Applies a field-level update to the record of `state`.
    fn update(&mut self, state: &Position, update: RecordUpdate) -> Result<(), StoreError>;

    /// Every record, in id order.
    fn records(&self) -> Result<Vec<EvaluationRecord>, StoreError>;

    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Passes that have completed against this store, with their completion time.
    fn completed_passes(&self) -> Result<BTreeMap<Pass, DateTime<Utc>>, StoreError>;

    fn mark_pass_complete(&mut self, pass: Pass) -> Result<(), StoreError>;

    /// Makes every change so far durable.
    fn commit(&mut self) -> Result<(), StoreError>;
}

