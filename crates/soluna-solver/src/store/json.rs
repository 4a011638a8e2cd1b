use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use soluna_engine::{Player, Position};

use crate::{
    pass::Pass,
    record::{EvaluationRecord, RecordUpdate},
};

use super::{MemoryStore, RecordStore, StoreError, memory::StoreContents};

/// A record table persisted as a single JSON file.
///
/// The file is read once on [`JsonFileStore::open`]; all reads and writes go to
/// an in-memory copy until [`RecordStore::commit`] rewrites the file. The new
/// contents are written to a sibling temporary file first and then renamed
/// over the old one, so an interrupted commit never leaves a truncated store.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    table: MemoryStore,
}

impl JsonFileStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub fn open<P>(path: P) -> Result<Self, StoreError>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();
        let table = match File::open(&path) {
            Ok(file) => {
                let contents: StoreContents = serde_json::from_reader(BufReader::new(file))
                    .map_err(|source| StoreError::Json {
                        path: path.clone(),
                        source,
                    })?;
                let table = MemoryStore::from_contents(contents)?;
                tracing::debug!(
                    path = %path.display(),
                    records = table.len()?,
                    "opened record store"
                );
                table
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "creating new record store");
                MemoryStore::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self { path, table })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let file = File::create(&tmp_path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.table.to_contents()).map_err(|source| {
            StoreError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        writer.write_all(b"\n").map_err(io_err)?;
        writer.flush().map_err(io_err)?;
        drop(writer);

        fs::rename(&tmp_path, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn get(&self, state: &Position) -> Result<Option<EvaluationRecord>, StoreError> {
        self.table.get(state)
    }

    fn get_many(&self, states: &[Position]) -> Result<Vec<EvaluationRecord>, StoreError> {
        self.table.get_many(states)
    }

    fn insert_if_absent(&mut self, state: Position, eval: Player) -> Result<bool, StoreError> {
        self.table.insert_if_absent(state, eval)
    }

    fn update(&mut self, state: &Position, update: RecordUpdate) -> Result<(), StoreError> {
        self.table.update(state, update)
    }

    fn records(&self) -> Result<Vec<EvaluationRecord>, StoreError> {
        self.table.records()
    }

    fn len(&self) -> Result<usize, StoreError> {
        self.table.len()
    }

    fn completed_passes(&self) -> Result<BTreeMap<Pass, DateTime<Utc>>, StoreError> {
        self.table.completed_passes()
    }

    fn mark_pass_complete(&mut self, pass: Pass) -> Result<(), StoreError> {
        self.table.mark_pass_complete(pass)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.write_file()?;
        tracing::debug!(
            path = %self.path.display(),
            records = self.table.len()?,
            "committed record store"
        );
        Ok(())
    }
}
