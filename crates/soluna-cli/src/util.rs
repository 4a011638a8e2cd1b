use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use serde::Serialize;
use soluna_solver::{
    pass::Pass,
    store::{JsonFileStore, RecordStore},
};

use crate::schema::{overrides::OverrideList, picks::PickList};

/// Writes a report as pretty JSON to `output_path`, or to stdout without one.
pub fn save_json<T>(value: &T, output_path: Option<&Path>) -> anyhow::Result<()>
where
    T: Serialize,
{
    match output_path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            write_json(BufWriter::new(file), value)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote report");
        }
        None => write_json(io::stdout().lock(), value).context("Failed to write report to stdout")?,
    }
    Ok(())
}

fn write_json<W, T>(mut writer: W, value: &T) -> io::Result<()>
where
    W: Write,
    T: Serialize,
{
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Read the manual best-move overrides from a JSON file
pub fn read_override_file<P>(path: P) -> anyhow::Result<OverrideList>
where
    P: AsRef<Path>,
{
    read_json_file("override", path)
}

/// Read the manual set-cover picks from a JSON file
pub fn read_pick_file<P>(path: P) -> anyhow::Result<PickList>
where
    P: AsRef<Path>,
{
    read_json_file("pick list", path)
}

pub fn open_store(path: &Path) -> anyhow::Result<JsonFileStore> {
    JsonFileStore::open(path)
        .with_context(|| format!("Failed to open record store: {}", path.display()))
}

/// Opens an existing store on which `pass` has completed.
pub fn open_solved_store(path: &Path, pass: Pass) -> anyhow::Result<JsonFileStore> {
    let store = open_store(path)?;
    let completed = store
        .completed_passes()
        .with_context(|| format!("Failed to read record store: {}", path.display()))?;
    if !completed.contains_key(&pass) {
        anyhow::bail!(
            "The {pass} pass has not completed on {}; run `soluna solve` first",
            path.display()
        );
    }
    Ok(store)
}
