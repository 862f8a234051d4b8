//! CSV export of the drill journal.
//!
//! Writes one record per journal entry in chronological order with a header
//! row and a fixed column order matching the journal record layout:
//! `date,plan,drill,side,hold_s,sets,rpe,pain,rom_cm,notes`.

use crate::journal::JsonlJournal;
use crate::{LogEntry, Result};
use std::path::Path;

/// Export every journal entry to a CSV file, replacing any previous export
///
/// Returns the number of records written.
pub fn export_csv(journal: &JsonlJournal, path: &Path) -> Result<usize> {
    let entries = journal.export_all()?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for entry in &entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;

    tracing::info!("Exported {} entries to {:?}", entries.len(), path);
    Ok(entries.len())
}

/// Read an exported CSV back into log entries
///
/// The export is lossless: reading it back reconstructs the same ordered
/// records the journal produced.
pub fn read_csv(path: &Path) -> Result<Vec<LogEntry>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut entries = Vec::new();
    for result in reader.deserialize::<LogEntry>() {
        entries.push(result?);
    }
    Ok(entries)
}
