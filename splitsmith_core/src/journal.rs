//! Append-only drill journal.
//!
//! Completed drills are appended to a JSONL (JSON Lines) file with file
//! locking. Each append opens, locks, writes and releases the file handle
//! within the one call, so an interrupted session never leaves a write
//! handle open. Entries are immutable once written; corrections are new
//! entries.

use crate::{Error, LogEntry, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Sink for persisting completed drill records
pub trait LogSink {
    fn append(&mut self, entry: &LogEntry) -> Result<()>;
}

/// JSONL-based journal with file locking
pub struct JsonlJournal {
    path: PathBuf,
}

impl JsonlJournal {
    /// Create a journal handle for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn append_inner(&self, entry: &LogEntry) -> Result<()> {
        self.ensure_parent_dir()?;

        // Open file for appending
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        // Acquire exclusive lock
        file.lock_exclusive()?;

        // Write entry as one JSON line
        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Appended drill '{}' to journal", entry.drill);
        Ok(())
    }

    /// Most recent `n` entries, newest first
    ///
    /// Strict date-descending order; entries on the same date are ordered by
    /// insertion, later insertions first. Reproducible for identical data.
    pub fn list_recent(&self, n: usize) -> Result<Vec<LogEntry>> {
        let entries = read_entries(&self.path)?;
        let mut indexed: Vec<(usize, LogEntry)> = entries.into_iter().enumerate().collect();
        indexed.sort_by(|a, b| b.1.date.cmp(&a.1.date).then(b.0.cmp(&a.0)));
        Ok(indexed.into_iter().take(n).map(|(_, e)| e).collect())
    }

    /// Every entry, chronological
    ///
    /// Date-ascending; insertion order within a date.
    pub fn export_all(&self) -> Result<Vec<LogEntry>> {
        let mut entries = read_entries(&self.path)?;
        // Stable sort keeps insertion order within a date
        entries.sort_by_key(|e| e.date);
        Ok(entries)
    }
}

impl LogSink for JsonlJournal {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        self.append_inner(entry).map_err(|e| {
            Error::Storage(format!("append to {:?} failed: {}", self.path, e))
        })
    }
}

/// Read all entries from a journal file, in insertion order
///
/// A line that fails to parse is logged and skipped; the rest of the
/// journal still loads.
pub fn read_entries(path: &Path) -> Result<Vec<LogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    // Shared lock for reading
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<LogEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse journal line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} entries from journal", entries.len());
    Ok(entries)
}
