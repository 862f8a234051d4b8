#![forbid(unsafe_code)]

//! Core domain model and business logic for the SplitSmith guided
//! stretching system.
//!
//! This crate provides:
//! - Domain types (routines, steps, feedback, log entries)
//! - Routine document loading and schema validation
//! - The guided session runner (countdowns, cues, feedback, emission)
//! - Journal persistence and CSV export

pub mod types;
pub mod error;
pub mod routine;
pub mod config;
pub mod logging;
pub mod feedback;
pub mod session;
pub mod journal;
pub mod csv_export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use routine::{load_file, load_str, validate_sources, DocumentVerdict};
pub use feedback::{InputProvider, ScriptedInput};
pub use session::{run_session, Clock, Notifier, SystemClock};
pub use journal::{JsonlJournal, LogSink};
pub use csv_export::export_csv;
