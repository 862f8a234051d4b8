//! Core domain types for SplitSmith.
//!
//! This module defines the fundamental types used throughout the system:
//! - Routine documents and their steps
//! - Session selectors and runtime context
//! - Feedback records and durable log entries

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Routine Types
// ============================================================================

/// Which side of the body a drill targets
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// A single drill within a routine (one pose/stretch with its timing)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Step {
    /// Pose or drill name
    #[serde(alias = "pose")]
    pub name: String,

    /// Hold duration per set, in seconds
    #[serde(alias = "duration")]
    pub hold_s: u32,

    /// Coaching cue shown when the drill is announced
    #[serde(default, alias = "description")]
    pub cue: Option<String>,

    /// Side of the body, if the drill is side-specific
    #[serde(default)]
    pub side: Option<Side>,

    /// Number of sets
    #[serde(default = "default_sets")]
    pub sets: u32,

    /// Rest between sets, in seconds (no rest after the final set)
    #[serde(default, alias = "rest")]
    pub rest_s: u32,

    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_sets() -> u32 {
    1
}

/// A validated, ready-to-run routine: ordered steps under one name
///
/// Produced exclusively by the loader; downstream components may assume
/// every invariant (non-empty steps, positive durations, sets >= 1) holds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoutineDefinition {
    pub name: String,
    pub steps: Vec<Step>,
    pub tags: Vec<String>,
}

/// One day's block inside a week-indexed routine document
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DayBlock {
    #[serde(alias = "steps")]
    pub sequence: Vec<Step>,
}

/// A parsed routine document, either flat or week-indexed
///
/// Flat documents carry their steps directly; week-indexed documents map
/// week number -> day letter -> day block and need a [`Selector`] to
/// resolve into a [`RoutineDefinition`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoutineDocument {
    pub name: String,

    #[serde(default, alias = "sequence")]
    pub steps: Vec<Step>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub weeks: BTreeMap<String, BTreeMap<String, DayBlock>>,
}

/// Which week/day variant of a week-indexed routine to run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    pub week: u32,
    pub day: String,
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "week {} day {}", self.week, self.day)
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// Runtime position within an active session
///
/// Owned by the runner for the session's duration and advanced monotonically
/// forward as steps and sets complete. Never persisted; only completed drill
/// records are durable.
#[derive(Clone, Debug)]
pub struct SessionContext {
    pub routine: String,
    pub selector: Option<Selector>,
    pub step_index: usize,
    pub set_index: u32,
}

impl SessionContext {
    pub fn new(routine: impl Into<String>, selector: Option<Selector>) -> Self {
        Self {
            routine: routine.into(),
            selector,
            step_index: 0,
            set_index: 0,
        }
    }
}

/// Subjective feedback gathered once per completed drill
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRecord {
    /// Rating of perceived exertion, 1..=10
    pub rpe: u8,

    /// Any sharp/pinching pain during the drill
    pub pain: bool,

    /// Range-of-motion proxy in cm; lower is deeper (by convention only,
    /// the value is not validated beyond being positive)
    pub rom_cm: Option<f64>,

    pub notes: Option<String>,
}

// ============================================================================
// Log Entry Type
// ============================================================================

/// One durable record per completed drill
///
/// Immutable once appended to the journal; corrections are new entries.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub date: NaiveDate,

    /// Routine identifier the drill was run under
    pub plan: String,

    pub drill: String,
    pub side: Option<Side>,
    pub hold_s: u32,
    pub sets: u32,

    pub rpe: u8,
    pub pain: bool,
    pub rom_cm: Option<f64>,
    pub notes: Option<String>,
}

impl LogEntry {
    /// Combine step metadata, routine identifier, date and feedback into
    /// one record
    pub fn from_drill(
        date: NaiveDate,
        plan: &str,
        step: &Step,
        feedback: &FeedbackRecord,
    ) -> Self {
        Self {
            date,
            plan: plan.to_string(),
            drill: step.name.clone(),
            side: step.side,
            hold_s: step.hold_s,
            sets: step.sets,
            rpe: feedback.rpe,
            pain: feedback.pain,
            rom_cm: feedback.rom_cm,
            notes: feedback.notes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_defaults() {
        let yaml = "name: Lunge\nhold_s: 30";
        let step: Step = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(step.sets, 1);
        assert_eq!(step.rest_s, 0);
        assert!(step.side.is_none());
        assert!(step.cue.is_none());
    }

    #[test]
    fn test_step_field_aliases() {
        let yaml = "pose: Pigeon\nduration: 45\ndescription: square the hips\nrest: 10";
        let step: Step = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(step.name, "Pigeon");
        assert_eq!(step.hold_s, 45);
        assert_eq!(step.cue.as_deref(), Some("square the hips"));
        assert_eq!(step.rest_s, 10);
    }

    #[test]
    fn test_side_wire_format() {
        let step: Step = serde_yaml::from_str("name: Lunge\nhold_s: 30\nside: left").unwrap();
        assert_eq!(step.side, Some(Side::Left));
        assert_eq!(Side::Right.to_string(), "right");
    }

    #[test]
    fn test_log_entry_from_drill() {
        let step = Step {
            name: "Lunge".into(),
            hold_s: 30,
            cue: None,
            side: Some(Side::Left),
            sets: 2,
            rest_s: 10,
            tags: vec![],
        };
        let feedback = FeedbackRecord {
            rpe: 6,
            pain: false,
            rom_cm: None,
            notes: None,
        };
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();

        let entry = LogEntry::from_drill(date, "Split A", &step, &feedback);

        assert_eq!(entry.plan, "Split A");
        assert_eq!(entry.drill, "Lunge");
        assert_eq!(entry.side, Some(Side::Left));
        assert_eq!(entry.hold_s, 30);
        assert_eq!(entry.sets, 2);
        assert_eq!(entry.rpe, 6);
        assert!(!entry.pain);
        assert!(entry.rom_cm.is_none());
    }
}
