//! Post-drill feedback collection.
//!
//! Prompt order is fixed: RPE, pain flag, range-of-motion proxy, free-text
//! note. Invalid input is a local matter: the offending prompt repeats with
//! the constraint spelled out, and nothing short of an I/O failure from the
//! provider escapes this module.

use crate::{Error, FeedbackRecord, Result};
use std::collections::VecDeque;
use std::io;

/// Synchronous line-oriented input, substitutable in tests
pub trait InputProvider {
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;
}

/// Scripted provider returning canned answers in order
///
/// Runs the session state machine deterministically in tests without a
/// terminal. Answering past the end of the script is an I/O error.
pub struct ScriptedInput {
    answers: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<S: Into<String>>(answers: impl IntoIterator<Item = S>) -> Self {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }
}

impl InputProvider for ScriptedInput {
    fn read_line(&mut self, _prompt: &str) -> io::Result<String> {
        self.answers.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "scripted input exhausted")
        })
    }
}

/// Collect one feedback record for a completed drill
pub fn collect<I: InputProvider>(input: &mut I, drill: &str) -> Result<FeedbackRecord> {
    let rpe = prompt_until(input, &format!("{}: RPE (1-10)", drill), parse_rpe)?;
    let pain = prompt_until(input, "Any pain (sharp/pinching)? [y/N]", parse_pain)?;
    let rom_cm = prompt_until(
        input,
        "ROM proxy (cm), lower is deeper; blank to skip",
        parse_rom,
    )?;

    let raw = input.read_line("Notes (optional)")?;
    let notes = match raw.trim() {
        "" => None,
        text => Some(text.to_string()),
    };

    Ok(FeedbackRecord {
        rpe,
        pain,
        rom_cm,
        notes,
    })
}

/// Re-prompt until `parse` accepts the trimmed input
fn prompt_until<I, T, F>(input: &mut I, prompt: &str, parse: F) -> Result<T>
where
    I: InputProvider,
    F: Fn(&str) -> Result<T>,
{
    let mut attempt = prompt.to_string();
    loop {
        let raw = input.read_line(&attempt)?;
        match parse(raw.trim()) {
            Ok(value) => return Ok(value),
            Err(Error::InvalidFeedback(msg)) => {
                tracing::debug!("Rejected feedback input '{}': {}", raw.trim(), msg);
                attempt = format!("{}. {}", msg, prompt);
            }
            Err(other) => return Err(other),
        }
    }
}

fn parse_rpe(raw: &str) -> Result<u8> {
    let rating: u8 = raw
        .parse()
        .map_err(|_| Error::InvalidFeedback(format!("RPE must be an integer, got '{}'", raw)))?;
    if !(1..=10).contains(&rating) {
        return Err(Error::InvalidFeedback(format!(
            "RPE must be between 1 and 10, got {}",
            rating
        )));
    }
    Ok(rating)
}

fn parse_pain(raw: &str) -> Result<bool> {
    match raw.to_lowercase().as_str() {
        // Empty input defaults to no pain
        "" | "n" | "no" | "false" => Ok(false),
        "y" | "yes" | "true" => Ok(true),
        other => Err(Error::InvalidFeedback(format!(
            "Answer y or n, got '{}'",
            other
        ))),
    }
}

/// Blank means "not recorded", not zero. Lower value = deeper stretch, but
/// that is a convention of the measurement, not something we validate.
fn parse_rom(raw: &str) -> Result<Option<f64>> {
    if raw.is_empty() {
        return Ok(None);
    }
    let rom: f64 = raw.parse().map_err(|_| {
        Error::InvalidFeedback(format!("ROM must be a number in cm, got '{}'", raw))
    })?;
    if !rom.is_finite() || rom <= 0.0 {
        return Err(Error::InvalidFeedback(format!(
            "ROM must be a positive number, got {}",
            raw
        )));
    }
    Ok(Some(rom))
}
