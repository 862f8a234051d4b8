//! Routine document loading, schema validation and selector resolution.
//!
//! Documents are YAML (JSON parses through the same path). Validation is
//! schema-first over the raw parsed value: every required key must be
//! present with the right primitive type, checked element-wise over arrays,
//! and the first violation fails the whole document. Only then is the value
//! deserialized into typed structs, so downstream code operates on a
//! guaranteed-valid [`RoutineDefinition`].

use crate::{Error, Result, RoutineDefinition, RoutineDocument, Selector};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Load and validate a routine document from a string source
///
/// `source_id` identifies the document in error messages (typically the
/// file path).
pub fn load_str(source: &str, source_id: &str) -> Result<RoutineDocument> {
    let mut value: Value =
        serde_yaml::from_str(source).map_err(|cause| Error::MalformedSource {
            source_id: source_id.to_string(),
            cause,
        })?;

    normalize_week_keys(&mut value);

    check_document(&value).map_err(|detail| Error::SchemaViolation {
        source_id: source_id.to_string(),
        detail,
    })?;

    let document: RoutineDocument =
        serde_yaml::from_value(value).map_err(|e| Error::SchemaViolation {
            source_id: source_id.to_string(),
            detail: e.to_string(),
        })?;

    tracing::debug!(
        "Loaded routine '{}' from {} ({} flat steps, {} weeks)",
        document.name,
        source_id,
        document.steps.len(),
        document.weeks.len()
    );

    Ok(document)
}

/// Load and validate a routine document from a file
pub fn load_file(path: &Path) -> Result<RoutineDocument> {
    let source = std::fs::read_to_string(path)?;
    load_str(&source, &path.display().to_string())
}

/// Per-document outcome of a batch validation run
#[derive(Debug)]
pub struct DocumentVerdict {
    pub source_id: String,
    pub result: Result<()>,
}

/// Validate many routine documents independently
///
/// Never short-circuits across documents: every input gets a verdict even
/// when earlier ones fail. Within one document the structural check still
/// stops at the first violation.
pub fn validate_sources(
    docs: impl IntoIterator<Item = (String, String)>,
) -> Vec<DocumentVerdict> {
    docs.into_iter()
        .map(|(source_id, source)| {
            let result = load_str(&source, &source_id).map(|_| ());
            DocumentVerdict { source_id, result }
        })
        .collect()
}

impl RoutineDocument {
    /// Resolve this document to the concrete sequence a session will run
    ///
    /// Flat documents resolve directly (any selector is ignored). Week-indexed
    /// documents require a selector, and a missing week or day is fatal for
    /// the whole session before any countdown starts.
    pub fn resolve(&self, selector: Option<&Selector>) -> Result<RoutineDefinition> {
        if self.weeks.is_empty() {
            return Ok(RoutineDefinition {
                name: self.name.clone(),
                steps: self.steps.clone(),
                tags: self.tags.clone(),
            });
        }

        let selector = selector.ok_or_else(|| {
            Error::SelectorResolution(format!(
                "'{}' is week-indexed; a week/day selector is required",
                self.name
            ))
        })?;

        let week = self.weeks.get(&selector.week.to_string()).ok_or_else(|| {
            Error::SelectorResolution(format!(
                "'{}' does not define week {} (available weeks: {})",
                self.name,
                selector.week,
                self.weeks.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })?;

        let block = week.get(&selector.day).ok_or_else(|| {
            Error::SelectorResolution(format!(
                "'{}' week {} does not define day {} (available days: {})",
                self.name,
                selector.week,
                selector.day,
                week.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })?;

        Ok(RoutineDefinition {
            name: self.name.clone(),
            steps: block.sequence.clone(),
            tags: self.tags.clone(),
        })
    }
}

// ============================================================================
// Schema check
// ============================================================================

type SchemaCheck = std::result::Result<(), String>;

/// YAML permits integer mapping keys; week numbers are looked up as strings
fn normalize_week_keys(value: &mut Value) {
    let Value::Mapping(root) = value else { return };

    let weeks_key = Value::String("weeks".to_string());
    let weeks = match root.get(&weeks_key) {
        Some(Value::Mapping(m)) => m.clone(),
        _ => return,
    };

    let mut normalized = Mapping::new();
    for (k, v) in &weeks {
        let key = match k {
            Value::Number(n) => Value::String(n.to_string()),
            other => other.clone(),
        };
        normalized.insert(key, v.clone());
    }
    root.insert(weeks_key, Value::Mapping(normalized));
}

fn check_document(value: &Value) -> SchemaCheck {
    if !value.is_mapping() {
        return Err("document root must be a mapping".to_string());
    }

    let name = require_key(value, "name")?;
    let name = name
        .as_str()
        .ok_or_else(|| "`name` must be a string".to_string())?;
    if name.trim().is_empty() {
        return Err("`name` must be non-empty".to_string());
    }

    if value.get("weeks").is_some() {
        check_weekly(value)
    } else {
        check_flat(value)
    }
}

/// Flat shape: `name`, `steps`/`sequence`, `tags` all required; every step
/// requires a pose identifier, a duration and a description/cue.
fn check_flat(value: &Value) -> SchemaCheck {
    let steps = value
        .get("steps")
        .or_else(|| value.get("sequence"))
        .ok_or_else(|| "missing required field `steps`".to_string())?;
    let steps = steps
        .as_sequence()
        .ok_or_else(|| "`steps` must be a sequence".to_string())?;
    if steps.is_empty() {
        return Err("`steps` must contain at least one step".to_string());
    }
    for (i, step) in steps.iter().enumerate() {
        check_step(step, &format!("steps[{}]", i), true)?;
    }

    let tags = require_key(value, "tags")?;
    let tags = tags
        .as_sequence()
        .ok_or_else(|| "`tags` must be a sequence".to_string())?;
    for (i, tag) in tags.iter().enumerate() {
        if !tag.is_string() {
            return Err(format!("tags[{}]: must be a string", i));
        }
    }

    Ok(())
}

/// Week-indexed shape: `weeks` maps week number -> day letter -> day block;
/// step cues are optional here.
fn check_weekly(value: &Value) -> SchemaCheck {
    let weeks = value
        .get("weeks")
        .and_then(Value::as_mapping)
        .ok_or_else(|| "`weeks` must be a mapping".to_string())?;
    if weeks.is_empty() {
        return Err("`weeks` must contain at least one week".to_string());
    }

    for (week_key, days) in weeks {
        let week = week_key
            .as_str()
            .ok_or_else(|| "week keys must be numbers or strings".to_string())?;
        let days = days
            .as_mapping()
            .ok_or_else(|| format!("weeks.{}: must be a mapping of days", week))?;
        if days.is_empty() {
            return Err(format!("weeks.{}: must contain at least one day", week));
        }

        for (day_key, block) in days {
            let day = day_key
                .as_str()
                .ok_or_else(|| format!("weeks.{}: day keys must be strings", week))?;
            let path = format!("weeks.{}.{}", week, day);

            let sequence = block
                .get("sequence")
                .or_else(|| block.get("steps"))
                .ok_or_else(|| format!("{}: missing required field `sequence`", path))?;
            let sequence = sequence
                .as_sequence()
                .ok_or_else(|| format!("{}: `sequence` must be a sequence", path))?;
            if sequence.is_empty() {
                return Err(format!("{}: `sequence` must contain at least one step", path));
            }

            for (i, step) in sequence.iter().enumerate() {
                check_step(step, &format!("{}.sequence[{}]", path, i), false)?;
            }
        }
    }

    if let Some(tags) = value.get("tags") {
        let tags = tags
            .as_sequence()
            .ok_or_else(|| "`tags` must be a sequence".to_string())?;
        for (i, tag) in tags.iter().enumerate() {
            if !tag.is_string() {
                return Err(format!("tags[{}]: must be a string", i));
            }
        }
    }

    Ok(())
}

fn check_step(step: &Value, path: &str, require_cue: bool) -> SchemaCheck {
    if !step.is_mapping() {
        return Err(format!("{}: must be a mapping", path));
    }

    let name = step
        .get("pose")
        .or_else(|| step.get("name"))
        .ok_or_else(|| format!("{}: missing required field `pose`", path))?;
    let name = name
        .as_str()
        .ok_or_else(|| format!("{}: `pose` must be a string", path))?;
    if name.trim().is_empty() {
        return Err(format!("{}: `pose` must be non-empty", path));
    }

    let duration = step
        .get("duration")
        .or_else(|| step.get("hold_s"))
        .ok_or_else(|| format!("{}: missing required field `duration`", path))?;
    check_positive_u32(duration, path, "duration")?;

    let cue = step.get("description").or_else(|| step.get("cue"));
    match cue {
        Some(v) if !v.is_string() => {
            return Err(format!("{}: `description` must be a string", path));
        }
        None if require_cue => {
            return Err(format!("{}: missing required field `description`", path));
        }
        _ => {}
    }

    if let Some(side) = step.get("side") {
        match side.as_str() {
            Some("left") | Some("right") => {}
            _ => return Err(format!("{}: `side` must be \"left\" or \"right\"", path)),
        }
    }

    if let Some(sets) = step.get("sets") {
        check_positive_u32(sets, path, "sets")?;
    }

    if let Some(rest) = step.get("rest_s").or_else(|| step.get("rest")) {
        let n = rest
            .as_u64()
            .ok_or_else(|| format!("{}: `rest_s` must be a non-negative integer", path))?;
        if u32::try_from(n).is_err() {
            return Err(format!("{}: `rest_s` is out of range", path));
        }
    }

    if let Some(tags) = step.get("tags") {
        let tags = tags
            .as_sequence()
            .ok_or_else(|| format!("{}: `tags` must be a sequence", path))?;
        if tags.iter().any(|t| !t.is_string()) {
            return Err(format!("{}: `tags` must contain only strings", path));
        }
    }

    Ok(())
}

fn check_positive_u32(value: &Value, path: &str, field: &str) -> SchemaCheck {
    let n = value
        .as_u64()
        .filter(|n| *n > 0)
        .ok_or_else(|| format!("{}: `{}` must be a positive integer", path, field))?;
    if u32::try_from(n).is_err() {
        return Err(format!("{}: `{}` is out of range", path, field));
    }
    Ok(())
}

fn require_key<'a>(value: &'a Value, key: &str) -> std::result::Result<&'a Value, String> {
    value
        .get(key)
        .ok_or_else(|| format!("missing required field `{}`", key))
}
