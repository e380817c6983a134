use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::snapshot::{Percent, Snapshot, SubjectRecord};

/// A snapshot document as it arrives from a source or a store, before
/// normalization. Two envelope shapes are accepted: `subjects` as an ordered
/// list of records carrying their own `subject` field, or `subjects` as a
/// mapping keyed by subject name. Field names vary between producers, hence
/// the aliases.
#[derive(Debug, Deserialize)]
pub struct RawSnapshot {
    #[serde(default)]
    subjects: RawSubjects,
    #[serde(default, alias = "overall")]
    overall_percentage: Percent,
    #[serde(default, alias = "timestamp")]
    captured_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSubjects {
    List(Vec<RawListEntry>),
    Map(serde_json::Map<String, Value>),
}

impl Default for RawSubjects {
    fn default() -> Self {
        RawSubjects::List(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
struct RawListEntry {
    subject: String,
    #[serde(flatten)]
    fields: RawFields,
}

#[derive(Debug, Deserialize)]
struct RawFields {
    #[serde(default, alias = "classes_held", alias = "classesHeld")]
    held: u32,
    #[serde(default, alias = "attended", alias = "classes_attended", alias = "classesAttended")]
    present: Option<u32>,
    #[serde(default, alias = "absent", alias = "absent_count", alias = "absentCount")]
    absent: Option<u32>,
    #[serde(default = "Percent::unknown")]
    percentage: Percent,
}

impl RawFields {
    fn resolve_attended(&self) -> u32 {
        match (self.present, self.absent) {
            (Some(present), _) => present,
            (None, Some(absent)) => self.held.saturating_sub(absent),
            (None, None) => 0,
        }
    }
}

/// Parses a raw snapshot document and normalizes it to the canonical shape.
pub fn parse_document(text: &str) -> Result<Snapshot> {
    let raw: RawSnapshot =
        serde_json::from_str(text).context("snapshot document is not in a recognized shape")?;
    Ok(normalize(raw))
}

/// List shape keeps its order; mapping shape keeps first-seen insertion
/// order. Duplicate subject names keep the first occurrence. A missing
/// capture timestamp defaults to now.
pub fn normalize(raw: RawSnapshot) -> Snapshot {
    let captured_at = raw
        .captured_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now);

    let mut subjects = Vec::new();
    let mut seen = BTreeSet::new();
    match raw.subjects {
        RawSubjects::List(entries) => {
            for entry in entries {
                push_subject(&mut subjects, &mut seen, entry.subject, entry.fields);
            }
        }
        RawSubjects::Map(map) => {
            for (subject, value) in map {
                match serde_json::from_value::<RawFields>(value) {
                    Ok(fields) => push_subject(&mut subjects, &mut seen, subject, fields),
                    Err(err) => warn!(%subject, "skipping malformed subject entry: {err}"),
                }
            }
        }
    }

    Snapshot {
        subjects,
        overall_percentage: raw.overall_percentage,
        captured_at,
    }
}

fn push_subject(
    subjects: &mut Vec<SubjectRecord>,
    seen: &mut BTreeSet<String>,
    subject: String,
    fields: RawFields,
) {
    let trimmed = subject.trim().to_string();
    if trimmed.is_empty() {
        return;
    }
    if !seen.insert(trimmed.clone()) {
        warn!(subject = %trimmed, "duplicate subject in snapshot, keeping first occurrence");
        return;
    }
    subjects.push(SubjectRecord {
        subject: trimmed,
        classes_held: fields.held,
        classes_attended: fields.resolve_attended(),
        percentage: fields.percentage,
    });
}

/// RFC 3339 first, then the legacy `dd/mm/yyyy HH:MM` form older stored
/// documents carry.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%d/%m/%Y %H:%M")
        .ok()
        .map(|naive| naive.and_utc())
}
