use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::diff::{ChangeEvent, Comparison};
use crate::severity::{classify, ParsePolicy, Severity, Thresholds};
use crate::snapshot::Snapshot;

pub fn render_snapshot_table(
    snapshot: &Snapshot,
    thresholds: Thresholds,
    policy: ParsePolicy,
) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Subject", "Attended", "Held", "Percentage", "Severity"]);

    for record in &snapshot.subjects {
        let severity = classify(&record.percentage, thresholds, policy);
        let label = format!("{severity:?}").to_uppercase();
        let severity_cell = match severity {
            Severity::Good => Cell::new(label).fg(Color::Green),
            Severity::Warning => Cell::new(label).fg(Color::Yellow),
            Severity::Critical => Cell::new(label).fg(Color::Red),
            Severity::Unknown => Cell::new(label).fg(Color::Grey),
        };
        table.add_row(Row::from(vec![
            Cell::new(&record.subject),
            Cell::new(record.classes_attended.to_string()),
            Cell::new(record.classes_held.to_string()),
            Cell::new(record.percentage.to_string()),
            severity_cell,
        ]));
    }

    let mut out = table.to_string();
    out.push_str(&format!(
        "\nOverall: {}  (captured {})",
        snapshot.overall_percentage,
        snapshot.captured_at.format("%d/%m/%Y %H:%M")
    ));
    out
}

pub fn render_events_table(comparison: &Comparison) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Subject", "Change", "Details"]);

    for event in &comparison.events {
        let (kind, details) = match event {
            ChangeEvent::NewClassesAttended {
                classes_added,
                attended_delta,
                ..
            } => (
                "attended",
                format!("+{classes_added} held, +{attended_delta} attended"),
            ),
            ChangeEvent::NewClassesAbsent { classes_added, .. } => {
                ("absent", format!("+{classes_added} held, attendance flat"))
            }
            ChangeEvent::Correction {
                before_attended,
                before_held,
                after_attended,
                after_held,
                ..
            } => (
                "corrected",
                format!("{before_attended}/{before_held} -> {after_attended}/{after_held}"),
            ),
            ChangeEvent::NewSubject { record, .. } => (
                "new subject",
                format!(
                    "{}/{} {}",
                    record.classes_attended, record.classes_held, record.percentage
                ),
            ),
        };
        table.add_row(vec![event.subject().to_string(), kind.to_string(), details]);
    }

    let mut out = table.to_string();
    if !comparison.warnings.is_empty() {
        out.push('\n');
        for warning in &comparison.warnings {
            out.push_str(&format!(
                "\ndata check: {} reports {} attended of {} held",
                warning.subject, warning.classes_attended, warning.classes_held
            ));
        }
    }
    out
}
