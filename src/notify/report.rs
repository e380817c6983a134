use std::fmt::Write;

use crate::diff::{ChangeEvent, Comparison};
use crate::severity::{classify, ParsePolicy, Thresholds};
use crate::snapshot::Snapshot;

/// Renders the full human report: header, per-subject lines in snapshot
/// order, then the change section (or the baseline / no-change line).
/// Data-quality findings go last. Markdown matches what Telegram accepts.
pub fn render_report(
    current: &Snapshot,
    comparison: &Comparison,
    baseline: bool,
    thresholds: Thresholds,
    policy: ParsePolicy,
) -> String {
    let mut out = String::new();
    out.push_str("📊 *ATTENDANCE UPDATE*\n");
    let _ = writeln!(out, "🕒 {}", current.captured_at.format("%d/%m/%Y %H:%M"));
    let _ = writeln!(out, "📈 Overall: *{}*", current.overall_percentage);
    out.push('\n');

    for record in &current.subjects {
        let severity = classify(&record.percentage, thresholds, policy);
        let _ = writeln!(
            out,
            "{} *{}* `{}/{}` {}",
            severity.icon(),
            record.subject,
            record.classes_attended,
            record.classes_held,
            record.percentage
        );
    }

    out.push_str("\n====================\n\n");

    if baseline {
        out.push_str("ℹ️ First run — baseline saved\n");
    } else if comparison.is_quiet() {
        out.push_str("➖ No new classes\n");
    } else {
        out.push_str("🆕 *TODAY'S CLASS UPDATES*\n\n");
        for event in &comparison.events {
            if let ChangeEvent::NewClassesAttended {
                subject,
                classes_added,
                attended_delta,
            } = event
            {
                let _ = writeln!(
                    out,
                    "🟢 *{subject}*\n➕ New: {classes_added} | ✅ Attended {attended_delta}\n"
                );
            }
        }
        for event in &comparison.events {
            if let ChangeEvent::NewClassesAbsent {
                subject,
                classes_added,
            } = event
            {
                let _ = writeln!(out, "🔴 *{subject}*\n➕ New: {classes_added} | ❌ Absent\n");
            }
        }
        for event in &comparison.events {
            if let ChangeEvent::Correction {
                subject,
                before_attended,
                before_held,
                after_attended,
                after_held,
            } = event
            {
                let _ = writeln!(
                    out,
                    "⚠️ *{subject}*\nRecord corrected\n{before_attended}/{before_held} → {after_attended}/{after_held}\n"
                );
            }
        }
        for event in &comparison.events {
            if let ChangeEvent::NewSubject { subject, record } = event {
                let _ = writeln!(
                    out,
                    "🆕 *{subject}*\nNow tracked `{}/{}` {}\n",
                    record.classes_attended, record.classes_held, record.percentage
                );
            }
        }
    }

    for warning in &comparison.warnings {
        let _ = writeln!(
            out,
            "⚠️ Data check: *{}* reports {} attended of {} held",
            warning.subject, warning.classes_attended, warning.classes_held
        );
    }

    out
}

/// Short, explicit failure message, distinct from a normal report. Sent
/// instead of a report, never mixed with one.
pub fn render_failure(reason: &str) -> String {
    format!("🚨 *ATTENDANCE CHECK FAILED*\n{reason}\nStored baseline left untouched.\n")
}

/// Sent only when every configured store rejected the snapshot. The report
/// itself already went out by this point.
pub fn render_storage_notice(failures: &[String]) -> String {
    let mut out = String::from("⚠️ *SNAPSHOT NOT SAVED*\nEvery store rejected the snapshot:\n");
    for failure in failures {
        let _ = writeln!(out, "- {failure}");
    }
    out.push_str("The next run will compare against the previous baseline.\n");
    out
}

#[cfg(test)]
mod tests {
    use super::{render_failure, render_report};
    use crate::diff::{compare, Comparison};
    use crate::severity::{ParsePolicy, Thresholds};
    use crate::snapshot::{Percent, Snapshot, SubjectRecord};

    fn record(subject: &str, held: u32, attended: u32, pct: &str) -> SubjectRecord {
        SubjectRecord {
            subject: subject.to_string(),
            classes_held: held,
            classes_attended: attended,
            percentage: Percent::Text(pct.to_string()),
        }
    }

    fn snapshot(records: Vec<SubjectRecord>) -> Snapshot {
        Snapshot::new(records, Percent::Text("82%".to_string()))
    }

    #[test]
    fn header_comes_before_subject_lines_in_snapshot_order() {
        let current = snapshot(vec![
            record("Zoology", 10, 9, "90%"),
            record("Algebra", 8, 6, "75%"),
        ]);
        let text = render_report(
            &current,
            &Comparison::default(),
            true,
            Thresholds::STANDARD,
            ParsePolicy::Strict,
        );
        let overall = text.find("Overall: *82%*").unwrap();
        let zoology = text.find("*Zoology*").unwrap();
        let algebra = text.find("*Algebra*").unwrap();
        assert!(overall < zoology && zoology < algebra);
        assert!(text.contains("baseline saved"));
    }

    #[test]
    fn quiet_comparison_renders_the_no_change_line() {
        let current = snapshot(vec![record("Maths", 10, 8, "80%")]);
        let text = render_report(
            &current,
            &Comparison::default(),
            false,
            Thresholds::STANDARD,
            ParsePolicy::Strict,
        );
        assert!(text.contains("No new classes"));
        assert!(!text.contains("TODAY'S CLASS UPDATES"));
    }

    #[test]
    fn change_section_groups_event_types_in_contract_order() {
        let previous = snapshot(vec![
            record("Maths", 10, 8, "80%"),
            record("Physics", 10, 8, "80%"),
            record("History", 10, 8, "80%"),
        ]);
        let current = snapshot(vec![
            record("History", 10, 7, "70%"),
            record("Physics", 11, 8, "72%"),
            record("Maths", 12, 10, "83%"),
            record("Drawing", 2, 2, "100%"),
        ]);
        let comparison = compare(&current, Some(&previous));
        let text = render_report(
            &current,
            &comparison,
            false,
            Thresholds::STANDARD,
            ParsePolicy::Strict,
        );

        let attended = text.find("✅ Attended").unwrap();
        let absent = text.find("❌ Absent").unwrap();
        let corrected = text.find("Record corrected").unwrap();
        let tracked = text.find("Now tracked").unwrap();
        assert!(attended < absent && absent < corrected && corrected < tracked);
    }

    #[test]
    fn severity_icons_reflect_thresholds() {
        let current = snapshot(vec![
            record("Good", 10, 10, "95%"),
            record("Warn", 10, 8, "80%"),
            record("Crit", 10, 4, "40%"),
            record("Odd", 10, 4, "N/A"),
        ]);
        let text = render_report(
            &current,
            &Comparison::default(),
            true,
            Thresholds::STANDARD,
            ParsePolicy::Strict,
        );
        assert!(text.contains("🟢 *Good*"));
        assert!(text.contains("🟡 *Warn*"));
        assert!(text.contains("🔴 *Crit*"));
        assert!(text.contains("⚪ *Odd*"));
    }

    #[test]
    fn data_quality_warnings_are_appended() {
        let previous = snapshot(vec![record("Maths", 10, 8, "80%")]);
        let current = snapshot(vec![record("Maths", 10, 12, "120%")]);
        let comparison = compare(&current, Some(&previous));
        let text = render_report(
            &current,
            &comparison,
            false,
            Thresholds::STANDARD,
            ParsePolicy::Strict,
        );
        assert!(text.contains("Data check: *Maths* reports 12 attended of 10 held"));
    }

    #[test]
    fn failure_message_is_distinct_from_a_report() {
        let text = render_failure("could not capture attendance");
        assert!(text.contains("ATTENDANCE CHECK FAILED"));
        assert!(!text.contains("ATTENDANCE UPDATE"));
    }
}
