use crate::diff::events::{ChangeEvent, Comparison, DataQualityWarning};
use crate::snapshot::Snapshot;

/// Compares the current snapshot against the previous one and classifies
/// every per-subject difference.
///
/// With no previous snapshot (first run) the event list is empty; the caller
/// still persists `current` as the new baseline. Subjects are visited once
/// each, in current-snapshot order, and that order is preserved in the
/// output. Subjects that disappeared from `current` produce no event.
///
/// Pure and deterministic; neither input is mutated.
pub fn compare(current: &Snapshot, previous: Option<&Snapshot>) -> Comparison {
    let mut comparison = Comparison::default();

    for record in &current.subjects {
        if record.classes_attended > record.classes_held {
            comparison.warnings.push(DataQualityWarning {
                subject: record.subject.clone(),
                classes_attended: record.classes_attended,
                classes_held: record.classes_held,
            });
        }
    }

    let Some(previous) = previous else {
        return comparison;
    };

    for record in &current.subjects {
        let Some(old) = previous.find(&record.subject) else {
            comparison.events.push(ChangeEvent::NewSubject {
                subject: record.subject.clone(),
                record: record.clone(),
            });
            continue;
        };

        // Deltas in i64 so pathological captures cannot underflow.
        let held_delta = i64::from(record.classes_held) - i64::from(old.classes_held);
        let attended_delta =
            i64::from(record.classes_attended) - i64::from(old.classes_attended);

        if held_delta > 0 {
            if attended_delta > 0 {
                comparison.events.push(ChangeEvent::NewClassesAttended {
                    subject: record.subject.clone(),
                    classes_added: held_delta as u32,
                    attended_delta: attended_delta as u32,
                });
            } else {
                comparison.events.push(ChangeEvent::NewClassesAbsent {
                    subject: record.subject.clone(),
                    classes_added: held_delta as u32,
                });
            }
        } else if record.classes_attended < old.classes_attended {
            comparison.events.push(ChangeEvent::Correction {
                subject: record.subject.clone(),
                before_attended: old.classes_attended,
                before_held: old.classes_held,
                after_attended: record.classes_attended,
                after_held: record.classes_held,
            });
        }
        // Steady state, or held decreased with attendance intact: silent.
    }

    comparison
}
