use serde::{Deserialize, Serialize};

use crate::snapshot::SubjectRecord;

/// One classified difference between two snapshots, scoped to a single
/// subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// Classes were added since the last capture and the attended count
    /// moved up with them.
    NewClassesAttended {
        subject: String,
        classes_added: u32,
        attended_delta: u32,
    },
    /// Classes were added but the attended count did not move up. A
    /// simultaneous downward attended correction folds in here as well,
    /// so the held-increase branch stays two-way.
    NewClassesAbsent { subject: String, classes_added: u32 },
    /// No new classes, but the attended count dropped: the upstream system
    /// corrected its own records.
    Correction {
        subject: String,
        before_attended: u32,
        before_held: u32,
        after_attended: u32,
        after_held: u32,
    },
    /// The subject appears for the first time. No deltas exist yet.
    NewSubject {
        subject: String,
        record: SubjectRecord,
    },
}

impl ChangeEvent {
    pub fn subject(&self) -> &str {
        match self {
            ChangeEvent::NewClassesAttended { subject, .. }
            | ChangeEvent::NewClassesAbsent { subject, .. }
            | ChangeEvent::Correction { subject, .. }
            | ChangeEvent::NewSubject { subject, .. } => subject,
        }
    }
}

/// A record that claims more classes attended than held. Malformed upstream
/// data is reported, never rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataQualityWarning {
    pub subject: String,
    pub classes_attended: u32,
    pub classes_held: u32,
}

/// Output of one snapshot comparison: classified events in current-snapshot
/// order, plus any data-quality findings on the current snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Comparison {
    pub events: Vec<ChangeEvent>,
    pub warnings: Vec<DataQualityWarning>,
}

impl Comparison {
    pub fn is_quiet(&self) -> bool {
        self.events.is_empty()
    }
}
