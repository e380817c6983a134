pub mod normalize;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A percentage figure as delivered by the source: either numeric or free
/// text such as "87.5%" or "N/A".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Percent {
    Number(f64),
    Text(String),
}

impl Percent {
    /// Lenient numeric parse. Trims whitespace and a trailing percent sign;
    /// never panics on malformed input.
    pub fn parse(&self) -> Option<f64> {
        match self {
            Percent::Number(v) if v.is_finite() => Some(*v),
            Percent::Number(_) => None,
            Percent::Text(raw) => {
                let trimmed = raw.trim().trim_end_matches('%').trim();
                trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
            }
        }
    }

    pub fn unknown() -> Self {
        Percent::Text("N/A".to_string())
    }
}

impl Display for Percent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Percent::Number(v) => write!(f, "{v}%"),
            Percent::Text(raw) => write!(f, "{}", raw.trim()),
        }
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::Text("0%".to_string())
    }
}

/// Attendance figures for a single subject within one capture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectRecord {
    pub subject: String,
    pub classes_held: u32,
    pub classes_attended: u32,
    pub percentage: Percent,
}

/// One complete capture of attendance data. Subject order is significant:
/// it is kept exactly as received from the source and drives report order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub subjects: Vec<SubjectRecord>,
    pub overall_percentage: Percent,
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(subjects: Vec<SubjectRecord>, overall_percentage: Percent) -> Self {
        Self {
            subjects,
            overall_percentage,
            captured_at: Utc::now(),
        }
    }

    pub fn find(&self, subject: &str) -> Option<&SubjectRecord> {
        self.subjects.iter().find(|r| r.subject == subject)
    }
}

#[cfg(test)]
mod tests {
    use super::Percent;

    #[test]
    fn parses_suffixed_and_padded_percentages() {
        assert_eq!(Percent::Text("87.5%".to_string()).parse(), Some(87.5));
        assert_eq!(Percent::Text("  92 % ".to_string()).parse(), Some(92.0));
        assert_eq!(Percent::Number(40.0).parse(), Some(40.0));
    }

    #[test]
    fn malformed_percentages_parse_to_none() {
        assert_eq!(Percent::Text("N/A".to_string()).parse(), None);
        assert_eq!(Percent::Text(String::new()).parse(), None);
        assert_eq!(Percent::Number(f64::NAN).parse(), None);
    }
}
