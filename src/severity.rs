use serde::{Deserialize, Serialize};

use crate::snapshot::Percent;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Good,
    Warning,
    Critical,
    Unknown,
}

impl Severity {
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Good => "🟢",
            Severity::Warning => "🟡",
            Severity::Critical => "🔴",
            Severity::Unknown => "⚪",
        }
    }
}

/// Percentage cutoffs separating the severity buckets. Two pairs are in
/// active use across deployments, so this is configuration rather than a
/// constant in the classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Thresholds {
    pub good: f64,
    pub warning: f64,
}

impl Thresholds {
    pub const STANDARD: Thresholds = Thresholds {
        good: 90.0,
        warning: 75.0,
    };
    pub const RELAXED: Thresholds = Thresholds {
        good: 85.0,
        warning: 75.0,
    };
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// What to do with a percentage that does not parse: keep it visibly
/// unknown, or fold it down to zero and let it surface as critical.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParsePolicy {
    #[default]
    Strict,
    Lenient,
}

pub fn classify(percentage: &Percent, thresholds: Thresholds, policy: ParsePolicy) -> Severity {
    let value = match percentage.parse() {
        Some(v) => v,
        None => match policy {
            ParsePolicy::Strict => return Severity::Unknown,
            ParsePolicy::Lenient => 0.0,
        },
    };
    if value >= thresholds.good {
        Severity::Good
    } else if value >= thresholds.warning {
        Severity::Warning
    } else {
        Severity::Critical
    }
}
