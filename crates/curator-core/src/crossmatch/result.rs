//! Cross-identification outcomes.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of one record against the reference catalog.
///
/// A collision is not an error: it is handed to external arbitration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CIResult {
    /// No prior object found.
    New,
    /// Exactly one confident match.
    Existing { pgc: i64 },
    /// Ambiguous; may hold zero or several candidates.
    Collision { pgcs: BTreeSet<i64> },
}

impl CIResult {
    pub fn collision(pgcs: impl IntoIterator<Item = i64>) -> Self {
        CIResult::Collision {
            pgcs: pgcs.into_iter().collect(),
        }
    }

    pub fn is_collision(&self) -> bool {
        matches!(self, CIResult::Collision { .. })
    }
}

impl fmt::Display for CIResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CIResult::New => write!(f, "new"),
            CIResult::Existing { pgc } => write!(f, "existing({})", pgc),
            CIResult::Collision { pgcs } => {
                let ids: Vec<String> = pgcs.iter().map(i64::to_string).collect();
                write!(f, "collision([{}])", ids.join(", "))
            }
        }
    }
}

/// Per-outcome totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub new: usize,
    pub existing: usize,
    pub collision: usize,
}

impl OutcomeCounts {
    pub fn record(&mut self, result: &CIResult) {
        match result {
            CIResult::New => self.new += 1,
            CIResult::Existing { .. } => self.existing += 1,
            CIResult::Collision { .. } => self.collision += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.new + self.existing + self.collision
    }

    pub fn merge(&mut self, other: OutcomeCounts) {
        self.new += other.new;
        self.existing += other.existing;
        self.collision += other.collision;
    }
}

impl<'a> FromIterator<&'a CIResult> for OutcomeCounts {
    fn from_iter<I: IntoIterator<Item = &'a CIResult>>(iter: I) -> Self {
        let mut counts = OutcomeCounts::default();
        for result in iter {
            counts.record(result);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_shape() {
        assert_eq!(serde_json::to_value(CIResult::New).unwrap(), json!({"status": "new"}));
        assert_eq!(
            serde_json::to_value(CIResult::collision([7, 3])).unwrap(),
            json!({"status": "collision", "pgcs": [3, 7]})
        );
    }

    #[test]
    fn test_counts() {
        let results = [
            CIResult::New,
            CIResult::Existing { pgc: 1 },
            CIResult::collision([]),
            CIResult::New,
        ];
        let counts: OutcomeCounts = results.iter().collect();
        assert_eq!(
            counts,
            OutcomeCounts {
                new: 2,
                existing: 1,
                collision: 1
            }
        );
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_display() {
        assert_eq!(CIResult::collision([2, 1]).to_string(), "collision([1, 2])");
        assert_eq!(CIResult::Existing { pgc: 5 }.to_string(), "existing(5)");
    }
}
