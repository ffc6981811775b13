use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Record;

/// Aggregate screening progress over the whole table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counts {
    pub total: u64,
    pub decided: u64,
    pub included: u64,
    pub excluded: u64,
}

impl Counts {
    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.decided)
    }

    pub fn undecided(&self) -> u64 {
        self.remaining()
    }
}

/// What one render cycle sees: the next undecided record, if any, plus counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Snapshot {
    Active { record: Record, counts: Counts },
    Complete { counts: Counts },
}

impl Snapshot {
    pub fn counts(&self) -> Counts {
        match self {
            Self::Active { counts, .. } | Self::Complete { counts } => *counts,
        }
    }

    pub fn record(&self) -> Option<&Record> {
        match self {
            Self::Active { record, .. } => Some(record),
            Self::Complete { .. } => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

/// Decision text is validated by the receiver, case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub decision: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    pub path: String,
    pub rows: u64,
    pub exported_at: DateTime<Utc>,
}
