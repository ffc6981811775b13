use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);
    };
}

id_newtype!(RecordId);

impl RecordId {
    /// Position shown to the operator; ids are assigned from zero at import.
    pub fn display_number(self) -> i64 {
        self.0 + 1
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Include,
    Exclude,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Include => "Include",
            Self::Exclude => "Exclude",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown decision '{0}', expected Include or Exclude")]
pub struct ParseDecisionError(pub String);

impl FromStr for Decision {
    type Err = ParseDecisionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("include") {
            Ok(Self::Include)
        } else if trimmed.eq_ignore_ascii_case("exclude") {
            Ok(Self::Exclude)
        } else {
            Err(ParseDecisionError(raw.to_string()))
        }
    }
}

/// One screenable study row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub nct_number: String,
    pub title: String,
    pub summary: String,
    pub conditions: String,
    pub interventions: String,
    pub locations: String,
    pub countries: String,
    pub secondary_countries: String,
    pub decision: Option<Decision>,
    pub label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decision_case_insensitively() {
        assert_eq!("include".parse::<Decision>(), Ok(Decision::Include));
        assert_eq!(" Exclude ".parse::<Decision>(), Ok(Decision::Exclude));
        assert!("maybe".parse::<Decision>().is_err());
    }

    #[test]
    fn decision_serializes_as_stored_text() {
        let json = serde_json::to_string(&Decision::Include).expect("json");
        assert_eq!(json, "\"Include\"");
        assert_eq!(Decision::Exclude.to_string(), "Exclude");
    }

    #[test]
    fn record_id_is_shown_one_based() {
        assert_eq!(RecordId(0).display_number(), 1);
        assert_eq!(RecordId(41).display_number(), 42);
    }
}
