use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::StringRecord;

/// Source headers, in the order they map onto `SourceRow` fields.
pub const SOURCE_COLUMNS: [&str; 8] = [
    "NCT Number",
    "Study Title",
    "Brief Summary",
    "Conditions",
    "Interventions",
    "Locations",
    "Countries",
    "MCountries",
];

/// One study as read from the source file, before it has an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRow {
    pub nct_number: String,
    pub title: String,
    pub summary: String,
    pub conditions: String,
    pub interventions: String,
    pub locations: String,
    pub countries: String,
    pub secondary_countries: String,
}

#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    pub rows: Vec<SourceRow>,
    pub ignored_columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported { rows: u64 },
    AlreadyPopulated { rows: u64 },
}

impl ImportOutcome {
    pub fn rows(&self) -> u64 {
        match self {
            Self::Imported { rows } | Self::AlreadyPopulated { rows } => *rows,
        }
    }
}

pub fn read_source(path: &Path) -> Result<SourceTable> {
    if !path.exists() {
        bail!("source file '{}' does not exist", path.display());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open source file '{}'", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header row of '{}'", path.display()))?
        .clone();
    let positions = column_positions(&headers)?;
    let ignored_columns = headers
        .iter()
        .map(clean_header)
        .filter(|name| !SOURCE_COLUMNS.contains(&name.as_str()))
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| {
            format!("failed to parse data row {} of '{}'", line + 1, path.display())
        })?;
        rows.push(source_row(&record, &positions));
    }

    Ok(SourceTable {
        rows,
        ignored_columns,
    })
}

fn column_positions(headers: &StringRecord) -> Result<[usize; 8]> {
    let names: Vec<String> = headers.iter().map(clean_header).collect();
    let mut positions = [0usize; 8];
    for (slot, wanted) in positions.iter_mut().zip(SOURCE_COLUMNS) {
        *slot = names
            .iter()
            .position(|name| name == wanted)
            .with_context(|| format!("source file is missing required column '{wanted}'"))?;
    }
    Ok(positions)
}

fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

fn source_row(record: &StringRecord, positions: &[usize; 8]) -> SourceRow {
    let cell = |idx: usize| record.get(positions[idx]).unwrap_or_default().to_string();
    SourceRow {
        nct_number: cell(0),
        title: cell(1),
        summary: cell(2),
        conditions: cell(3),
        interventions: cell(4),
        locations: cell(5),
        countries: cell(6),
        secondary_countries: cell(7),
    }
}
