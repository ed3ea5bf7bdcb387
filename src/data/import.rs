//! Roster ingestion: reads `name,address` CSV exports into the persisted
//! participant list the planner works from.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::model::Participant;

pub const DEFAULT_ROSTER_PATH: &str = "data/roster.json";

#[derive(Debug)]
pub enum ImportError {
    Read(std::io::Error),
    Csv(csv::Error),
    Parse(serde_json::Error),
    Write(std::io::Error),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(err) => write!(f, "failed to read roster file: {err}"),
            Self::Csv(err) => write!(f, "failed to parse roster CSV: {err}"),
            Self::Parse(err) => write!(f, "failed to parse roster JSON: {err}"),
            Self::Write(err) => write!(f, "failed to persist roster: {err}"),
        }
    }
}

impl std::error::Error for ImportError {}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub record_count: usize,
    pub skipped: usize,
    pub source_path: String,
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    name: String,
    #[serde(default)]
    address: Option<String>,
}

/// Imports a `name,address` CSV (header row required) and writes the roster
/// JSON to `output_path`. Rows with a blank name are counted and skipped.
pub fn import_roster_csv(path: &str, output_path: &str) -> Result<ImportReport, ImportError> {
    let raw = fs::read_to_string(path).map_err(ImportError::Read)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let mut participants = Vec::new();
    let mut skipped = 0usize;
    for row in reader.deserialize::<RosterRow>() {
        let row = row.map_err(ImportError::Csv)?;
        if row.name.trim().is_empty() {
            skipped += 1;
            continue;
        }
        let address = row
            .address
            .filter(|address| !address.trim().is_empty())
            .map(|address| address.trim().to_string());
        participants.push(Participant::new(row.name.trim().to_string(), address));
    }

    save_roster(&participants, output_path)?;

    Ok(ImportReport {
        record_count: participants.len(),
        skipped,
        source_path: path.to_string(),
    })
}

pub fn load_roster(path: &str) -> Result<Vec<Participant>, ImportError> {
    let raw = fs::read_to_string(path).map_err(ImportError::Read)?;
    serde_json::from_str(&raw).map_err(ImportError::Parse)
}

pub fn save_roster(participants: &[Participant], path: &str) -> Result<(), ImportError> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(ImportError::Write)?;
        }
    }
    let serialized = serde_json::to_string_pretty(participants).map_err(ImportError::Parse)?;
    fs::write(path, serialized).map_err(ImportError::Write)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_path(name: &str, ext: &str) -> String {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir()
            .join(format!("barhop-{name}-{stamp}.{ext}"))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn imports_csv_and_round_trips_roster() {
        let csv_path = unique_temp_path("roster", "csv");
        let json_path = unique_temp_path("roster", "json");
        fs::write(
            &csv_path,
            "name,address\nAna,Canal St 5\nBen,\n, Orphan Row\nCleo,Dam 1\n",
        )
        .expect("fixture should be written");

        let report = import_roster_csv(&csv_path, &json_path).expect("import succeeds");
        assert_eq!(report.record_count, 3);
        assert_eq!(report.skipped, 1);

        let roster = load_roster(&json_path).expect("roster loads");
        assert_eq!(roster.len(), 3);
        assert_eq!(roster[0].name, "Ana");
        assert!(roster[0].has_address());
        assert!(!roster[1].has_address());

        let _ = fs::remove_file(csv_path);
        let _ = fs::remove_file(json_path);
    }
}
