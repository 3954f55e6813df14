//! Text and JSON summaries of a run.

use crate::analysis::MoleculeTable;
use crate::models::{RunMetadata, RunReport};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// One line per molecule, in table order.
///
/// `Carbon Monoxide :  {'Occurances': [230.538], 'Molecule Tag': 28503, 'Linelist': CDMS}`
pub fn generate_summary_text(table: &MoleculeTable) -> String {
    let mut output = String::new();

    for record in table.iter() {
        output.push_str(&format!("{} :  {}\n", record.name, record));
    }

    output
}

/// Assemble the report for a finished run.
pub fn build_report(table: MoleculeTable, metadata: RunMetadata) -> RunReport {
    RunReport {
        metadata,
        molecules: table.into_records(),
    }
}

/// Generate a JSON report.
pub fn generate_json_report(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a JSON report to a file.
pub fn write_json_report(report: &RunReport, path: &Path) -> Result<()> {
    let content = generate_json_report(report)?;

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report: {}", path.display()))?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogLine, Identification, TableSource};
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_table() -> MoleculeTable {
        let mut table = MoleculeTable::new();
        table.record(
            230.538,
            &Identification::Matched(vec![CatalogLine {
                chemical_name: "Carbon Monoxide".to_string(),
                molecule_tag: Some("28503".to_string()),
                linelist: Some("CDMS".to_string()),
            }]),
        );
        table.record(245.5, &Identification::Unknown);
        table
    }

    fn create_test_metadata() -> RunMetadata {
        RunMetadata {
            run_date: Utc::now(),
            source: TableSource::Catalog,
            datasets: 4,
            peaks_queried: 2,
            molecules: 2,
            duration_seconds: 3.5,
        }
    }

    #[test]
    fn test_generate_summary_text() {
        let text = generate_summary_text(&create_test_table());
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "Carbon Monoxide :  {'Occurances': [230.538], 'Molecule Tag': 28503, 'Linelist': CDMS}"
        );
        assert_eq!(
            lines[1],
            "Unknown :  {'Occurances': [245.5], 'Molecule Tag': None, 'Linelist': None}"
        );
    }

    #[test]
    fn test_summary_of_empty_table() {
        assert!(generate_summary_text(&MoleculeTable::new()).is_empty());
    }

    #[test]
    fn test_generate_json_report() {
        let report = build_report(create_test_table(), create_test_metadata());
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"source\": \"catalog\""));
        assert!(json.contains("\"molecules\""));
        assert!(json.contains("\"Carbon Monoxide\""));
        assert!(json.contains("\"molecule_tag\": null"));
    }

    #[test]
    fn test_write_json_report() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("run.json");
        let report = build_report(create_test_table(), create_test_metadata());

        write_json_report(&report, &path).unwrap();

        let parsed: RunReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.molecules.len(), 2);
        assert_eq!(parsed.metadata.peaks_queried, 2);
        assert_eq!(parsed.metadata.source, TableSource::Catalog);
    }
}
