//! On-disk molecule cache.
//!
//! The cache is a CSV snapshot of the molecule table, one row per
//! molecule, laid out the way pandas `DataFrame.to_csv` writes it:
//!
//! ```text
//! ,Occurances,Molecule Tag,Linelist
//! Carbon Monoxide,"[230.538, 230.538]",28503,CDMS
//! Unknown,[245.0007],,
//! ```
//!
//! The column spelling is part of the format; files written by earlier
//! tooling load unchanged.

use crate::analysis::MoleculeTable;
use crate::models::MoleculeRecord;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of consulting the cache before computing.
#[derive(Debug)]
pub enum CacheLookup {
    /// A cache file exists; the compute path is skipped.
    Hit(MoleculeTable),
    /// No cache; detection and catalog queries must run.
    Miss,
}

/// A single cache row.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRow {
    #[serde(rename = "")]
    name: String,
    #[serde(rename = "Occurances")]
    occurrences: String,
    #[serde(rename = "Molecule Tag")]
    molecule_tag: Option<String>,
    #[serde(rename = "Linelist")]
    linelist: Option<String>,
}

/// Handle on the cache file.
#[derive(Debug, Clone)]
pub struct MoleculeCache {
    path: PathBuf,
}

impl MoleculeCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the table if the cache file exists.
    ///
    /// A file that exists but cannot be parsed is an error, not a miss.
    pub fn lookup(&self) -> Result<CacheLookup> {
        if !self.path.exists() {
            debug!("No cache at {}", self.path.display());
            return Ok(CacheLookup::Miss);
        }

        let table = self
            .read()
            .with_context(|| format!("Malformed molecule cache: {}", self.path.display()))?;

        info!(
            "Loaded {} molecules from cache {}",
            table.len(),
            self.path.display()
        );
        Ok(CacheLookup::Hit(table))
    }

    fn read(&self) -> Result<MoleculeTable> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut records = Vec::new();

        for (row_no, row) in reader.deserialize::<CacheRow>().enumerate() {
            let row = row.with_context(|| format!("row {}", row_no + 1))?;
            let occurrences = parse_occurrences(&row.occurrences)
                .with_context(|| format!("row {} ({})", row_no + 1, row.name))?;

            records.push(MoleculeRecord {
                name: row.name,
                occurrences,
                molecule_tag: row.molecule_tag,
                linelist: row.linelist,
            });
        }

        Ok(MoleculeTable::from_records(records))
    }

    /// Write the whole table, replacing any previous cache.
    pub fn store(&self, table: &MoleculeTable) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create cache directory: {}", parent.display())
                })?;
            }
        }

        let mut writer = csv::Writer::from_path(&self.path)
            .with_context(|| format!("Failed to open cache for writing: {}", self.path.display()))?;

        for record in table.iter() {
            writer.serialize(CacheRow {
                name: record.name.clone(),
                occurrences: format_occurrences(&record.occurrences),
                molecule_tag: record.molecule_tag.clone(),
                linelist: record.linelist.clone(),
            })?;
        }

        // an empty table still gets a header row
        if table.is_empty() {
            writer.write_record(["", "Occurances", "Molecule Tag", "Linelist"])?;
        }

        writer.flush()?;
        info!(
            "Cached {} molecules to {}",
            table.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Serialize occurrences as a Python-style list: `[230.538, 245.0]`.
pub fn format_occurrences(occurrences: &[f64]) -> String {
    let items: Vec<String> = occurrences.iter().map(|o| format!("{:?}", o)).collect();
    format!("[{}]", items.join(", "))
}

/// Parse a Python-style list of floats.
///
/// Accepts numpy 2 reprs such as `np.float64(230.538)`.
pub fn parse_occurrences(text: &str) -> Result<Vec<f64>> {
    let text = text.trim();
    let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) else {
        bail!("expected a bracketed list, got '{}'", text);
    };

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|item| {
            let item = item.trim();
            let value = item
                .strip_prefix("np.float64(")
                .and_then(|v| v.strip_suffix(')'))
                .unwrap_or(item);
            value
                .parse::<f64>()
                .with_context(|| format!("'{}' is not a number", item))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogLine, Identification};
    use tempfile::TempDir;

    fn sample_table() -> MoleculeTable {
        let mut table = MoleculeTable::new();
        let co = Identification::Matched(vec![CatalogLine {
            chemical_name: "Carbon Monoxide".to_string(),
            molecule_tag: Some("28503".to_string()),
            linelist: Some("CDMS".to_string()),
        }]);
        table.record(230.538, &co);
        table.record(245.0, &Identification::Unknown);
        table.record(230.53801, &co);
        table
    }

    #[test]
    fn test_missing_cache_is_miss() {
        let temp_dir = TempDir::new().unwrap();
        let cache = MoleculeCache::new(temp_dir.path().join("all_molecules.csv"));
        assert!(matches!(cache.lookup().unwrap(), CacheLookup::Miss));
    }

    #[test]
    fn test_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let cache = MoleculeCache::new(temp_dir.path().join("nested/all_molecules.csv"));
        let table = sample_table();

        cache.store(&table).unwrap();

        match cache.lookup().unwrap() {
            CacheLookup::Hit(loaded) => assert_eq!(loaded, table),
            CacheLookup::Miss => panic!("expected a cache hit"),
        }
    }

    #[test]
    fn test_written_layout() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("all_molecules.csv");
        MoleculeCache::new(&path).store(&sample_table()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], ",Occurances,Molecule Tag,Linelist");
        assert_eq!(lines[1], "Carbon Monoxide,\"[230.538, 230.53801]\",28503,CDMS");
        assert_eq!(lines[2], "Unknown,[245.0],,");
    }

    #[test]
    fn test_reads_pandas_output() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("all_molecules.csv");
        fs::write(
            &path,
            ",Occurances,Molecule Tag,Linelist\n\
             Carbon Monoxide,\"[np.float64(230.538), np.float64(230.538)]\",28503,CDMS\n\
             Unknown,[],,\n",
        )
        .unwrap();

        let CacheLookup::Hit(table) = MoleculeCache::new(&path).lookup().unwrap() else {
            panic!("expected a cache hit");
        };
        assert_eq!(table.get("Carbon Monoxide").unwrap().occurrences, vec![230.538, 230.538]);
        assert!(table.get("Unknown").unwrap().occurrences.is_empty());
        assert!(table.get("Unknown").unwrap().molecule_tag.is_none());
    }

    #[test]
    fn test_malformed_cache_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("all_molecules.csv");
        fs::write(&path, ",Occurances,Molecule Tag,Linelist\nCO,230.5,,\n").unwrap();

        assert!(MoleculeCache::new(&path).lookup().is_err());
    }

    #[test]
    fn test_empty_table_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let cache = MoleculeCache::new(temp_dir.path().join("empty.csv"));
        cache.store(&MoleculeTable::new()).unwrap();

        match cache.lookup().unwrap() {
            CacheLookup::Hit(loaded) => assert!(loaded.is_empty()),
            CacheLookup::Miss => panic!("expected a cache hit"),
        }
    }

    #[test]
    fn test_parse_occurrences() {
        assert_eq!(parse_occurrences("[1.5, 2.0]").unwrap(), vec![1.5, 2.0]);
        assert_eq!(parse_occurrences(" [] ").unwrap(), Vec::<f64>::new());
        assert!(parse_occurrences("1.5").is_err());
        assert!(parse_occurrences("[a]").is_err());
    }
}
