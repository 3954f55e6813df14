//! Molecule aggregation.
//!
//! This module merges per-peak identifications from every window into a
//! single table keyed by chemical name.

use crate::models::{Identification, MoleculeRecord, UNKNOWN_MOLECULE};
use std::collections::HashMap;

/// Insertion-ordered table of molecule records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoleculeTable {
    records: Vec<MoleculeRecord>,
    index: HashMap<String, usize>,
}

impl MoleculeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a table from stored records, keeping their order.
    ///
    /// A repeated name merges into the first record with that name.
    pub fn from_records(records: impl IntoIterator<Item = MoleculeRecord>) -> Self {
        let mut table = Self::new();
        for record in records {
            match table.index.get(&record.name) {
                Some(&idx) => table.records[idx].occurrences.extend(record.occurrences),
                None => {
                    table.index.insert(record.name.clone(), table.records.len());
                    table.records.push(record);
                }
            }
        }
        table
    }

    /// Record one peak frequency and its identification.
    ///
    /// Each matched chemical name gets the frequency appended, so a peak
    /// that matches two lines of the same molecule is recorded twice.
    /// Unmatched peaks all land in the single "Unknown" record.
    pub fn record(&mut self, frequency_ghz: f64, identification: &Identification) {
        match identification {
            Identification::Matched(lines) => {
                for line in lines {
                    self.entry(&line.chemical_name, || {
                        (line.molecule_tag.clone(), line.linelist.clone())
                    })
                    .occurrences
                    .push(frequency_ghz);
                }
            }
            Identification::Unknown => {
                self.entry(UNKNOWN_MOLECULE, || (None, None))
                    .occurrences
                    .push(frequency_ghz);
            }
        }
    }

    fn entry(
        &mut self,
        name: &str,
        metadata: impl FnOnce() -> (Option<String>, Option<String>),
    ) -> &mut MoleculeRecord {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                let (tag, linelist) = metadata();
                let idx = self.records.len();
                self.records.push(MoleculeRecord::new(name, tag, linelist));
                self.index.insert(name.to_string(), idx);
                idx
            }
        };
        &mut self.records[idx]
    }

    pub fn get(&self, name: &str) -> Option<&MoleculeRecord> {
        self.index.get(name).map(|&idx| &self.records[idx])
    }

    /// Records in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &MoleculeRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of recorded occurrences across all molecules.
    pub fn total_occurrences(&self) -> usize {
        self.records.iter().map(|r| r.occurrences.len()).sum()
    }

    pub fn into_records(self) -> Vec<MoleculeRecord> {
        self.records
    }
}
