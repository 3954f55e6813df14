//! Data models for the line finder.
//!
//! This module contains the core data structures used throughout the
//! application: spectra, catalog matches, identifications, and the
//! per-molecule records that make up the aggregated table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chemical name used for peaks the catalog could not identify.
pub const UNKNOWN_MOLECULE: &str = "Unknown";

/// A single (frequency, flux) sample of a spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralPoint {
    /// Rest frequency in GHz.
    pub frequency_ghz: f64,
    /// Measured flux in Jy.
    pub flux_jy: f64,
}

/// One observation window, as loaded from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Display name (the file stem).
    pub name: String,
    /// Samples in file order (ascending frequency).
    pub points: Vec<SpectralPoint>,
}

impl Dataset {
    /// Creates a dataset from `(frequency, flux)` pairs.
    pub fn from_pairs(name: impl Into<String>, pairs: &[(f64, f64)]) -> Self {
        Self {
            name: name.into(),
            points: pairs
                .iter()
                .map(|&(frequency_ghz, flux_jy)| SpectralPoint {
                    frequency_ghz,
                    flux_jy,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the first and last frequency, if any.
    pub fn frequency_span(&self) -> Option<(f64, f64)> {
        let first = self.points.first()?.frequency_ghz;
        let last = self.points.last()?.frequency_ghz;
        Some((first, last))
    }

    /// Returns the minimum and maximum flux, if any.
    pub fn flux_range(&self) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }
        let (min, max) = self
            .points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.flux_jy), hi.max(p.flux_jy))
            });
        Some((min, max))
    }
}

/// A transition returned by the spectral-line catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogLine {
    /// Chemical name, e.g. "Carbon Monoxide".
    pub chemical_name: String,
    /// Catalog molecule tag, kept verbatim.
    pub molecule_tag: Option<String>,
    /// Source line list, e.g. "CDMS" or "JPL".
    pub linelist: Option<String>,
}

/// Outcome of looking up one peak frequency.
#[derive(Debug, Clone, PartialEq)]
pub enum Identification {
    /// One or more catalog lines fell inside the search window.
    Matched(Vec<CatalogLine>),
    /// The catalog returned nothing.
    Unknown,
}

impl Identification {
    /// Builds an identification from raw catalog rows.
    pub fn from_lines(lines: Vec<CatalogLine>) -> Self {
        if lines.is_empty() {
            Identification::Unknown
        } else {
            Identification::Matched(lines)
        }
    }

    /// Chemical names in catalog order, duplicates preserved.
    pub fn chemical_names(&self) -> Vec<&str> {
        match self {
            Identification::Matched(lines) => {
                lines.iter().map(|l| l.chemical_name.as_str()).collect()
            }
            Identification::Unknown => vec![UNKNOWN_MOLECULE],
        }
    }

    /// Molecule tags parallel to [`chemical_names`](Self::chemical_names).
    pub fn molecule_tags(&self) -> Vec<Option<&str>> {
        match self {
            Identification::Matched(lines) => {
                lines.iter().map(|l| l.molecule_tag.as_deref()).collect()
            }
            Identification::Unknown => vec![None],
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Identification::Unknown)
    }
}

/// Everything known about one molecule across all windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoleculeRecord {
    /// Chemical name (or [`UNKNOWN_MOLECULE`]).
    pub name: String,
    /// Every peak frequency this molecule matched, in discovery order.
    pub occurrences: Vec<f64>,
    /// Tag of the first matching line.
    pub molecule_tag: Option<String>,
    /// Line list of the first matching line.
    pub linelist: Option<String>,
}

impl MoleculeRecord {
    pub fn new(name: impl Into<String>, molecule_tag: Option<String>, linelist: Option<String>) -> Self {
        Self {
            name: name.into(),
            occurrences: Vec::new(),
            molecule_tag,
            linelist,
        }
    }
}

impl fmt::Display for MoleculeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let occurrences = self
            .occurrences
            .iter()
            .map(|o| format!("{:?}", o))
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "{{'Occurances': [{}], 'Molecule Tag': {}, 'Linelist': {}}}",
            occurrences,
            self.molecule_tag.as_deref().unwrap_or("None"),
            self.linelist.as_deref().unwrap_or("None"),
        )
    }
}

/// Where the molecule table of a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSource {
    /// Reloaded from the on-disk cache.
    Cache,
    /// Freshly computed from catalog queries.
    Catalog,
}

impl fmt::Display for TableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSource::Cache => write!(f, "cache"),
            TableSource::Catalog => write!(f, "catalog"),
        }
    }
}

/// Metadata about a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Date and time of the run.
    pub run_date: DateTime<Utc>,
    /// Where the molecule table came from.
    pub source: TableSource,
    /// Number of spectra loaded.
    pub datasets: usize,
    /// Number of peaks queried (zero on a cache hit).
    pub peaks_queried: usize,
    /// Number of distinct molecules in the table.
    pub molecules: usize,
    /// Wall-clock duration in seconds.
    pub duration_seconds: f64,
}

/// The complete run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub metadata: RunMetadata,
    pub molecules: Vec<MoleculeRecord>,
}
