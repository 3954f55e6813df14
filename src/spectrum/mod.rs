//! Spectrum loading.
//!
//! Spectra are whitespace-delimited text tables with the rest frequency
//! (GHz) in the first column and the flux (Jy) in the second. Any further
//! columns are ignored.

use crate::models::Dataset;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Extension of the per-window exports.
const SPECTRUM_EXTENSION: &str = "txt";

/// Load a single spectrum file.
pub fn load_spectrum(path: &Path) -> Result<Dataset> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read spectrum: {}", path.display()))?;

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let pairs = parse_spectrum(&text)
        .with_context(|| format!("Malformed spectrum: {}", path.display()))?;

    debug!("Loaded {} samples from {}", pairs.len(), path.display());

    Ok(Dataset::from_pairs(name, &pairs))
}

/// Load every spectrum in order. Any failure aborts.
pub fn load_spectra(paths: &[PathBuf]) -> Result<Vec<Dataset>> {
    let datasets = paths
        .iter()
        .map(|p| load_spectrum(p))
        .collect::<Result<Vec<_>>>()?;

    info!("Loaded {} spectra", datasets.len());
    Ok(datasets)
}

/// Find the spectrum files directly inside `data_dir`, sorted by name.
pub fn discover_spectra(data_dir: &Path) -> Result<Vec<PathBuf>> {
    if !data_dir.is_dir() {
        bail!("Data directory not found: {}", data_dir.display());
    }

    let paths: Vec<PathBuf> = WalkDir::new(data_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(SPECTRUM_EXTENSION))
        .collect();

    if paths.is_empty() {
        bail!(
            "No .{} spectra found in {}",
            SPECTRUM_EXTENSION,
            data_dir.display()
        );
    }

    Ok(paths)
}

/// Resolve the configured spectrum list against the data directory.
///
/// An empty list falls back to discovery.
pub fn resolve_spectra(data_dir: &Path, spectra: &[String]) -> Result<Vec<PathBuf>> {
    if spectra.is_empty() {
        return discover_spectra(data_dir);
    }

    Ok(spectra.iter().map(|s| data_dir.join(s)).collect())
}

fn parse_spectrum(text: &str) -> Result<Vec<(f64, f64)>> {
    let mut points = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (Some(freq), Some(flux)) = (fields.next(), fields.next()) else {
            bail!("line {}: expected two columns, got '{}'", line_no, line);
        };

        let frequency_ghz = freq
            .parse::<f64>()
            .with_context(|| format!("line {}: '{}' is not a number", line_no, freq))?;
        let flux_jy = flux
            .parse::<f64>()
            .with_context(|| format!("line {}: '{}' is not a number", line_no, flux))?;

        points.push((frequency_ghz, flux_jy));
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_spectrum_skips_comments_and_blanks() {
        let text = "# freq flux\n\n100.0 0.1\n100.1\t0.05  extra\n  100.2   5.0\n";
        let points = parse_spectrum(text).unwrap();

        assert_eq!(points, vec![(100.0, 0.1), (100.1, 0.05), (100.2, 5.0)]);
    }

    #[test]
    fn test_parse_spectrum_rejects_bad_rows() {
        assert!(parse_spectrum("100.0\n").is_err());
        assert!(parse_spectrum("100.0 abc\n").is_err());
    }

    #[test]
    fn test_load_spectrum_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/spectra/Win0.txt");
        let dataset = load_spectrum(&path).unwrap();

        assert_eq!(dataset.name, "Win0");
        assert!(!dataset.is_empty());
        let (first, last) = dataset.frequency_span().unwrap();
        assert!(first < last);
    }

    #[test]
    fn test_missing_spectrum_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_spectra(&[temp_dir.path().join("nope.txt")]).unwrap_err();
        assert!(err.to_string().contains("nope.txt"));
    }

    #[test]
    fn test_discover_spectra_sorted() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["Win1.txt", "Win0.txt", "notes.md"] {
            std::fs::write(temp_dir.path().join(name), "1.0 1.0\n").unwrap();
        }
        std::fs::create_dir(temp_dir.path().join("Win9.txt")).unwrap();

        let found = discover_spectra(temp_dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["Win0.txt", "Win1.txt"]);
    }

    #[test]
    fn test_resolve_spectra_prefers_explicit_list() {
        let paths = resolve_spectra(Path::new("Data"), &["a.txt".to_string()]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("Data/a.txt")]);
    }
}
