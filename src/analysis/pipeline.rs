//! Detection and identification over every window.
//!
//! Windows are processed strictly in order, and each catalog query is
//! awaited before the next one is sent.

use crate::analysis::MoleculeTable;
use crate::catalog::{identify, LineCatalog};
use crate::config::{CatalogConfig, DetectionConfig};
use crate::detection::detect_peaks;
use crate::models::Dataset;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use tracing::{debug, info};

/// What a fresh compute produced besides the table itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOutcome {
    /// Queried peak frequencies, one list per dataset, in dataset order.
    pub peak_markers: Vec<Vec<f64>>,
    /// Number of catalog queries issued.
    pub peaks_queried: usize,
}

/// Detect peaks in each dataset, identify them, and fold the results
/// into `table`.
///
/// The first catalog failure aborts the run.
pub async fn identify_lines<C: LineCatalog>(
    datasets: &[Dataset],
    catalog: &C,
    detection: &DetectionConfig,
    catalog_config: &CatalogConfig,
    table: &mut MoleculeTable,
    progress: &ProgressBar,
) -> Result<PipelineOutcome> {
    let mut outcome = PipelineOutcome::default();

    for dataset in datasets {
        let peaks = detect_peaks(dataset, detection);
        info!("{}: {} peaks above threshold", dataset.name, peaks.len());
        progress.inc_length(peaks.len() as u64);

        for &frequency in &peaks {
            progress.set_message(format!("{} @ {:.5} GHz", dataset.name, frequency));

            let identification = identify(catalog, frequency, catalog_config.half_width_ghz)
                .await
                .with_context(|| {
                    format!(
                        "Catalog lookup failed for {} at {:.5} GHz",
                        dataset.name, frequency
                    )
                })?;

            if identification.is_unknown() {
                debug!("{}: no catalog match at {:.5} GHz", dataset.name, frequency);
            }
            table.record(frequency, &identification);
            outcome.peaks_queried += 1;
            progress.inc(1);
        }

        outcome.peak_markers.push(peaks);
    }

    debug!(
        "Identified {} molecules from {} queries",
        table.len(),
        outcome.peaks_queried
    );

    Ok(outcome)
}
