//! Sigma-threshold peak detection.

use crate::config::DetectionConfig;
use crate::models::Dataset;
use tracing::debug;

/// Population standard deviation of the flux column.
///
/// Returns 0.0 for an empty dataset.
pub fn flux_std_dev(dataset: &Dataset) -> f64 {
    let n = dataset.len();
    if n == 0 {
        return 0.0;
    }

    let mean = dataset.points.iter().map(|p| p.flux_jy).sum::<f64>() / n as f64;
    let variance = dataset
        .points
        .iter()
        .map(|p| {
            let d = p.flux_jy - mean;
            d * d
        })
        .sum::<f64>()
        / n as f64;

    variance.sqrt()
}

/// Round half-to-even at `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round_ties_even() / scale
}

/// Detect candidate line frequencies in one dataset.
///
/// Every row with `flux >= sigma_threshold * sigma` is kept in row order.
/// Rounded duplicates survive unless `dedupe_peaks` is set.
pub fn detect_peaks(dataset: &Dataset, config: &DetectionConfig) -> Vec<f64> {
    if dataset.is_empty() {
        return Vec::new();
    }

    let sigma = flux_std_dev(dataset);
    let threshold = config.sigma_threshold * sigma;

    let mut peaks: Vec<f64> = dataset
        .points
        .iter()
        .filter(|p| p.flux_jy >= threshold)
        .map(|p| round_to(p.frequency_ghz, config.decimals))
        .collect();

    if config.dedupe_peaks {
        let mut seen: Vec<f64> = Vec::with_capacity(peaks.len());
        peaks.retain(|f| {
            if seen.contains(f) {
                false
            } else {
                seen.push(*f);
                true
            }
        });
    }

    debug!(
        "{}: sigma = {:.5} Jy, threshold = {:.5} Jy, {} peaks",
        dataset.name,
        sigma,
        threshold,
        peaks.len()
    );

    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DetectionConfig {
        DetectionConfig::default()
    }

    fn noisy_dataset() -> Dataset {
        let mut pairs: Vec<(f64, f64)> = (0..50)
            .map(|i| (230.0 + i as f64 * 0.01, if i % 2 == 0 { 0.01 } else { -0.01 }))
            .collect();
        pairs[20].1 = 1.0;
        pairs[21].1 = 0.9;
        Dataset::from_pairs("noisy", &pairs)
    }

    #[test]
    fn test_std_dev_matches_population_formula() {
        let ds = Dataset::from_pairs("w", &[(100.0, 0.1), (100.1, 0.05), (100.2, 5.0)]);
        let sigma = flux_std_dev(&ds);
        assert!((sigma - 2.3218).abs() < 1e-3, "sigma = {}", sigma);
    }

    #[test]
    fn test_below_threshold_yields_no_peaks() {
        // 5.0 Jy is below 3 sigma (~6.97 Jy)
        let ds = Dataset::from_pairs("w", &[(100.0, 0.1), (100.1, 0.05), (100.2, 5.0)]);
        assert!(detect_peaks(&ds, &config()).is_empty());
    }

    #[test]
    fn test_peaks_are_thresholded_subset() {
        let ds = noisy_dataset();
        let peaks = detect_peaks(&ds, &config());
        let threshold = 3.0 * flux_std_dev(&ds);

        assert_eq!(peaks.len(), 2);
        for peak in &peaks {
            let row = ds
                .points
                .iter()
                .find(|p| round_to(p.frequency_ghz, 5) == *peak)
                .expect("peak must come from the dataset");
            assert!(row.flux_jy >= threshold);
        }
    }

    #[test]
    fn test_detection_is_idempotent() {
        let ds = noisy_dataset();
        assert_eq!(detect_peaks(&ds, &config()), detect_peaks(&ds, &config()));
    }

    #[test]
    fn test_empty_dataset() {
        let ds = Dataset::from_pairs("empty", &[]);
        assert_eq!(flux_std_dev(&ds), 0.0);
        assert!(detect_peaks(&ds, &config()).is_empty());
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to(115.271201999, 5), 115.2712);
        assert_eq!(round_to(230.5380049, 5), 230.538);
        assert_eq!(round_to(1.5, 0), 2.0);
        assert_eq!(round_to(2.5, 0), 2.0);
    }

    #[test]
    fn test_duplicates_kept_unless_deduped() {
        let mut pairs: Vec<(f64, f64)> = (0..40).map(|i| (200.0 + i as f64, 0.0)).collect();
        pairs.push((250.000001, 10.0));
        pairs.push((250.000002, 10.0));
        let ds = Dataset::from_pairs("dups", &pairs);

        assert_eq!(detect_peaks(&ds, &config()), vec![250.0, 250.0]);

        let dedupe = DetectionConfig {
            dedupe_peaks: true,
            ..config()
        };
        assert_eq!(detect_peaks(&ds, &dedupe), vec![250.0]);
    }
}
