//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.linefinder.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".linefinder.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Peak detection settings.
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Spectral-line catalog settings.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Molecule cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Plot settings.
    #[serde(default)]
    pub plot: PlotConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding the spectra.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Spectrum file names, relative to `data_dir`.
    /// Empty means every `.txt` file in `data_dir`.
    #[serde(default = "default_spectra")]
    pub spectra: Vec<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            spectra: default_spectra(),
            verbose: false,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./Data")
}

fn default_spectra() -> Vec<String> {
    (0..4)
        .map(|i| format!("Win{}.clean1.contsub_Jy.rest.scom.c.txt", i))
        .collect()
}

/// Peak detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Flux threshold, in multiples of the flux standard deviation.
    #[serde(default = "default_sigma_threshold")]
    pub sigma_threshold: f64,

    /// Decimal places kept on peak frequencies.
    #[serde(default = "default_decimals")]
    pub decimals: u32,

    /// Drop repeated rounded frequencies within one spectrum.
    #[serde(default)]
    pub dedupe_peaks: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sigma_threshold: default_sigma_threshold(),
            decimals: default_decimals(),
            dedupe_peaks: false,
        }
    }
}

fn default_sigma_threshold() -> f64 {
    3.0
}

fn default_decimals() -> u32 {
    5 // Splatalogue frequencies are good to about 5 decimals
}

/// Splatalogue query settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Export endpoint.
    #[serde(default = "default_catalog_url")]
    pub url: String,

    /// "Top 20" species filter.
    #[serde(default = "default_top20")]
    pub top20: String,

    /// Half-width of the search window in GHz.
    #[serde(default = "default_half_width")]
    pub half_width_ghz: f64,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Line lists to search.
    #[serde(default = "default_line_lists")]
    pub line_lists: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            top20: default_top20(),
            half_width_ghz: default_half_width(),
            timeout_seconds: default_timeout(),
            line_lists: default_line_lists(),
        }
    }
}

fn default_catalog_url() -> String {
    "https://splatalogue.online/c_export.php".to_string()
}

fn default_top20() -> String {
    "planet".to_string()
}

fn default_half_width() -> f64 {
    0.00005
}

fn default_timeout() -> u64 {
    60
}

fn default_line_lists() -> Vec<String> {
    vec![
        "JPL", "CDMS", "LOVAS", "SLAIM", "ToyaMA", "OSU", "Recomb", "Lisa", "RFI",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Molecule cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Path of the CSV cache.
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,

    /// Read and write the cache.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            enabled: true,
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./Data/all_molecules.csv")
}

/// Plot rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Output image; `.svg` selects the SVG backend, anything else PNG.
    #[serde(default = "default_plot_output")]
    pub output: PathBuf,

    /// Image width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Image height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Spacing of frequency ticks in GHz.
    #[serde(default = "default_tick_step")]
    pub tick_step_ghz: f64,

    /// Render the plot at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            output: default_plot_output(),
            width: default_width(),
            height: default_height(),
            tick_step_ghz: default_tick_step(),
            enabled: true,
        }
    }
}

fn default_plot_output() -> PathBuf {
    PathBuf::from("spectra.png")
}

fn default_width() -> u32 {
    1000
}

fn default_height() -> u32 {
    600
}

fn default_tick_step() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data_dir) = args.data_dir {
            self.general.data_dir = data_dir.clone();
        }
        if let Some(ref spectra) = args.spectra {
            self.general.spectra = spectra.clone();
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(sigma) = args.sigma {
            self.detection.sigma_threshold = sigma;
        }
        if args.dedupe {
            self.detection.dedupe_peaks = true;
        }

        if let Some(ref url) = args.catalog_url {
            self.catalog.url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.catalog.timeout_seconds = timeout;
        }

        if let Some(ref cache) = args.cache {
            self.cache.path = cache.clone();
        }
        if args.no_cache {
            self.cache.enabled = false;
        }

        if let Some(ref plot) = args.plot {
            self.plot.output = plot.clone();
        }
        if args.no_plot {
            self.plot.enabled = false;
        }
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if !(self.detection.sigma_threshold > 0.0) {
            anyhow::bail!("detection.sigma_threshold must be positive");
        }
        if !(self.catalog.half_width_ghz > 0.0) {
            anyhow::bail!("catalog.half_width_ghz must be positive");
        }
        if self.catalog.timeout_seconds == 0 {
            anyhow::bail!("catalog.timeout_seconds must be at least 1");
        }
        if !(self.plot.tick_step_ghz > 0.0) {
            anyhow::bail!("plot.tick_step_ghz must be positive");
        }
        if self.plot.width == 0 || self.plot.height == 0 {
            anyhow::bail!("plot.width and plot.height must be non-zero");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.detection.sigma_threshold, 3.0);
        assert_eq!(config.detection.decimals, 5);
        assert_eq!(config.catalog.half_width_ghz, 0.00005);
        assert_eq!(config.catalog.top20, "planet");
        assert_eq!(config.general.spectra.len(), 4);
        assert_eq!(
            config.general.spectra[2],
            "Win2.clean1.contsub_Jy.rest.scom.c.txt"
        );
        assert!(config.cache.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
data_dir = "/data/alma"
spectra = []
verbose = true

[detection]
sigma_threshold = 4.5
dedupe_peaks = true

[catalog]
timeout_seconds = 10

[plot]
output = "out.svg"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.data_dir, PathBuf::from("/data/alma"));
        assert!(config.general.verbose);
        assert!(config.general.spectra.is_empty());
        assert_eq!(config.detection.sigma_threshold, 4.5);
        assert_eq!(config.detection.decimals, 5);
        assert!(config.detection.dedupe_peaks);
        assert_eq!(config.catalog.timeout_seconds, 10);
        assert_eq!(config.catalog.url, "https://splatalogue.online/c_export.php");
        assert_eq!(config.plot.output, PathBuf::from("out.svg"));
        assert_eq!(config.plot.width, 1000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.detection.sigma_threshold = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.plot.tick_step_ghz = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[detection]"));
        assert!(toml_str.contains("[catalog]"));
        assert!(toml_str.contains("[cache]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.catalog.line_lists, Config::default().catalog.line_lists);
    }
}
