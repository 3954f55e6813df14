//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Every option is optional here; defaults
//! live in the configuration layer.

use clap::Parser;
use std::path::PathBuf;

/// LineFinder - molecular line identification for radio spectra
///
/// Finds significant peaks in each observation window, looks them up in
/// Splatalogue, and aggregates the candidate molecules across windows.
/// Results are cached so later runs skip the catalog queries.
///
/// Examples:
///   linefinder
///   linefinder --data-dir ./Data --plot windows.svg
///   linefinder --spectra Win0.txt,Win1.txt --sigma 4 --refresh
///   linefinder --report run.json --quiet
///   linefinder --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory holding the spectra
    #[arg(short, long, value_name = "DIR", env = "LINEFINDER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Spectrum files relative to the data directory (comma-separated)
    ///
    /// Example: --spectra Win0.txt,Win1.txt
    #[arg(short, long, value_name = "FILES", value_delimiter = ',')]
    pub spectra: Option<Vec<String>>,

    /// Path of the molecule cache (CSV)
    #[arg(long, value_name = "FILE")]
    pub cache: Option<PathBuf>,

    /// Neither read nor write the molecule cache
    #[arg(long)]
    pub no_cache: bool,

    /// Ignore an existing cache, recompute and overwrite it
    #[arg(long)]
    pub refresh: bool,

    /// Output image for the spectra plot (.png or .svg)
    #[arg(short, long, value_name = "FILE")]
    pub plot: Option<PathBuf>,

    /// Skip rendering the plot
    #[arg(long)]
    pub no_plot: bool,

    /// Write a JSON run report to this file
    #[arg(short, long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Splatalogue export endpoint
    #[arg(long, value_name = "URL", env = "SPLATALOGUE_URL")]
    pub catalog_url: Option<String>,

    /// Catalog request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Detection threshold in standard deviations of the flux
    #[arg(long, value_name = "SIGMA")]
    pub sigma: Option<f64>,

    /// Drop repeated rounded peak frequencies within a spectrum
    #[arg(long)]
    pub dedupe: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .linefinder.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .linefinder.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.refresh && self.no_cache {
            return Err("Cannot use both --refresh and --no-cache".to_string());
        }

        if let Some(sigma) = self.sigma {
            if !(sigma > 0.0) {
                return Err("Sigma threshold must be positive".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref url) = self.catalog_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Catalog URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref spectra) = self.spectra {
            if spectra.iter().any(|s| s.trim().is_empty()) {
                return Err("Spectrum names must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the config file's `general.verbose`; `--quiet` wins over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
