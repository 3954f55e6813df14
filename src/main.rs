//! LineFinder - molecular line identification for radio spectra
//!
//! A CLI tool that detects significant peaks in ALMA-style spectral
//! windows, identifies candidate molecules through Splatalogue, and
//! aggregates them into a cached per-molecule table.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any fatal error (missing spectrum, malformed cache, catalog failure, ...)

mod analysis;
mod cache;
mod catalog;
mod cli;
mod config;
mod detection;
mod models;
mod report;
mod spectrum;

use analysis::MoleculeTable;
use anyhow::{Context, Result};
use cache::{CacheLookup, MoleculeCache};
use catalog::SplatalogueClient;
use chrono::Utc;
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{Dataset, RunMetadata, TableSource, UNKNOWN_MOLECULE};
use report::PlotAnnotations;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration first so its verbosity reaches the logger
    let (mut config, config_path) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("LineFinder v{}", env!("CARGO_PKG_VERSION"));
    match config_path {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args, config).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .linefinder.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize spectra, thresholds, catalog, and plot output.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber was already installed");
    }
}

/// Run the whole workflow: cache or compute, then print, plot, and report.
async fn run(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    config.validate().context("Invalid configuration")?;

    let cache = config
        .cache
        .enabled
        .then(|| MoleculeCache::new(config.cache.path.clone()));

    // Step 1: Consult the cache
    let lookup = match cache {
        Some(ref cache) if !args.refresh => cache.lookup()?,
        Some(ref cache) => {
            info!("Refreshing cache at {}", cache.path().display());
            CacheLookup::Miss
        }
        None => CacheLookup::Miss,
    };

    // Step 2: Load spectra and compute the table, unless the cache answered
    let (table, datasets, annotations, peaks_queried, source) = match lookup {
        CacheLookup::Hit(table) => {
            println!("\n --- Loading in data ---\n");
            let datasets = if config.plot.enabled {
                spectra_for_cached_plot(&config)
            } else {
                Vec::new()
            };
            (table, datasets, PlotAnnotations::None, 0, TableSource::Cache)
        }
        CacheLookup::Miss => {
            println!("\n --- Reading in data ---\n");
            let datasets = load_datasets(&config)?;
            if datasets.len() != 4 {
                warn!("Expected 4 spectral windows, found {}", datasets.len());
            }

            let catalog = SplatalogueClient::new(config.catalog.clone())?;
            let progress = query_progress(args.quiet);
            let mut table = MoleculeTable::new();

            let outcome = analysis::identify_lines(
                &datasets,
                &catalog,
                &config.detection,
                &config.catalog,
                &mut table,
                &progress,
            )
            .await?;
            progress.finish_with_message("Catalog queries complete");

            if let Some(ref cache) = cache {
                cache.store(&table)?;
            }

            (
                table,
                datasets,
                PlotAnnotations::Peaks(outcome.peak_markers),
                outcome.peaks_queried,
                TableSource::Catalog,
            )
        }
    };

    // Step 3: Print the molecule table
    print!("{}", report::generate_summary_text(&table));
    if let Some(unknown) = table.get(UNKNOWN_MOLECULE) {
        info!(
            "{} of {} occurrences unidentified",
            unknown.occurrences.len(),
            table.total_occurrences()
        );
    }

    // Step 4: Plot
    if config.plot.enabled && !datasets.is_empty() {
        let path = report::render_spectra(&datasets, &annotations, &config.plot)?;
        if !args.quiet {
            println!("\n📈 Plot saved to: {}", path.display());
        }
    }

    // Step 5: Optional JSON report
    let duration = start_time.elapsed().as_secs_f64();
    if let Some(ref report_path) = args.report {
        let metadata = RunMetadata {
            run_date: Utc::now(),
            source,
            datasets: datasets.len(),
            peaks_queried,
            molecules: table.len(),
            duration_seconds: duration,
        };
        let run_report = report::build_report(table, metadata);
        report::write_json_report(&run_report, report_path)?;
        if !args.quiet {
            println!("📝 Report saved to: {}", report_path.display());
        }
    }

    info!("Done in {:.1}s (source: {})", duration, source);
    Ok(())
}

/// Resolve and load the configured spectra.
fn load_datasets(config: &Config) -> Result<Vec<Dataset>> {
    let paths = spectrum::resolve_spectra(&config.general.data_dir, &config.general.spectra)?;
    spectrum::load_spectra(&paths)
}

/// Spectra for the plot of a cached run.
///
/// The cache already answers the run, so unreadable spectra only skip the plot.
fn spectra_for_cached_plot(config: &Config) -> Vec<Dataset> {
    match load_datasets(config) {
        Ok(datasets) => datasets,
        Err(e) => {
            warn!("Skipping plot: {:#}", e);
            Vec::new()
        }
    }
}

/// Progress bar for the catalog queries; hidden in quiet mode.
fn query_progress(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Load configuration from file or use defaults.
///
/// Also returns the file the configuration came from, if any. Runs before
/// logging is set up, so it does not log.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    Ok(match Config::load_default()? {
        Some(config) => (config, Some(PathBuf::from(CONFIG_FILE_NAME))),
        None => (Config::default(), None),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cached_plot_skips_missing_spectra() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.general.data_dir = temp_dir.path().join("missing");

        assert!(spectra_for_cached_plot(&config).is_empty());
    }

    #[test]
    fn test_cached_plot_loads_available_spectra() {
        let mut config = Config::default();
        config.general.data_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/spectra");
        config.general.spectra = vec!["Win0.txt".to_string(), "Win1.txt".to_string()];

        let datasets = spectra_for_cached_plot(&config);
        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets[0].name, "Win0");
    }
}
