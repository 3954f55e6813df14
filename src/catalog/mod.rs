//! Spectral-line catalog lookups.
//!
//! This module defines the [`LineCatalog`] seam used by the pipeline and
//! the Splatalogue client that implements it.

pub mod splatalogue;

pub use splatalogue::SplatalogueClient;

use crate::models::{CatalogLine, Identification};
use thiserror::Error;
use tracing::debug;

/// Errors raised at the catalog boundary. None of them are retried.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to catalog at {0}")]
    Connect(String),

    #[error("catalog returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to send catalog request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed catalog response: {0}")]
    Parse(String),
}

/// Anything that can list the catalogued lines in a frequency range.
pub trait LineCatalog {
    /// Return every line between `low_ghz` and `high_ghz`, in catalog order.
    async fn query_lines(&self, low_ghz: f64, high_ghz: f64) -> Result<Vec<CatalogLine>, CatalogError>;
}

/// Identify the lines within `half_width_ghz` of `frequency_ghz`.
pub async fn identify<C: LineCatalog>(
    catalog: &C,
    frequency_ghz: f64,
    half_width_ghz: f64,
) -> Result<Identification, CatalogError> {
    let lines = catalog
        .query_lines(frequency_ghz - half_width_ghz, frequency_ghz + half_width_ghz)
        .await?;

    let identification = Identification::from_lines(lines);
    debug!(
        "{:.5} GHz -> {:?} (tags {:?})",
        frequency_ghz,
        identification.chemical_names(),
        identification.molecule_tags()
    );

    Ok(identification)
}
