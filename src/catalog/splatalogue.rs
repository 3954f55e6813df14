//! Splatalogue export client.
//!
//! Queries go through the legacy export form, which answers with a
//! colon-delimited table. Only the name, tag, and line list columns are
//! read back.

use super::{CatalogError, LineCatalog};
use crate::config::CatalogConfig;
use crate::models::CatalogLine;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info};

const CHEMICAL_NAME_COLUMN: &str = "Chemical Name";
const MOLECULE_TAG_COLUMNS: [&str; 2] = ["Molecule<br>Tag", "Molecule Tag"];
const LINELIST_COLUMN: &str = "Linelist";

/// HTTP client for the Splatalogue export endpoint.
pub struct SplatalogueClient {
    config: CatalogConfig,
    http_client: reqwest::Client,
}

impl SplatalogueClient {
    /// Create a client for the configured endpoint.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        info!(
            "Using Splatalogue at {} (top20 = {})",
            config.url, config.top20
        );

        let http_client = http_client_builder(&config)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Client that ignores proxy settings, for talking to a local server.
    #[cfg(test)]
    fn direct(config: CatalogConfig) -> Self {
        let http_client = http_client_builder(&config).no_proxy().build().unwrap();
        Self {
            config,
            http_client,
        }
    }

    /// Form fields for one range query.
    fn build_form(&self, low_ghz: f64, high_ghz: f64) -> Vec<(String, String)> {
        let mut form: Vec<(String, String)> = vec![
            ("from".into(), low_ghz.to_string()),
            ("to".into(), high_ghz.to_string()),
            ("frequency_units".into(), "GHz".into()),
            ("top20".into(), self.config.top20.clone()),
            ("show_molecule_tag".into(), "show_molecule_tag".into()),
            ("submit".into(), "Export".into()),
            ("export_type".into(), "current".into()),
            ("export_delimiter".into(), "colon".into()),
            ("offset".into(), "0".into()),
            ("range".into(), "on".into()),
        ];

        for list in &self.config.line_lists {
            let key = format!("display{}", list);
            form.push((key.clone(), key));
        }

        form
    }
}

fn http_client_builder(config: &CatalogConfig) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(concat!("linefinder/", env!("CARGO_PKG_VERSION")))
}

impl LineCatalog for SplatalogueClient {
    async fn query_lines(&self, low_ghz: f64, high_ghz: f64) -> Result<Vec<CatalogLine>, CatalogError> {
        debug!("Querying Splatalogue {:.5}-{:.5} GHz", low_ghz, high_ghz);

        let response = self
            .http_client
            .post(&self.config.url)
            .form(&self.build_form(low_ghz, high_ghz))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CatalogError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    CatalogError::Connect(self.config.url.clone())
                } else {
                    CatalogError::Request(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status { status, body });
        }

        let body = response.text().await?;
        parse_export(&body)
    }
}

/// Parse a colon-delimited Splatalogue export.
///
/// An empty body, or a header with no rows, means no lines matched.
pub fn parse_export(body: &str) -> Result<Vec<CatalogLine>, CatalogError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b':')
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| CatalogError::Parse(e.to_string()))?
        .clone();

    let position = |name: &str| headers.iter().position(|h| h == name);
    let name_idx = position(CHEMICAL_NAME_COLUMN);
    let tag_idx = MOLECULE_TAG_COLUMNS.iter().find_map(|c| position(*c));
    let linelist_idx = position(LINELIST_COLUMN);

    let mut lines = Vec::new();

    for (row_no, record) in reader.records().enumerate() {
        let record = record.map_err(|e| CatalogError::Parse(format!("row {}: {}", row_no, e)))?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let name_idx = name_idx.ok_or_else(|| {
            CatalogError::Parse(format!("missing '{}' column", CHEMICAL_NAME_COLUMN))
        })?;

        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let chemical_name = field(Some(name_idx))
            .ok_or_else(|| CatalogError::Parse(format!("row {}: empty chemical name", row_no)))?;

        lines.push(CatalogLine {
            chemical_name,
            molecule_tag: field(tag_idx),
            linelist: field(linelist_idx),
        });
    }

    Ok(lines)
}
