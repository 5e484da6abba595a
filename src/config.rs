use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Environment variable naming the YAML config file.
pub const CONFIG_ENV: &str = "RAGTAGGER_CONFIG";

/// A named object inside a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobLocation {
    pub bucket: String,
    pub object: String,
}

impl BlobLocation {
    pub fn new(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for BlobLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.object)
    }
}

/// Which blob-store backend the binary should open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    /// `<root>/<bucket>/<object>` on the local filesystem.
    Local { root: PathBuf },
    /// Google Cloud Storage with application-default credentials.
    Gcs,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Local {
            root: PathBuf::from("blobs"),
        }
    }
}

/// Everything one pipeline run needs to know. Built once, never mutated
/// while a run is in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub catalogue: BlobLocation,
    pub records: BlobLocation,
    pub output: BlobLocation,
    pub output_content_type: String,
    /// Evaluate rows on the rayon pool.
    pub parallel: bool,
    pub store: StoreConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            catalogue: BlobLocation::new("pension-data-raw", "Execution-Workbook.xlsx"),
            records: BlobLocation::new("pension-data-raw", "Pension_Data.csv"),
            output: BlobLocation::new("pension-data-summary", "Pension_Data_With_RAG.csv"),
            output_content_type: "text/plain".to_string(),
            parallel: true,
            store: StoreConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML document; keys left out keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("parsing pipeline config YAML")
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&raw).with_context(|| format!("in config file {}", path.display()))
    }

    /// Load from the file named by `RAGTAGGER_CONFIG`, or fall back to defaults.
    pub fn from_env() -> Result<Self> {
        match env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                debug!(path = %path, "loading pipeline config");
                Self::from_yaml_file(path)
            }
            _ => {
                debug!("{} not set, using default config", CONFIG_ENV);
                Ok(Self::default())
            }
        }
    }

    /// Returns a copy with the request's overrides applied.
    pub fn with_request(&self, request: &RunRequest) -> Self {
        let mut cfg = self.clone();
        if let Some(b) = &request.catalogue_bucket {
            cfg.catalogue.bucket = b.clone();
        }
        if let Some(o) = &request.catalogue_file {
            cfg.catalogue.object = o.clone();
        }
        if let Some(b) = &request.source_bucket {
            cfg.records.bucket = b.clone();
        }
        if let Some(o) = &request.source_file {
            cfg.records.object = o.clone();
        }
        if let Some(b) = &request.destination_bucket {
            cfg.output.bucket = b.clone();
        }
        if let Some(o) = &request.destination_file {
            cfg.output.object = o.clone();
        }
        cfg
    }
}

/// Optional per-invocation overrides, as posted to the function wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub catalogue_bucket: Option<String>,
    pub catalogue_file: Option<String>,
    pub source_bucket: Option<String>,
    pub source_file: Option<String>,
    pub destination_bucket: Option<String>,
    pub destination_file: Option<String>,
}

impl RunRequest {
    /// Blank or unparseable bodies mean "use the defaults".
    pub fn parse_lenient(body: &str) -> Self {
        if body.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str(body) {
            Ok(req) => req,
            Err(e) => {
                warn!(error = %e, "could not parse request body as JSON, using defaults");
                Self::default()
            }
        }
    }
}
