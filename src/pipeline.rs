use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::{
    catalogue::RuleCatalogue,
    config::PipelineConfig,
    error::PipelineError,
    records::RecordTable,
    rules::{
        annotate::AnnotationEngine,
        evaluate::{ConditionMatcher, SubstringMatcher},
    },
    sink::ResultSink,
    store::BlobStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// What the function wrapper returns to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub status: RunStatus,
    #[serde(rename = "processed_rows")]
    pub processed_row_count: usize,
    #[serde(rename = "output_file")]
    pub output_location: String,
    pub message: String,
}

impl RunSummary {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Error,
            processed_row_count: 0,
            output_location: String::new(),
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"status":"error","processed_rows":0,"output_file":"","message":"summary serialisation failed: {}"}}"#,
                e
            )
        })
    }
}

/// Loads the catalogue and records, annotates, writes. One instance can be
/// run any number of times; nothing is cached between runs.
pub struct PipelineController<S: BlobStore, M: ConditionMatcher = SubstringMatcher> {
    config: PipelineConfig,
    store: S,
    matcher: M,
}

impl<S: BlobStore> PipelineController<S, SubstringMatcher> {
    pub fn new(config: PipelineConfig, store: S) -> Self {
        Self {
            config,
            store,
            matcher: SubstringMatcher,
        }
    }
}

impl<S: BlobStore, M: ConditionMatcher> PipelineController<S, M> {
    pub fn with_matcher(config: PipelineConfig, store: S, matcher: M) -> Self {
        Self {
            config,
            store,
            matcher,
        }
    }

    /// Never fails: every error comes back as a `status: error` summary.
    #[instrument(level = "info", skip(self), fields(output = %self.config.output))]
    pub fn run(&self) -> RunSummary {
        let start = Instant::now();
        match self.execute() {
            Ok(summary) => {
                info!(
                    rows = summary.processed_row_count,
                    elapsed = ?start.elapsed(),
                    "run complete"
                );
                summary
            }
            Err(e) => {
                error!(error = %e, elapsed = ?start.elapsed(), "run failed");
                RunSummary::error(e.to_string())
            }
        }
    }

    fn execute(&self) -> Result<RunSummary, PipelineError> {
        let cfg = &self.config;

        let catalogue_bytes =
            self.store
                .read(&cfg.catalogue)
                .map_err(|source| PipelineError::FetchCatalogue {
                    location: cfg.catalogue.clone(),
                    source,
                })?;
        let catalogue = RuleCatalogue::load(&catalogue_bytes)?;

        let record_bytes =
            self.store
                .read(&cfg.records)
                .map_err(|source| PipelineError::FetchRecords {
                    location: cfg.records.clone(),
                    source,
                })?;
        let table = RecordTable::from_bytes(&record_bytes)?;
        info!(
            groups = catalogue.len(),
            rows = table.len(),
            "inputs loaded"
        );

        let annotated = AnnotationEngine::with_matcher(&catalogue, &self.matcher)
            .parallel(cfg.parallel)
            .annotate(&table);

        ResultSink::new(&self.store, &cfg.output_content_type).write(&cfg.output, &annotated)?;

        let mut message = format!(
            "Annotated {} rows, {} flagged",
            annotated.rows.len(),
            annotated.flagged_rows
        );
        if !annotated.warnings.is_empty() {
            message.push_str(&format!(
                "; {} rule(s) skipped as unusable",
                annotated.warnings.len()
            ));
        }

        Ok(RunSummary {
            status: RunStatus::Success,
            processed_row_count: annotated.rows.len(),
            output_location: cfg.output.to_string(),
            message,
        })
    }
}
