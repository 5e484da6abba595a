use std::path::PathBuf;

use thiserror::Error;

use crate::config::BlobLocation;

/// The rule workbook could not be read as a spreadsheet archive.
#[derive(Debug, Error)]
pub enum CatalogueLoadError {
    #[error("failed to open rule workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("failed to read sheet `{sheet}`: {source}")]
    Sheet {
        sheet: String,
        source: calamine::XlsxError,
    },
}

/// The record source text could not be turned into a header plus rows.
#[derive(Debug, Error)]
pub enum RecordParseError {
    #[error("record source is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("record source has no header line")]
    MissingHeader,
}

/// One rule could not be applied. Recorded and skipped, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Error)]
#[error("rule {rule_id:?} (record {position}) in `{group}` skipped: {reason}")]
pub struct RuleEvaluationWarning {
    pub group: String,
    /// Zero-based index into the group's records. Blank sheet rows are
    /// dropped at load and not counted; a header row is index 0.
    pub position: usize,
    pub rule_id: String,
    pub reason: String,
}

/// Failures reported by a blob-store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object {location} not found")]
    NotFound { location: BlobLocation },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("storage backend error on {location}: {message}")]
    Backend {
        location: BlobLocation,
        message: String,
    },
}

/// The annotated table could not be handed to the blob store.
#[derive(Debug, Error)]
#[error("failed to write annotated table to {location}: {source}")]
pub struct SinkWriteError {
    pub location: BlobLocation,
    pub source: StoreError,
}

/// Every failure that aborts a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("catalogue unreadable at {location}: {source}")]
    FetchCatalogue {
        location: BlobLocation,
        source: StoreError,
    },

    #[error("record source unreadable at {location}: {source}")]
    FetchRecords {
        location: BlobLocation,
        source: StoreError,
    },

    #[error(transparent)]
    Catalogue(#[from] CatalogueLoadError),

    #[error(transparent)]
    Records(#[from] RecordParseError),

    #[error(transparent)]
    Sink(#[from] SinkWriteError),
}
