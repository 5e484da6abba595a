pub mod catalogue;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod records;
pub mod response;
pub mod rules;
pub mod sink;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;

pub use catalogue::{RuleCatalogue, RuleCategory, RuleGroup, RuleRecord};
pub use config::{BlobLocation, PipelineConfig, RunRequest, StoreConfig};
pub use error::{
    CatalogueLoadError, PipelineError, RecordParseError, RuleEvaluationWarning, SinkWriteError,
    StoreError,
};
pub use pipeline::{PipelineController, RunStatus, RunSummary};
pub use records::{DataRow, RecordTable};
pub use response::GeneratedContent;
pub use rules::{
    annotate::{AnnotatedTable, AnnotationEngine, NO_ISSUES, RAG_TRIGGER_COLUMN},
    evaluate::{ConditionMatcher, Evaluation, RuleEvaluator, SubstringMatcher, Trigger},
};
pub use store::{BlobStore, LocalBlobStore, MemoryBlobStore};
