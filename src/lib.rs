//! # seqscan
//!
//! Orchestrates a multi-stage profile-model search pipeline over raw
//! sequencing reads:
//!
//! 1. **Format detection**: classify the input as plain/gzipped FASTQ or FASTA
//! 2. **Deduplication** (optional): collapse exact-duplicate sequences
//! 3. **Prescreen** (optional): k-mer filter against a reference template set
//! 4. **Search**: profile-model scan by the external search tool
//! 5. **Parse**: hit-report reduction into the final CSV report
//!
//! Every stage writes a durable artifact into the output directory and is
//! memoized by artifact existence, so re-running against the same output
//! directory skips completed work. Stages run strictly in sequence; the
//! external tools own all parallelism via the pass-through thread count.
//!
//! ## Usage Example
//!
//! ```ignore
//! use seqscan::{ModelLevel, Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .single_end("reads.fastq")
//!     .out_dir("out")
//!     .basename("sample1")
//!     .model_level(2)
//!     .dedup(true)
//!     .build()?;
//! let report = Pipeline::new(config).run()?;
//! println!("report written to {}", report.report().display());
//! ```

#![warn(missing_docs, missing_debug_implementations)]

// Core modules - leaves first, orchestrator last
pub mod format;   // Suffix-based input classification
pub mod seqio;    // Sequence records and FASTA/FASTQ readers
pub mod dedup;    // Exact-duplicate collapsing stage
pub mod compose;  // Declarative external-command composition
pub mod cache;    // Existence-based stage memoization
pub mod config;   // Immutable run configuration and stage graph
pub mod pipeline; // Top-level orchestrator state machine

// Re-exports for convenience
pub use cache::{StageArtifact, StageStatus};
pub use compose::CommandSpec;
pub use config::{InputSource, ModelLevel, PipelineConfig, PipelineConfigBuilder, StageKind, ToolPaths};
pub use dedup::DuplicateTable;
pub use format::InputFormat;
pub use pipeline::{Pipeline, PipelineState, RunReport};
pub use seqio::SequenceRecord;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while configuring or running the pipeline
///
/// Every variant is fatal: errors are raised as close to their source
/// stage as possible and immediately halt the run. Artifacts produced by
/// earlier successful stages stay on disk and are reused on a re-run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration invariant violated; raised before any stage runs
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Input filename suffix matches no recognized sequence format
    #[error("unsupported input format: {}", path.display())]
    UnsupportedFormat {
        /// Offending input path
        path: PathBuf,
    },

    /// External collaborator missing or exited non-zero
    #[error("external tool failure in {stage} stage: {message}")]
    ExternalTool {
        /// Stage that invoked the tool
        stage: &'static str,
        /// What went wrong (launch failure or exit status)
        message: String,
    },

    /// Stage body completed but its declared artifact is absent
    #[error("cache inconsistency in {stage} stage: missing artifact {}", path.display())]
    CacheInconsistency {
        /// Stage that was expected to produce the artifact
        stage: &'static str,
        /// Declared artifact path that does not exist
        path: PathBuf,
    },

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
