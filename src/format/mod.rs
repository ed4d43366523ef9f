//! Input format classification
//!
//! Classifies an input file by filename suffix alone (no content
//! sniffing): `.gz`/`.gzip` are compressed reads, `.fastq`/`.fq` plain
//! reads, `.fasta`/`.fa`/`.faa` assembled sequences. Anything else is
//! rejected before any stage runs.

use crate::PipelineError;
use std::path::Path;

/// Recognized input shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// gzip-compressed FASTQ reads
    GzFastq,

    /// Plain FASTQ reads
    PlainFastq,

    /// FASTA-like assembled sequences
    Fasta,
}

impl InputFormat {
    /// Whether the file needs gzip decompression before streaming
    pub fn is_compressed(self) -> bool {
        matches!(self, InputFormat::GzFastq)
    }

    /// Whether records carry per-base qualities (read format)
    pub fn is_read_format(self) -> bool {
        !matches!(self, InputFormat::Fasta)
    }
}

/// Classify a path by its filename suffix.
///
/// Matching is case-sensitive. For paired-end input the format is
/// detected from the forward file only; the reverse mate is trusted to
/// share it and is not independently validated.
pub fn detect_format(path: &Path) -> Result<InputFormat, PipelineError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if name.ends_with(".gz") || name.ends_with(".gzip") {
        Ok(InputFormat::GzFastq)
    } else if name.ends_with(".fastq") || name.ends_with(".fq") {
        Ok(InputFormat::PlainFastq)
    } else if name.ends_with(".fasta") || name.ends_with(".fa") || name.ends_with(".faa") {
        Ok(InputFormat::Fasta)
    } else {
        Err(PipelineError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }
}
