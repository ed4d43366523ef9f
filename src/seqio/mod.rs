//! Sequence records and readers
//!
//! Normalizes FASTA and FASTQ input (plain or gzip-compressed) into
//! [`SequenceRecord`] values that carry no format-specific metadata.
//! Readers operate over any [`BufRead`] so stages can consume files and
//! in-memory buffers alike.

use crate::format::InputFormat;
use crate::PipelineError;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

/// Identifier plus sequence, normalized from any supported source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    /// Record identifier (header line without its leading marker)
    pub id: String,

    /// Sequence string
    pub sequence: String,
}

impl SequenceRecord {
    /// Construct a record from its parts.
    pub fn new(id: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
        }
    }
}

/// Open a possibly-compressed input file as a buffered reader.
pub fn open_reader(path: &Path, format: InputFormat) -> Result<Box<dyn BufRead>, PipelineError> {
    let file = File::open(path)?;
    if format.is_compressed() {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read every record from `reader` according to `format`.
///
/// The gzip layer is already handled by [`open_reader`], so compressed
/// and plain FASTQ parse identically here.
pub fn read_records<R: BufRead>(
    reader: R,
    format: InputFormat,
) -> Result<Vec<SequenceRecord>, PipelineError> {
    match format {
        InputFormat::Fasta => read_fasta(reader),
        InputFormat::PlainFastq | InputFormat::GzFastq => read_fastq(reader),
    }
}

fn read_fasta<R: BufRead>(reader: R) -> Result<Vec<SequenceRecord>, PipelineError> {
    let mut records = Vec::new();
    let mut current: Option<SequenceRecord> = None;

    for line in reader.lines() {
        let line = line?;
        if let Some(header) = line.strip_prefix('>') {
            if let Some(record) = current.take() {
                records.push(record);
            }
            current = Some(SequenceRecord::new(header.trim(), String::new()));
        } else if let Some(record) = current.as_mut() {
            record.sequence.push_str(line.trim());
        } else if !line.trim().is_empty() {
            return Err(malformed("sequence data before first FASTA header"));
        }
    }

    if let Some(record) = current.take() {
        records.push(record);
    }
    Ok(records)
}

fn read_fastq<R: BufRead>(reader: R) -> Result<Vec<SequenceRecord>, PipelineError> {
    let mut records = Vec::new();
    let mut lines = reader.lines();

    // 4-line record discipline: @id, sequence, +, quality
    while let Some(header) = lines.next() {
        let header = header?;
        if header.trim().is_empty() {
            continue;
        }
        let id = header
            .strip_prefix('@')
            .ok_or_else(|| malformed("FASTQ header does not start with '@'"))?
            .trim()
            .to_string();

        let sequence = next_line(&mut lines, "sequence")?;
        let separator = next_line(&mut lines, "separator")?;
        if !separator.starts_with('+') {
            return Err(malformed("FASTQ separator does not start with '+'"));
        }
        let quality = next_line(&mut lines, "quality")?;
        if quality.len() != sequence.len() {
            return Err(malformed("FASTQ quality length differs from sequence length"));
        }

        records.push(SequenceRecord::new(id, sequence));
    }
    Ok(records)
}

fn next_line<R: BufRead>(
    lines: &mut io::Lines<R>,
    what: &str,
) -> Result<String, PipelineError> {
    match lines.next() {
        Some(line) => Ok(line?.trim_end().to_string()),
        None => Err(malformed(&format!("truncated FASTQ record: missing {what} line"))),
    }
}

fn malformed(message: &str) -> PipelineError {
    PipelineError::Io(io::Error::new(io::ErrorKind::InvalidData, message.to_string()))
}

/// Write records as FASTA, one sequence line per record.
pub fn write_fasta<W: Write>(out: &mut W, records: &[SequenceRecord]) -> io::Result<()> {
    for record in records {
        writeln!(out, ">{}", record.id)?;
        writeln!(out, "{}", record.sequence)?;
    }
    Ok(())
}
