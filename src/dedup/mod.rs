//! Exact-duplicate collapsing
//!
//! Reduces the input multiset of sequences (identifiers ignored, both
//! mates of a pair pooled into one stream) to a frequency table plus one
//! representative record per unique sequence. Grouping is an exact string
//! reduction; output order is lexicographic by sequence, never input
//! order, which makes the stage deterministic and content-addressed.

use crate::format::InputFormat;
use crate::seqio::{self, SequenceRecord};
use crate::PipelineError;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Mapping from unique sequence to its occurrence count
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateTable {
    counts: BTreeMap<String, u64>,
}

impl DuplicateTable {
    /// Build the table from an iterator of raw sequence strings.
    pub fn from_sequences<I>(sequences: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut counts = BTreeMap::new();
        for sequence in sequences {
            *counts.entry(sequence).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Occurrence count for a sequence (0 when absent)
    pub fn count(&self, sequence: &str) -> u64 {
        self.counts.get(sequence).copied().unwrap_or(0)
    }

    /// Number of unique sequences
    pub fn unique_len(&self) -> usize {
        self.counts.len()
    }

    /// Total number of input sequences (sum of counts)
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Whether the table holds no sequences
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterate `(sequence, count)` in lexicographic sequence order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(seq, count)| (seq.as_str(), *count))
    }

    /// Persist as TSV (`sequence<TAB>count`, lexicographic order).
    pub fn write_tsv<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (sequence, count) in self.iter() {
            writeln!(out, "{sequence}\t{count}")?;
        }
        Ok(())
    }
}

/// Collapse records into the frequency table and one representative
/// record per unique sequence.
///
/// Representative headers carry rank and multiplicity (`seq3_x17`); the
/// multiplicity consumed downstream comes from the table artifact, not
/// the headers.
pub fn collapse(records: Vec<SequenceRecord>) -> (DuplicateTable, Vec<SequenceRecord>) {
    let table = DuplicateTable::from_sequences(records.into_iter().map(|r| r.sequence));
    let representatives = table
        .iter()
        .enumerate()
        .map(|(rank, (sequence, count))| {
            SequenceRecord::new(format!("seq{}_x{}", rank + 1, count), sequence)
        })
        .collect();
    (table, representatives)
}

/// Run the stage body: pool all inputs, collapse, write both artifacts.
///
/// The representative FASTA is the cache signal for this stage; the table
/// is written first so an interrupted run never leaves the signal without
/// the table.
pub fn run_stage(
    inputs: &[&Path],
    format: InputFormat,
    table_path: &Path,
    fasta_path: &Path,
) -> Result<(), PipelineError> {
    let mut records = Vec::new();
    for path in inputs {
        let reader = seqio::open_reader(path, format)?;
        records.extend(seqio::read_records(reader, format)?);
    }

    let (table, representatives) = collapse(records);

    let mut table_out = BufWriter::new(File::create(table_path)?);
    table.write_tsv(&mut table_out)?;
    table_out.flush()?;

    let mut fasta_out = BufWriter::new(File::create(fasta_path)?);
    seqio::write_fasta(&mut fasta_out, &representatives)?;
    fasta_out.flush()?;

    Ok(())
}
