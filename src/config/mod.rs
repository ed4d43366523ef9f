//! Run configuration
//!
//! [`PipelineConfig`] is the single immutable record of every
//! user-resolvable setting. It is constructed exactly once through the
//! fluent builder, whose `build()` enforces every invariant and names
//! the violated one; after that no component mutates shared state.

use crate::PipelineError;
use std::path::{Path, PathBuf};

/// Selector for the profile-model database used by the search stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelLevel {
    /// Level 1: baseline model database
    One,
    /// Level 2: extended model database
    Two,
    /// Level 3: full model database
    Three,
}

impl ModelLevel {
    /// Model database filename inside the model directory.
    pub fn model_file(self) -> &'static str {
        match self {
            ModelLevel::One => "model_a.hmm",
            ModelLevel::Two => "model_b.hmm",
            ModelLevel::Three => "model_c.hmm",
        }
    }

    /// Integer form, as passed to the parser tool.
    pub fn as_u8(self) -> u8 {
        match self {
            ModelLevel::One => 1,
            ModelLevel::Two => 2,
            ModelLevel::Three => 3,
        }
    }

    /// SNP detection is only meaningful against the extended databases.
    pub fn supports_snp(self) -> bool {
        !matches!(self, ModelLevel::One)
    }
}

/// Input reads: exactly one of the two shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// One single-end reads file
    Single(PathBuf),

    /// Forward/reverse mate pair
    Paired {
        /// Forward (R1) reads; its suffix drives format detection
        forward: PathBuf,
        /// Reverse (R2) reads; trusted to share the forward format
        reverse: PathBuf,
    },
}

impl InputSource {
    /// File whose suffix drives format detection.
    pub fn primary(&self) -> &Path {
        match self {
            InputSource::Single(path) => path,
            InputSource::Paired { forward, .. } => forward,
        }
    }

    /// All input paths in mate order.
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            InputSource::Single(path) => vec![path],
            InputSource::Paired { forward, reverse } => vec![forward, reverse],
        }
    }

    /// Whether this is a forward/reverse pair.
    pub fn is_paired(&self) -> bool {
        matches!(self, InputSource::Paired { .. })
    }
}

/// External collaborator binaries, overridable for non-PATH installs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// k-mer prescreen filter (stdin → stdout)
    pub prescreen: PathBuf,
    /// Profile-model search tool
    pub search: PathBuf,
    /// Hit-report parser
    pub parser: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            prescreen: PathBuf::from("prescreen"),
            search: PathBuf::from("psearch"),
            parser: PathBuf::from("phitparse"),
        }
    }
}

/// One unit of pipeline work producing a durable artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// Exact-duplicate collapsing
    Dedup,
    /// k-mer prescreen filter
    Prescreen,
    /// Profile-model search
    Search,
    /// Hit-report parsing
    Parse,
}

impl StageKind {
    /// Stage name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            StageKind::Dedup => "dedup",
            StageKind::Prescreen => "prescreen",
            StageKind::Search => "search",
            StageKind::Parse => "parse",
        }
    }
}

/// Immutable record of all user-resolvable pipeline settings
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    input: InputSource,
    out_dir: PathBuf,
    basename: String,
    model_level: ModelLevel,
    coverage: f64,
    evalue: f64,
    kmer: u32,
    threads: u32,
    dedup: bool,
    multi_hit: bool,
    snp_search: bool,
    skew_out: Option<PathBuf>,
    graph_dir: Option<PathBuf>,
    snp_report: Option<PathBuf>,
    snp_fasta: Option<PathBuf>,
    model_dir: PathBuf,
    tools: ToolPaths,
}

impl PipelineConfig {
    /// Create fluent builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// Input reads
    pub fn input(&self) -> &InputSource {
        &self.input
    }

    /// Output directory all artifacts are written under
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Basename shared by every artifact filename
    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// Model database selector
    pub fn model_level(&self) -> ModelLevel {
        self.model_level
    }

    /// Coverage threshold in (0, 100]
    pub fn coverage(&self) -> f64 {
        self.coverage
    }

    /// E-value threshold for the parse stage
    pub fn evalue(&self) -> f64 {
        self.evalue
    }

    /// k-mer size in [0, 35]; 0 disables prescreening
    pub fn kmer(&self) -> u32 {
        self.kmer
    }

    /// Thread count handed through to the external tools
    pub fn threads(&self) -> u32 {
        self.threads
    }

    /// Whether the deduplication stage runs
    pub fn dedup(&self) -> bool {
        self.dedup
    }

    /// Whether the parser applies multi-hit correction
    pub fn multi_hit(&self) -> bool {
        self.multi_hit
    }

    /// Whether the parser performs SNP detection
    pub fn snp_search(&self) -> bool {
        self.snp_search
    }

    /// Skewness output path (paired with `graph_dir`)
    pub fn skew_out(&self) -> Option<&Path> {
        self.skew_out.as_deref()
    }

    /// Graph output directory (paired with `skew_out`)
    pub fn graph_dir(&self) -> Option<&Path> {
        self.graph_dir.as_deref()
    }

    /// SNP report path (requires `snp_search`)
    pub fn snp_report(&self) -> Option<&Path> {
        self.snp_report.as_deref()
    }

    /// SNP FASTA path (requires `snp_search`)
    pub fn snp_fasta(&self) -> Option<&Path> {
        self.snp_fasta.as_deref()
    }

    /// Directory holding the model databases, prescreen templates and
    /// annotation reference
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// External collaborator binaries
    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// Linear stage ordering derived from the flags; never stored.
    pub fn stage_graph(&self) -> Vec<StageKind> {
        let mut stages = Vec::with_capacity(4);
        if self.dedup {
            stages.push(StageKind::Dedup);
        }
        if self.kmer > 0 {
            stages.push(StageKind::Prescreen);
        }
        stages.push(StageKind::Search);
        stages.push(StageKind::Parse);
        stages
    }

    /// `<outdir>/<basename>_screened.fasta`
    pub fn screened_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}_screened.fasta", self.basename))
    }

    /// `<outdir>/duplicate_tables`
    pub fn dup_table_dir(&self) -> PathBuf {
        self.out_dir.join("duplicate_tables")
    }

    /// `<outdir>/duplicate_tables/<basename>_dupcounts.txt`
    pub fn dup_table_path(&self) -> PathBuf {
        self.dup_table_dir()
            .join(format!("{}_dupcounts.txt", self.basename))
    }

    /// `<outdir>/<basename>_dedup.fasta`
    pub fn dedup_fasta_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}_dedup.fasta", self.basename))
    }

    /// `<outdir>/<basename>_pooled.fasta` (mate pooling / FASTA
    /// normalization when no earlier stage produced one)
    pub fn pooled_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}_pooled.fasta", self.basename))
    }

    /// `<outdir>/<basename>.tblout.scan`
    pub fn tblout_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}.tblout.scan", self.basename))
    }

    /// `<outdir>/<basename>_parsed.csv`
    pub fn report_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}_parsed.csv", self.basename))
    }

    /// Model database selected by the model level
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(self.model_level.model_file())
    }

    /// Reference template set consumed by the prescreen tool
    pub fn templates_path(&self) -> PathBuf {
        self.model_dir.join("templates.fasta")
    }

    /// Annotation reference consumed by the parser tool
    pub fn annotation_path(&self) -> PathBuf {
        self.model_dir.join("annotation.tsv")
    }
}

/// Builder for [`PipelineConfig`] (fluent API)
///
/// All invariant checking happens in [`build`](Self::build) so a caller
/// can wire options straight through from the CLI and get one
/// configuration error naming the violated invariant.
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    single: Option<PathBuf>,
    forward: Option<PathBuf>,
    reverse: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    basename: Option<String>,
    model_level: u8,
    coverage: f64,
    evalue: f64,
    kmer: u32,
    threads: u32,
    dedup: bool,
    multi_hit: bool,
    snp_search: bool,
    skew_out: Option<PathBuf>,
    graph_dir: Option<PathBuf>,
    snp_report: Option<PathBuf>,
    snp_fasta: Option<PathBuf>,
    model_dir: Option<PathBuf>,
    tools: ToolPaths,
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineConfigBuilder {
    /// Create a builder with the default thresholds.
    pub fn new() -> Self {
        Self {
            single: None,
            forward: None,
            reverse: None,
            out_dir: None,
            basename: None,
            model_level: 1,
            coverage: 80.0,
            evalue: 1e-5,
            kmer: 0,
            threads: 1,
            dedup: false,
            multi_hit: false,
            snp_search: false,
            skew_out: None,
            graph_dir: None,
            snp_report: None,
            snp_fasta: None,
            model_dir: None,
            tools: ToolPaths::default(),
        }
    }

    /// Set the single-end input file.
    pub fn single_end(mut self, path: impl Into<PathBuf>) -> Self {
        self.single = Some(path.into());
        self
    }

    /// Set the forward (R1) reads of a pair.
    pub fn forward(mut self, path: impl Into<PathBuf>) -> Self {
        self.forward = Some(path.into());
        self
    }

    /// Set the reverse (R2) reads of a pair.
    pub fn reverse(mut self, path: impl Into<PathBuf>) -> Self {
        self.reverse = Some(path.into());
        self
    }

    /// Set the output directory.
    pub fn out_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(path.into());
        self
    }

    /// Set the artifact basename.
    pub fn basename(mut self, name: impl Into<String>) -> Self {
        self.basename = Some(name.into());
        self
    }

    /// Set the model level (1, 2 or 3).
    pub fn model_level(mut self, level: u8) -> Self {
        self.model_level = level;
        self
    }

    /// Set the coverage threshold.
    pub fn coverage(mut self, coverage: f64) -> Self {
        self.coverage = coverage;
        self
    }

    /// Set the e-value threshold.
    pub fn evalue(mut self, evalue: f64) -> Self {
        self.evalue = evalue;
        self
    }

    /// Set the k-mer size (0 disables prescreening).
    pub fn kmer(mut self, kmer: u32) -> Self {
        self.kmer = kmer;
        self
    }

    /// Set the external tool thread count.
    pub fn threads(mut self, threads: u32) -> Self {
        self.threads = threads;
        self
    }

    /// Enable or disable deduplication.
    pub fn dedup(mut self, on: bool) -> Self {
        self.dedup = on;
        self
    }

    /// Enable or disable multi-hit correction.
    pub fn multi_hit(mut self, on: bool) -> Self {
        self.multi_hit = on;
        self
    }

    /// Enable or disable SNP detection.
    pub fn snp_search(mut self, on: bool) -> Self {
        self.snp_search = on;
        self
    }

    /// Set the skewness output path.
    pub fn skew_out(mut self, path: impl Into<PathBuf>) -> Self {
        self.skew_out = Some(path.into());
        self
    }

    /// Set the graph output directory.
    pub fn graph_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.graph_dir = Some(path.into());
        self
    }

    /// Set the SNP report path.
    pub fn snp_report(mut self, path: impl Into<PathBuf>) -> Self {
        self.snp_report = Some(path.into());
        self
    }

    /// Set the SNP FASTA path.
    pub fn snp_fasta(mut self, path: impl Into<PathBuf>) -> Self {
        self.snp_fasta = Some(path.into());
        self
    }

    /// Set the model directory.
    pub fn model_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_dir = Some(path.into());
        self
    }

    /// Override the external collaborator binaries.
    pub fn tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    /// Validate every invariant and build the immutable configuration.
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        let input = self.resolve_input()?;

        let out_dir = self
            .out_dir
            .ok_or_else(|| config_err("no output directory supplied"))?;
        let basename = self
            .basename
            .ok_or_else(|| config_err("no output basename supplied"))?;
        if basename.is_empty() {
            return Err(config_err("output basename is empty"));
        }

        let model_level = match self.model_level {
            1 => ModelLevel::One,
            2 => ModelLevel::Two,
            3 => ModelLevel::Three,
            other => {
                return Err(config_err(&format!(
                    "model level {other} outside {{1, 2, 3}}"
                )))
            }
        };

        if !(self.coverage > 0.0 && self.coverage <= 100.0) {
            return Err(config_err(&format!(
                "coverage threshold {} outside (0, 100]",
                self.coverage
            )));
        }
        if !self.evalue.is_finite() || self.evalue <= 0.0 {
            return Err(config_err(&format!(
                "e-value threshold {} is not a positive finite number",
                self.evalue
            )));
        }
        if self.kmer > 35 {
            return Err(config_err(&format!(
                "k-mer size {} outside [0, 35]",
                self.kmer
            )));
        }
        if self.threads == 0 {
            return Err(config_err("thread count must be at least 1"));
        }

        match (&self.skew_out, &self.graph_dir) {
            (Some(_), None) => {
                return Err(config_err(
                    "skewness output supplied without a graph directory",
                ))
            }
            (None, Some(_)) => {
                return Err(config_err(
                    "graph directory supplied without a skewness output",
                ))
            }
            _ => {}
        }

        if !self.snp_search {
            if self.snp_report.is_some() {
                return Err(config_err("SNP report path requires SNP search"));
            }
            if self.snp_fasta.is_some() {
                return Err(config_err("SNP FASTA path requires SNP search"));
            }
        } else if !model_level.supports_snp() {
            return Err(config_err("SNP search requires model level 2 or 3"));
        }

        Ok(PipelineConfig {
            input,
            out_dir,
            basename,
            model_level,
            coverage: self.coverage,
            evalue: self.evalue,
            kmer: self.kmer,
            threads: self.threads,
            dedup: self.dedup,
            multi_hit: self.multi_hit,
            snp_search: self.snp_search,
            skew_out: self.skew_out,
            graph_dir: self.graph_dir,
            snp_report: self.snp_report,
            snp_fasta: self.snp_fasta,
            model_dir: self.model_dir.unwrap_or_else(|| PathBuf::from("models")),
            tools: self.tools,
        })
    }

    fn resolve_input(&self) -> Result<InputSource, PipelineError> {
        let paired = self.forward.is_some() || self.reverse.is_some();
        match (&self.single, paired) {
            (Some(_), true) => Err(config_err(
                "both single-end and paired-end inputs supplied",
            )),
            (Some(single), false) => Ok(InputSource::Single(single.clone())),
            (None, true) => match (&self.forward, &self.reverse) {
                (Some(forward), Some(reverse)) => Ok(InputSource::Paired {
                    forward: forward.clone(),
                    reverse: reverse.clone(),
                }),
                (Some(_), None) => Err(config_err("paired-end input missing the reverse mate")),
                (None, Some(_)) => Err(config_err("paired-end input missing the forward mate")),
                (None, None) => unreachable!("paired implies one mate set"),
            },
            (None, false) => Err(config_err(
                "no input supplied; expected one single-end file or a forward/reverse pair",
            )),
        }
    }
}

fn config_err(message: &str) -> PipelineError {
    PipelineError::Configuration(message.to_string())
}
