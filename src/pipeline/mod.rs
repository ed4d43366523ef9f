//! Pipeline orchestration state machine
//!
//! Drives `Validating → Detecting-Format → (Deduplicating) →
//! (Prescreening) → Searching → Parsing → Done`, with `Failed` terminal
//! from any state. Stages execute strictly in sequence because each
//! consumes the previous stage's artifact; parallelism belongs to the
//! external tools via the pass-through thread count.
//!
//! Each stage runs through the existence-based cache, so a re-run against
//! a populated output directory only executes the missing tail of the
//! stage sequence. A re-run that finds the final report present performs
//! no work at all.

mod tools;

use crate::cache::{run_cached, StageArtifact, StageStatus};
use crate::config::{PipelineConfig, StageKind};
use crate::dedup;
use crate::format::{detect_format, InputFormat};
use crate::seqio;
use crate::PipelineError;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Orchestrator states; `Failed` is reachable from every other state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Enforcing configuration invariants
    Validating,
    /// Resolving the input shape
    DetectingFormat,
    /// Collapsing exact duplicates
    Deduplicating,
    /// k-mer filtering against the template set
    Prescreening,
    /// Profile-model search
    Searching,
    /// Hit-report parsing
    Parsing,
    /// Pipeline completed
    Done,
    /// Unrecoverable error; surfaced with the originating stage
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Validating => "validating",
            PipelineState::DetectingFormat => "detecting-format",
            PipelineState::Deduplicating => "deduplicating",
            PipelineState::Prescreening => "prescreening",
            PipelineState::Searching => "searching",
            PipelineState::Parsing => "parsing",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of one completed orchestrator run
#[derive(Debug, Clone)]
pub struct RunReport {
    states: Vec<PipelineState>,
    outcomes: Vec<(StageKind, StageStatus)>,
    report: PathBuf,
}

impl RunReport {
    /// States visited in order, ending with [`PipelineState::Done`]
    pub fn states(&self) -> &[PipelineState] {
        &self.states
    }

    /// Per-stage outcome in execution order
    pub fn outcomes(&self) -> &[(StageKind, StageStatus)] {
        &self.outcomes
    }

    /// Final report artifact path
    pub fn report(&self) -> &Path {
        &self.report
    }

    /// Whether every stage was satisfied from cache
    pub fn fully_skipped(&self) -> bool {
        self.outcomes
            .iter()
            .all(|(_, status)| *status == StageStatus::Skipped)
    }
}

/// Top-level pipeline driver
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline over a validated configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The configuration this pipeline runs under
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Drive the stage sequence to completion.
    ///
    /// Every fatal condition is terminal; no stage is retried. Artifacts
    /// produced before a failure stay on disk for the corrected re-run.
    pub fn run(&self) -> Result<RunReport, PipelineError> {
        let mut states = Vec::new();
        let mut outcomes = Vec::new();

        match self.execute(&mut states, &mut outcomes) {
            Ok(report) => {
                states.push(PipelineState::Done);
                info!(report = %report.display(), "pipeline complete");
                Ok(RunReport {
                    states,
                    outcomes,
                    report,
                })
            }
            Err(err) => {
                let at = states.last().copied().unwrap_or(PipelineState::Validating);
                states.push(PipelineState::Failed);
                error!(state = %at, error = %err, "pipeline failed");
                Err(err)
            }
        }
    }

    fn execute(
        &self,
        states: &mut Vec<PipelineState>,
        outcomes: &mut Vec<(StageKind, StageStatus)>,
    ) -> Result<PathBuf, PipelineError> {
        let config = &self.config;

        // Invariants were enforced when the configuration was built; the
        // state marks the boundary before any filesystem work.
        states.push(PipelineState::Validating);

        states.push(PipelineState::DetectingFormat);
        let format = detect_format(config.input().primary())?;
        info!(
            format = ?format,
            paired = config.input().is_paired(),
            input = %config.input().primary().display(),
            "input classified"
        );

        fs::create_dir_all(config.out_dir())?;

        let report_artifact = StageArtifact::new("parsed-report", config.report_path());

        // A present final report short-circuits the whole stage sequence:
        // zero child processes, immediate success.
        if report_artifact.exists() {
            info!(
                report = %report_artifact.path().display(),
                "final report already present, skipping all stages"
            );
            outcomes.extend(
                config
                    .stage_graph()
                    .into_iter()
                    .map(|stage| (stage, StageStatus::Skipped)),
            );
            return Ok(report_artifact.path().to_path_buf());
        }

        // Live input handed to the next stage; starts as the raw reads
        // and is replaced by each intermediate artifact.
        let mut live_paths: Vec<PathBuf> = config
            .input()
            .paths()
            .into_iter()
            .map(Path::to_path_buf)
            .collect();
        let mut live_format = format;
        let mut dup_table: Option<PathBuf> = None;

        if config.dedup() {
            states.push(PipelineState::Deduplicating);
            let artifact = StageArtifact::new("dedup-representatives", config.dedup_fasta_path());
            let status = run_cached(StageKind::Dedup.name(), &artifact, || {
                fs::create_dir_all(config.dup_table_dir())?;
                let inputs: Vec<&Path> = live_paths.iter().map(PathBuf::as_path).collect();
                dedup::run_stage(&inputs, live_format, &config.dup_table_path(), artifact.path())
            })?;
            info!(status = ?status, artifact = %artifact.path().display(), "deduplication finished");
            outcomes.push((StageKind::Dedup, status));
            live_paths = vec![artifact.path().to_path_buf()];
            live_format = InputFormat::Fasta;
            dup_table = Some(config.dup_table_path());
        }

        if config.kmer() > 0 {
            states.push(PipelineState::Prescreening);
            let artifact = StageArtifact::new("screened-sequences", config.screened_path());
            let status = run_cached(StageKind::Prescreen.name(), &artifact, || {
                tools::run_prescreen(config, &live_paths, live_format, artifact.path())
            })?;
            info!(status = ?status, artifact = %artifact.path().display(), "prescreen finished");
            outcomes.push((StageKind::Prescreen, status));
            live_paths = vec![artifact.path().to_path_buf()];
            live_format = InputFormat::Fasta;
        }

        states.push(PipelineState::Searching);
        let search_input = self.normalize_search_input(&live_paths, live_format)?;
        let tblout = StageArtifact::new("hit-report", config.tblout_path());
        let status = run_cached(StageKind::Search.name(), &tblout, || {
            tools::run_search(config, &search_input, tblout.path())
        })?;
        info!(status = ?status, artifact = %tblout.path().display(), "search finished");
        outcomes.push((StageKind::Search, status));

        states.push(PipelineState::Parsing);
        let status = run_cached(StageKind::Parse.name(), &report_artifact, || {
            tools::run_parser(
                config,
                tblout.path(),
                dup_table.as_deref(),
                report_artifact.path(),
            )
        })?;
        info!(status = ?status, artifact = %report_artifact.path().display(), "parse finished");
        outcomes.push((StageKind::Parse, status));

        Ok(report_artifact.path().to_path_buf())
    }

    /// The search tool consumes exactly one FASTA file. When the live
    /// input is already a single FASTA it passes through untouched;
    /// otherwise (raw paired mates, or raw FASTQ that no earlier stage
    /// normalized) the mates are pooled and rewritten as FASTA at a
    /// cached artifact path.
    fn normalize_search_input(
        &self,
        live_paths: &[PathBuf],
        live_format: InputFormat,
    ) -> Result<PathBuf, PipelineError> {
        if live_paths.len() == 1 && live_format == InputFormat::Fasta {
            return Ok(live_paths[0].clone());
        }

        let config = &self.config;
        let pooled = StageArtifact::new("pooled-input", config.pooled_path());
        run_cached(StageKind::Search.name(), &pooled, || {
            let mut records = Vec::new();
            for path in live_paths {
                let reader = seqio::open_reader(path, live_format)?;
                records.extend(seqio::read_records(reader, live_format)?);
            }
            let mut out = BufWriter::new(File::create(pooled.path())?);
            seqio::write_fasta(&mut out, &records)?;
            out.flush()?;
            Ok(())
        })?;
        debug!(pooled = %pooled.path().display(), "search input normalized");
        Ok(pooled.path().to_path_buf())
    }
}
