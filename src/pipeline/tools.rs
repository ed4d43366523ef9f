//! External collaborator invocation
//!
//! Spawns the three external tools as blocking child processes. A
//! missing binary or a non-zero exit is fatal and surfaced with the
//! invoking stage's name; nothing is retried. There is no timeout: a
//! hung tool hangs the pipeline, by contract.

use crate::compose::CommandSpec;
use crate::config::PipelineConfig;
use crate::format::InputFormat;
use crate::seqio;
use crate::PipelineError;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::info;

/// Run the prescreen filter: sequence stream on stdin, filtered FASTA on
/// stdout, redirected to the screened artifact path.
pub(crate) fn run_prescreen(
    config: &PipelineConfig,
    inputs: &[PathBuf],
    format: InputFormat,
    out_path: &Path,
) -> Result<(), PipelineError> {
    let program = &config.tools().prescreen;
    let args = CommandSpec::new(program.display().to_string())
        .option("templates", "--templates", Some(config.templates_path().display()))
        .option("kmer", "--kmer", Some(config.kmer()))
        .option("threads", "--threads", Some(config.threads()))
        .compose()?;

    info!(tool = %program.display(), kmer = config.kmer(), "launching prescreen");
    let out_file = File::create(out_path)?;
    let mut child = Command::new(program)
        .args(&args)
        .stdin(Stdio::piped())
        .stdout(out_file)
        .spawn()
        .map_err(|err| launch_error("prescreen", program, &err))?;

    {
        let mut stdin = child.stdin.take().ok_or_else(|| PipelineError::ExternalTool {
            stage: "prescreen",
            message: "child stdin unavailable".to_string(),
        })?;
        for path in inputs {
            let mut reader = seqio::open_reader(path, format)?;
            io::copy(&mut reader, &mut stdin)?;
        }
        // stdin drops here, signalling end of stream
    }

    let status = child.wait()?;
    if !status.success() {
        return Err(exit_error("prescreen", program, status));
    }
    Ok(())
}

/// Run the profile-model search against the selected model database.
///
/// The tool writes its tabular hit report to the `--tblout` path itself;
/// chatter on stdout is discarded.
pub(crate) fn run_search(
    config: &PipelineConfig,
    sequences: &Path,
    tblout: &Path,
) -> Result<(), PipelineError> {
    let program = &config.tools().search;
    let model = config.model_path();
    if !model.exists() {
        return Err(PipelineError::ExternalTool {
            stage: "search",
            message: format!("model database not found: {}", model.display()),
        });
    }

    let args = CommandSpec::new(program.display().to_string())
        .option("cpu", "--cpu", Some(config.threads()))
        .option("tblout", "--tblout", Some(tblout.display()))
        .arg(model.display().to_string())
        .arg(sequences.display().to_string())
        .compose()?;

    info!(tool = %program.display(), model = %model.display(), "launching search");
    let status = Command::new(program)
        .args(&args)
        .stdout(Stdio::null())
        .status()
        .map_err(|err| launch_error("search", program, &err))?;
    if !status.success() {
        return Err(exit_error("search", program, status));
    }
    Ok(())
}

/// Run the hit-report parser: hit report on stdin, final CSV on stdout,
/// redirected to the report artifact path.
pub(crate) fn run_parser(
    config: &PipelineConfig,
    tblout: &Path,
    dup_table: Option<&Path>,
    report: &Path,
) -> Result<(), PipelineError> {
    let program = &config.tools().parser;
    let args = parser_args(config, dup_table)?;

    info!(tool = %program.display(), "launching parser");
    let stdin_file = File::open(tblout)?;
    let stdout_file = File::create(report)?;
    let status = Command::new(program)
        .args(&args)
        .stdin(stdin_file)
        .stdout(stdout_file)
        .status()
        .map_err(|err| launch_error("parse", program, &err))?;
    if !status.success() {
        return Err(exit_error("parse", program, status));
    }
    Ok(())
}

/// Composed optional-parameter vector for the parser invocation.
///
/// Declared priority order: coverage, e-value, duplicate table,
/// multi-hit, skewness, graph directory, SNP flag, SNP report, SNP
/// FASTA; then the two required positionals (annotation reference,
/// model-level integer).
pub(crate) fn parser_args(
    config: &PipelineConfig,
    dup_table: Option<&Path>,
) -> Result<Vec<String>, PipelineError> {
    CommandSpec::new(config.tools().parser.display().to_string())
        .option("coverage", "-c", Some(config.coverage()))
        .option("evalue", "-e", Some(config.evalue()))
        .option("dup-table", "-d", dup_table.map(|p| p.display().to_string()))
        .flag("multi-hit", "-m", config.multi_hit())
        .option("skew", "-s", config.skew_out().map(|p| p.display().to_string()))
        .option("graph-dir", "-g", config.graph_dir().map(|p| p.display().to_string()))
        .flag("snp", "--snp", config.snp_search())
        .option(
            "snp-report",
            "--snp-report",
            config.snp_report().map(|p| p.display().to_string()),
        )
        .option(
            "snp-fasta",
            "--snp-fasta",
            config.snp_fasta().map(|p| p.display().to_string()),
        )
        .requires("skew", "graph-dir")
        .requires("graph-dir", "skew")
        .requires("snp-report", "snp")
        .requires("snp-fasta", "snp")
        .arg(config.annotation_path().display().to_string())
        .arg(config.model_level().as_u8().to_string())
        .compose()
}

fn launch_error(stage: &'static str, program: &Path, err: &io::Error) -> PipelineError {
    PipelineError::ExternalTool {
        stage,
        message: format!("failed to launch {}: {err}", program.display()),
    }
}

fn exit_error(
    stage: &'static str,
    program: &Path,
    status: std::process::ExitStatus,
) -> PipelineError {
    PipelineError::ExternalTool {
        stage,
        message: format!("{} exited with {status}", program.display()),
    }
}
