use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use seqscan::{Pipeline, PipelineConfig, ToolPaths};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "seqscan", version, about = "Profile-model search pipeline for sequencing reads")]
struct Cli {
    /// Single-end reads (FASTA, FASTQ, or gzipped FASTQ)
    #[arg(short = 'i', long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Forward (R1) reads of a paired-end run
    #[arg(short = '1', long, value_name = "FILE")]
    forward: Option<PathBuf>,

    /// Reverse (R2) reads of a paired-end run
    #[arg(short = '2', long, value_name = "FILE")]
    reverse: Option<PathBuf>,

    /// Output directory for all pipeline artifacts
    #[arg(short = 'o', long, value_name = "DIR")]
    out_dir: PathBuf,

    /// Basename shared by every artifact filename
    #[arg(short = 'b', long, value_name = "NAME")]
    basename: String,

    /// Model level selecting the profile database (1, 2 or 3)
    #[arg(short = 'l', long, default_value_t = 1, value_name = "LEVEL")]
    level: u8,

    /// Coverage threshold in percent, (0, 100]
    #[arg(long, default_value_t = 80.0, value_name = "PCT")]
    coverage: f64,

    /// E-value threshold for reported hits
    #[arg(long, default_value_t = 1e-5, value_name = "FLOAT")]
    evalue: f64,

    /// k-mer size for the prescreen filter, [0, 35]; 0 disables it
    #[arg(short = 'k', long, default_value_t = 0, value_name = "INT")]
    kmer: u32,

    /// Threads passed through to the external tools
    #[arg(short = 't', long, default_value_t = 1, value_name = "INT")]
    threads: u32,

    /// Collapse exact-duplicate sequences before searching
    #[arg(long)]
    dedup: bool,

    /// Apply multi-hit correction in the parse stage
    #[arg(long)]
    multi_hit: bool,

    /// Skewness output path (requires --graph-dir)
    #[arg(long, value_name = "FILE")]
    skew_out: Option<PathBuf>,

    /// Graph output directory (requires --skew-out)
    #[arg(long, value_name = "DIR")]
    graph_dir: Option<PathBuf>,

    /// Enable SNP detection (model level 2 or 3 only)
    #[arg(long)]
    snp: bool,

    /// SNP report output path (requires --snp)
    #[arg(long, value_name = "FILE")]
    snp_report: Option<PathBuf>,

    /// SNP FASTA output path (requires --snp)
    #[arg(long, value_name = "FILE")]
    snp_fasta: Option<PathBuf>,

    /// Directory holding the model databases, templates and annotation
    #[arg(long, default_value = "models", value_name = "DIR")]
    model_dir: PathBuf,

    /// Prescreen filter binary
    #[arg(long, default_value = "prescreen", value_name = "BIN")]
    prescreen_bin: PathBuf,

    /// Profile-model search binary
    #[arg(long, default_value = "psearch", value_name = "BIN")]
    search_bin: PathBuf,

    /// Hit-report parser binary
    #[arg(long, default_value = "phitparse", value_name = "BIN")]
    parser_bin: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("seqscan: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(cli)?;
    let report = Pipeline::new(config).run()?;

    for (stage, status) in report.outcomes() {
        info!(stage = stage.name(), status = ?status, "stage outcome");
    }
    println!("{}", report.report().display());
    Ok(())
}

fn build_config(cli: Cli) -> anyhow::Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .out_dir(cli.out_dir)
        .basename(cli.basename)
        .model_level(cli.level)
        .coverage(cli.coverage)
        .evalue(cli.evalue)
        .kmer(cli.kmer)
        .threads(cli.threads)
        .dedup(cli.dedup)
        .multi_hit(cli.multi_hit)
        .snp_search(cli.snp)
        .model_dir(cli.model_dir)
        .tools(ToolPaths {
            prescreen: cli.prescreen_bin,
            search: cli.search_bin,
            parser: cli.parser_bin,
        });

    if let Some(input) = cli.input {
        builder = builder.single_end(input);
    }
    if let Some(forward) = cli.forward {
        builder = builder.forward(forward);
    }
    if let Some(reverse) = cli.reverse {
        builder = builder.reverse(reverse);
    }
    if let Some(skew_out) = cli.skew_out {
        builder = builder.skew_out(skew_out);
    }
    if let Some(graph_dir) = cli.graph_dir {
        builder = builder.graph_dir(graph_dir);
    }
    if let Some(snp_report) = cli.snp_report {
        builder = builder.snp_report(snp_report);
    }
    if let Some(snp_fasta) = cli.snp_fasta {
        builder = builder.snp_fasta(snp_fasta);
    }

    Ok(builder.build()?)
}
