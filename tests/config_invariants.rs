//! Configuration invariant coverage
//!
//! Every invariant must fail at build time with a configuration error
//! naming the violation, before any stage could run.

use seqscan::{PipelineConfig, PipelineConfigBuilder, PipelineError, StageKind};

fn minimal() -> PipelineConfigBuilder {
    PipelineConfig::builder()
        .single_end("reads.fastq")
        .out_dir("out")
        .basename("sample")
}

fn assert_config_err(result: Result<PipelineConfig, PipelineError>, needle: &str) {
    match result {
        Err(PipelineError::Configuration(message)) => {
            assert!(
                message.contains(needle),
                "expected '{needle}' in configuration error, got: {message}"
            );
        }
        Err(other) => panic!("expected configuration error, got: {other}"),
        Ok(_) => panic!("expected configuration error for '{needle}', config built"),
    }
}

#[test]
fn both_input_modes_rejected() {
    let result = minimal().forward("r1.fastq").reverse("r2.fastq").build();
    assert_config_err(result, "both single-end and paired-end");
}

#[test]
fn missing_input_rejected() {
    let result = PipelineConfig::builder()
        .out_dir("out")
        .basename("sample")
        .build();
    assert_config_err(result, "no input supplied");
}

#[test]
fn forward_without_reverse_rejected() {
    let result = PipelineConfig::builder()
        .forward("r1.fastq")
        .out_dir("out")
        .basename("sample")
        .build();
    assert_config_err(result, "missing the reverse mate");
}

#[test]
fn reverse_without_forward_rejected() {
    let result = PipelineConfig::builder()
        .reverse("r2.fastq")
        .out_dir("out")
        .basename("sample")
        .build();
    assert_config_err(result, "missing the forward mate");
}

#[test]
fn paired_input_builds() {
    let config = PipelineConfig::builder()
        .forward("r1.fastq")
        .reverse("r2.fastq")
        .out_dir("out")
        .basename("sample")
        .build()
        .unwrap();
    assert!(config.input().is_paired());
}

#[test]
fn kmer_range_boundaries() {
    assert!(minimal().kmer(0).build().is_ok());
    assert!(minimal().kmer(35).build().is_ok());
    assert_config_err(minimal().kmer(36).build(), "k-mer size 36 outside [0, 35]");
}

#[test]
fn kmer_zero_omits_prescreen_stage() {
    let config = minimal().kmer(0).build().unwrap();
    assert!(!config.stage_graph().contains(&StageKind::Prescreen));

    let config = minimal().kmer(1).build().unwrap();
    assert!(config.stage_graph().contains(&StageKind::Prescreen));
}

#[test]
fn coverage_range_boundaries() {
    assert!(minimal().coverage(100.0).build().is_ok());
    assert!(minimal().coverage(0.5).build().is_ok());
    assert_config_err(minimal().coverage(0.0).build(), "coverage threshold");
    assert_config_err(minimal().coverage(-3.0).build(), "coverage threshold");
    assert_config_err(minimal().coverage(100.5).build(), "coverage threshold");
}

#[test]
fn evalue_must_be_positive_finite() {
    assert_config_err(minimal().evalue(0.0).build(), "e-value");
    assert_config_err(minimal().evalue(-1e-3).build(), "e-value");
    assert_config_err(minimal().evalue(f64::NAN).build(), "e-value");
    assert_config_err(minimal().evalue(f64::INFINITY).build(), "e-value");
}

#[test]
fn threads_must_be_at_least_one() {
    assert_config_err(minimal().threads(0).build(), "thread count");
}

#[test]
fn model_level_must_be_known() {
    assert_config_err(minimal().model_level(0).build(), "model level 0");
    assert_config_err(minimal().model_level(4).build(), "model level 4");
}

#[test]
fn skew_and_graph_are_paired_options() {
    assert_config_err(
        minimal().skew_out("skew.txt").build(),
        "without a graph directory",
    );
    assert_config_err(
        minimal().graph_dir("graphs").build(),
        "without a skewness output",
    );
    assert!(minimal()
        .skew_out("skew.txt")
        .graph_dir("graphs")
        .build()
        .is_ok());
}

#[test]
fn snp_paths_require_snp_search() {
    assert_config_err(
        minimal().snp_report("snps.tsv").build(),
        "SNP report path requires SNP search",
    );
    assert_config_err(
        minimal().snp_fasta("snps.fasta").build(),
        "SNP FASTA path requires SNP search",
    );
}

#[test]
fn snp_search_requires_extended_model_level() {
    assert_config_err(
        minimal().model_level(1).snp_search(true).build(),
        "model level 2 or 3",
    );
    assert!(minimal().model_level(2).snp_search(true).build().is_ok());
    assert!(minimal()
        .model_level(3)
        .snp_search(true)
        .snp_report("snps.tsv")
        .snp_fasta("snps.fasta")
        .build()
        .is_ok());
}
