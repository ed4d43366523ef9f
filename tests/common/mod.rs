//! Shared helpers for integration tests

#![allow(dead_code)]

use seqscan::{PipelineConfig, PipelineConfigBuilder, ToolPaths};
use std::fs;
use std::path::{Path, PathBuf};

/// Write `content` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    fs::write(&path, content).expect("write test file");
    path
}

/// Create a model directory holding all three databases, the prescreen
/// template set and the annotation reference.
pub fn setup_models(dir: &Path) -> PathBuf {
    let model_dir = dir.join("models");
    fs::create_dir_all(&model_dir).expect("create model directory");
    for name in ["model_a.hmm", "model_b.hmm", "model_c.hmm"] {
        fs::write(model_dir.join(name), "HMM stub\n").expect("write model");
    }
    fs::write(model_dir.join("templates.fasta"), ">t1\nACGT\n").expect("write templates");
    fs::write(model_dir.join("annotation.tsv"), "gene\tclass\n").expect("write annotation");
    model_dir
}

/// Write an executable stub collaborator script (unix only).
#[cfg(unix)]
pub fn write_stub_tool(dir: &Path, name: &str, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, script).expect("write stub tool");
    let mut perms = fs::metadata(&path).expect("stat stub tool").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod stub tool");
    path
}

/// Tool paths that cannot possibly resolve; any invocation fails.
pub fn unreachable_tools() -> ToolPaths {
    ToolPaths {
        prescreen: PathBuf::from("/nonexistent/seqscan-prescreen"),
        search: PathBuf::from("/nonexistent/seqscan-psearch"),
        parser: PathBuf::from("/nonexistent/seqscan-phitparse"),
    }
}

/// Builder pre-filled with a valid single-end baseline.
pub fn base_config(root: &Path, input: &Path) -> PipelineConfigBuilder {
    PipelineConfig::builder()
        .single_end(input)
        .out_dir(root.join("out"))
        .basename("sample")
        .model_level(2)
}
