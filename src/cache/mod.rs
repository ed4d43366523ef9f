//! Existence-based stage memoization
//!
//! A stage's declared artifact path is its sole cache signal: if the
//! path exists the stage body is skipped, otherwise the body runs and
//! must leave the artifact behind. There is no content hashing and no
//! timestamp comparison, so a stale or partially written file at the
//! expected path is indistinguishable from a valid one; operators remove
//! such artifacts manually before re-running.

use crate::PipelineError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Durable, path-addressed output of exactly one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageArtifact {
    name: &'static str,
    path: PathBuf,
}

impl StageArtifact {
    /// Declare an artifact by logical name and filesystem path.
    pub fn new(name: &'static str, path: impl Into<PathBuf>) -> Self {
        Self {
            name,
            path: path.into(),
        }
    }

    /// Logical name used in logs
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Filesystem path the producing stage must write
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the artifact currently exists on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// How a memoized stage concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Stage body ran and produced the artifact
    Produced,

    /// Artifact already present; stage body not executed
    Skipped,
}

/// Run `body` unless `artifact` already exists.
///
/// On a fresh run the body must leave the artifact at its declared path,
/// otherwise the stage failed even if the body returned success.
pub fn run_cached<F>(
    stage: &'static str,
    artifact: &StageArtifact,
    body: F,
) -> Result<StageStatus, PipelineError>
where
    F: FnOnce() -> Result<(), PipelineError>,
{
    if artifact.exists() {
        debug!(
            stage,
            artifact = artifact.name(),
            path = %artifact.path().display(),
            "artifact present, skipping stage"
        );
        return Ok(StageStatus::Skipped);
    }

    body()?;

    if !artifact.exists() {
        return Err(PipelineError::CacheInconsistency {
            stage,
            path: artifact.path.clone(),
        });
    }
    Ok(StageStatus::Produced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn existing_artifact_skips_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stage.out");
        fs::write(&path, "cached").unwrap();

        let artifact = StageArtifact::new("stage-out", &path);
        let mut ran = false;
        let status = run_cached("test", &artifact, || {
            ran = true;
            Ok(())
        })
        .unwrap();

        assert_eq!(status, StageStatus::Skipped);
        assert!(!ran);
        assert_eq!(fs::read_to_string(&path).unwrap(), "cached");
    }

    #[test]
    fn body_runs_and_produces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stage.out");
        let artifact = StageArtifact::new("stage-out", &path);

        let status = run_cached("test", &artifact, || {
            fs::write(&path, "fresh").map_err(Into::into)
        })
        .unwrap();

        assert_eq!(status, StageStatus::Produced);
    }

    #[test]
    fn missing_artifact_after_body_is_inconsistent() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = StageArtifact::new("stage-out", dir.path().join("never.out"));

        let err = run_cached("ghost", &artifact, || Ok(())).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::CacheInconsistency { stage: "ghost", .. }
        ));
    }

    #[test]
    fn body_error_propagates_unwrapped() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = StageArtifact::new("stage-out", dir.path().join("x.out"));

        let err = run_cached("test", &artifact, || {
            Err(PipelineError::Configuration("boom".into()))
        })
        .unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
