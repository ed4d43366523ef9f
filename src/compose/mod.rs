//! Declarative composition of external tool invocations
//!
//! One ordered parameter table replaces the per-combination branch ladder
//! of hand-written invocations: each optional parameter contributes its
//! token(s) only when present, in declared order, with required
//! positional arguments appended last. Dependency edges between
//! parameters are checked before composition, so an inconsistent sparse
//! set never reaches the child process.
//!
//! Composition is deterministic: the same parameter set always yields an
//! identical argument vector, and omitting one parameter never reorders
//! the remaining ones.

use crate::PipelineError;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParamKind {
    /// Token followed by a rendered value
    Valued(String),
    /// Bare token
    Flag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Param {
    name: &'static str,
    token: &'static str,
    kind: ParamKind,
    present: bool,
}

/// Ordered specification of one external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    params: Vec<Param>,
    requires: Vec<(&'static str, &'static str)>,
    positional: Vec<String>,
}

impl CommandSpec {
    /// Start a specification for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            params: Vec::new(),
            requires: Vec::new(),
            positional: Vec::new(),
        }
    }

    /// Declare a valued optional parameter; absent when `value` is `None`.
    pub fn option<V: Display>(
        mut self,
        name: &'static str,
        token: &'static str,
        value: Option<V>,
    ) -> Self {
        let (present, kind) = match value {
            Some(v) => (true, ParamKind::Valued(v.to_string())),
            None => (false, ParamKind::Valued(String::new())),
        };
        self.params.push(Param {
            name,
            token,
            kind,
            present,
        });
        self
    }

    /// Declare a boolean flag parameter, present when `on`.
    pub fn flag(mut self, name: &'static str, token: &'static str, on: bool) -> Self {
        self.params.push(Param {
            name,
            token,
            kind: ParamKind::Flag,
            present: on,
        });
        self
    }

    /// Declare that `name` may only be present when `prerequisite` is.
    pub fn requires(mut self, name: &'static str, prerequisite: &'static str) -> Self {
        self.requires.push((name, prerequisite));
        self
    }

    /// Append a required positional argument (always rendered last).
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Program the arguments are composed for
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Compose the final argument vector.
    ///
    /// Walks the declared parameter order once, emitting tokens for
    /// present parameters only, then the positionals. Fails with a
    /// configuration error when a present parameter's prerequisite is
    /// absent.
    pub fn compose(&self) -> Result<Vec<String>, PipelineError> {
        for (dependent, prerequisite) in &self.requires {
            if self.is_present(dependent) && !self.is_present(prerequisite) {
                return Err(PipelineError::Configuration(format!(
                    "parameter '{dependent}' requires '{prerequisite}' for {}",
                    self.program
                )));
            }
        }

        let mut argv = Vec::new();
        for param in &self.params {
            if !param.present {
                continue;
            }
            argv.push(param.token.to_string());
            if let ParamKind::Valued(value) = &param.kind {
                argv.push(value.clone());
            }
        }
        argv.extend(self.positional.iter().cloned());
        Ok(argv)
    }

    fn is_present(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name && p.present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser_like(multi: bool, dup_table: Option<&str>) -> CommandSpec {
        CommandSpec::new("parse")
            .option("coverage", "-c", Some(80))
            .option("evalue", "-e", Some(1e-3))
            .option("dup-table", "-d", dup_table)
            .flag("multi-hit", "-m", multi)
            .arg("annotation.tsv")
            .arg("2")
    }

    #[test]
    fn absent_flag_emits_no_token() {
        let argv = parser_like(false, None).compose().unwrap();
        assert_eq!(argv, vec!["-c", "80", "-e", "0.001", "annotation.tsv", "2"]);
    }

    #[test]
    fn present_parameters_keep_declared_order() {
        let argv = parser_like(true, Some("/x")).compose().unwrap();
        assert_eq!(
            argv,
            vec!["-c", "80", "-e", "0.001", "-d", "/x", "-m", "annotation.tsv", "2"]
        );
    }

    #[test]
    fn composition_is_deterministic() {
        let spec = parser_like(true, Some("/x"));
        assert_eq!(spec.compose().unwrap(), spec.compose().unwrap());
    }

    #[test]
    fn omission_preserves_relative_order() {
        let with_all = parser_like(true, Some("/x")).compose().unwrap();
        let without_dup = parser_like(true, None).compose().unwrap();
        let filtered: Vec<&String> = with_all
            .iter()
            .filter(|t| *t != "-d" && *t != "/x")
            .collect();
        let expected: Vec<&String> = without_dup.iter().collect();
        assert_eq!(filtered, expected);
    }

    #[test]
    fn violated_dependency_is_a_configuration_error() {
        let spec = CommandSpec::new("parse")
            .flag("snp", "--snp", false)
            .option("snp-report", "--snp-report", Some("/report"))
            .requires("snp-report", "snp");
        let err = spec.compose().unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn satisfied_dependency_composes() {
        let argv = CommandSpec::new("parse")
            .flag("snp", "--snp", true)
            .option("snp-report", "--snp-report", Some("/report"))
            .requires("snp-report", "snp")
            .compose()
            .unwrap();
        assert_eq!(argv, vec!["--snp", "--snp-report", "/report"]);
    }

    #[test]
    fn positionals_always_trail() {
        let argv = CommandSpec::new("search")
            .option("cpu", "--cpu", Some(4))
            .arg("model.hmm")
            .arg("seqs.fasta")
            .compose()
            .unwrap();
        assert_eq!(argv, vec!["--cpu", "4", "model.hmm", "seqs.fasta"]);
    }
}
