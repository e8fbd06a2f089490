// stepwise/src/core/control.rs

//! Outcome of a full run.

use std::path::PathBuf;

/// One persisted result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
  /// Dotted path of the node that saved it.
  pub step_path: String,
  pub path: PathBuf,
}

/// What a completed run produced: the root's final payload and every artifact
/// written, in save order.
#[derive(Debug, Clone)]
pub struct ExecutionReport<P> {
  pub output: P,
  pub artifacts: Vec<Artifact>,
}

impl<P> ExecutionReport<P> {
  /// The root's artifact. The root always saves last.
  pub fn root_artifact(&self) -> Option<&Artifact> {
    self.artifacts.last()
  }

  pub fn artifact_for(&self, step_path: &str) -> Option<&Artifact> {
    self.artifacts.iter().find(|a| a.step_path == step_path)
  }
}
