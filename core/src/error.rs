// stepwise/src/error.rs
use anyhow::Error as AnyhowError;
use std::path::PathBuf;
use thiserror::Error;

/// Every failure a stepwise run can surface.
///
/// The configuration-stage variants (`UnknownStepPath`, `BadParameterValue`,
/// `UnresolvableTarget`, `InvalidAssignment`, `ConfigFile`, `WorkingDirectory`)
/// are raised while the step tree is being built, before the input is loaded
/// or any step runs.
#[derive(Debug, Error)]
pub enum StepwiseError {
  #[error("Unknown step path '{path}'")]
  UnknownStepPath { path: String },

  #[error("Bad value for parameter '{key}' of step '{step_path}': '{value}' is not a valid {expected}")]
  BadParameterValue {
    step_path: String,
    key: String,
    value: String,
    expected: String,
  },

  #[error("Unresolvable target '{target}': {reason}")]
  UnresolvableTarget { target: String, reason: String },

  #[error("Invalid assignment '{text}': expected [--]key=value or [--]steps.<path>.key=value")]
  InvalidAssignment { text: String },

  #[error("Configuration file '{}' could not be read. Source: {source}", path.display())]
  ConfigFile {
    path: PathBuf,
    #[source]
    source: AnyhowError,
  },

  #[error("The current working directory could not be determined. Source: {source}")]
  WorkingDirectory {
    #[source]
    source: AnyhowError,
  },

  #[error("Input '{}' could not be loaded. Source: {source}", path.display())]
  LoadFailure {
    path: PathBuf,
    #[source]
    source: AnyhowError,
  },

  #[error("Processing failed in step '{step_path}'. Source: {source}")]
  ProcessingFailure {
    step_path: String,
    #[source]
    source: AnyhowError,
  },

  #[error("Step '{step_path}' could not save '{}'. Source: {source}", path.display())]
  SaveFailure {
    step_path: String,
    path: PathBuf,
    #[source]
    source: AnyhowError,
  },
}

impl StepwiseError {
  /// True for the errors detected while resolving configuration, i.e. before
  /// any processing begins.
  pub fn is_configuration_error(&self) -> bool {
    matches!(
      self,
      StepwiseError::UnknownStepPath { .. }
        | StepwiseError::BadParameterValue { .. }
        | StepwiseError::UnresolvableTarget { .. }
        | StepwiseError::InvalidAssignment { .. }
        | StepwiseError::ConfigFile { .. }
        | StepwiseError::WorkingDirectory { .. }
    )
  }

  /// Dotted path of the node the error is attributed to, when there is one.
  pub fn step_path(&self) -> Option<&str> {
    match self {
      StepwiseError::UnknownStepPath { path } => Some(path),
      StepwiseError::BadParameterValue { step_path, .. }
      | StepwiseError::ProcessingFailure { step_path, .. }
      | StepwiseError::SaveFailure { step_path, .. } => Some(step_path),
      _ => None,
    }
  }
}

pub type StepwiseResult<T, E = StepwiseError> = std::result::Result<T, E>;
