// stepwise/src/config/assignment.rs

//! Command-line overrides of the form `[--]key=value` (root) and
//! `[--]steps.<name>[.<name>...].key=value` (descendants).

use crate::error::{StepwiseError, StepwiseResult};
use std::fmt;
use std::str::FromStr;

const STEPS_PREFIX: &str = "steps";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
  /// Child names below the root, outermost first. Empty for root assignments.
  pub path: Vec<String>,
  pub key: String,
  pub value: String,
}

impl Assignment {
  pub fn parse(text: &str) -> StepwiseResult<Self> {
    let invalid = || StepwiseError::InvalidAssignment { text: text.to_string() };

    let body = text.trim().strip_prefix("--").unwrap_or(text.trim());
    let (lhs, value) = body.split_once('=').ok_or_else(invalid)?;
    let segments: Vec<&str> = lhs.trim().split('.').map(str::trim).collect();
    if segments.iter().any(|s| s.is_empty()) {
      return Err(invalid());
    }

    match segments.as_slice() {
      [key] => Ok(Self {
        path: Vec::new(),
        key: (*key).to_string(),
        value: value.to_string(),
      }),
      [prefix, path @ .., key] if prefix.eq_ignore_ascii_case(STEPS_PREFIX) && !path.is_empty() => Ok(Self {
        path: path.iter().map(|s| (*s).to_string()).collect(),
        key: (*key).to_string(),
        value: value.to_string(),
      }),
      _ => Err(invalid()),
    }
  }

  pub fn is_root(&self) -> bool {
    self.path.is_empty()
  }

  /// `steps.a.b` for descendant assignments, empty for the root.
  pub fn dotted_path(&self) -> String {
    if self.path.is_empty() {
      String::new()
    } else {
      format!("{}.{}", STEPS_PREFIX, self.path.join("."))
    }
  }

  /// True if this assignment addresses the node reached through `names`.
  pub fn targets(&self, names: &[String]) -> bool {
    self.path.len() == names.len() && self.path.iter().zip(names).all(|(a, b)| a.eq_ignore_ascii_case(b))
  }
}

impl FromStr for Assignment {
  type Err = StepwiseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Assignment::parse(s)
  }
}

impl fmt::Display for Assignment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.path.is_empty() {
      write!(f, "{}={}", self.key, self.value)
    } else {
      write!(f, "{}.{}={}", self.dotted_path(), self.key, self.value)
    }
  }
}

/// Parses every assignment, failing on the first malformed one.
pub fn parse_all<I, S>(texts: I) -> StepwiseResult<Vec<Assignment>>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  texts.into_iter().map(|t| Assignment::parse(t.as_ref())).collect()
}
