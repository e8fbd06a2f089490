// stepwise/src/config/resolver.rs

//! Merges class defaults, configuration-file sections and command-line
//! assignments into one `ParameterSet` per node.

use crate::config::assignment::Assignment;
use crate::config::file::ConfigSection;
use crate::core::params::{ParamKind, ParameterSet, Provenance, NONE_LITERAL};
use crate::core::step::StepDef;
use crate::error::{StepwiseError, StepwiseResult};
use tracing::{event, instrument, Level};

/// Follows `names` through the declared children of `def`, one segment at a
/// time. Matching is case-insensitive and exact; there is no fuzzy fallback.
pub fn locate<'d, P: Send + 'static>(def: &'d StepDef<P>, names: &[String]) -> Option<&'d StepDef<P>> {
  match names.split_first() {
    None => Some(def),
    Some((head, rest)) => def.child(head).and_then(|child| locate(child.def.as_ref(), rest)),
  }
}

/// The configuration layers of one invocation.
///
/// Precedence per node and key: command line, then file, then class default.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
  file: ConfigSection,
  assignments: Vec<Assignment>,
}

impl ConfigResolver {
  pub fn new(file: ConfigSection, assignments: Vec<Assignment>) -> Self {
    Self { file, assignments }
  }

  pub fn assignments(&self) -> &[Assignment] {
    &self.assignments
  }

  /// Checks that every file section and every assignment addresses a node
  /// that exists under `root`. Run before any tree is built so a bad path
  /// never leaves a partially configured tree behind.
  #[instrument(name = "ConfigResolver::validate_paths", skip_all, fields(root = %root.type_name()), err(Display))]
  pub fn validate_paths<P: Send + 'static>(&self, root: &StepDef<P>) -> StepwiseResult<()> {
    validate_section(root, &self.file, "steps")?;
    for assignment in &self.assignments {
      if locate(root, &assignment.path).is_none() {
        event!(Level::ERROR, assignment = %assignment, "Assignment addresses an unknown step.");
        return Err(StepwiseError::UnknownStepPath {
          path: assignment.dotted_path(),
        });
      }
    }
    Ok(())
  }

  /// Resolves the parameters of the node reached from the root through
  /// `names` (empty for the root). `step_path` is the node's dotted path,
  /// used in diagnostics.
  pub fn resolve<P: Send + 'static>(
    &self,
    def: &StepDef<P>,
    names: &[String],
    step_path: &str,
  ) -> StepwiseResult<ParameterSet> {
    let mut params = ParameterSet::from_specs(def.params());

    if let Some(section) = self.file.descend(names) {
      for (key, raw) in &section.values {
        apply(&mut params, def, step_path, key, raw, Provenance::File)?;
      }
    }

    for assignment in self.assignments.iter().filter(|a| a.targets(names)) {
      apply(&mut params, def, step_path, &assignment.key, &assignment.value, Provenance::Cli)?;
    }

    event!(Level::TRACE, step = step_path, params = params.len(), "Parameters resolved.");
    Ok(params)
  }
}

fn validate_section<P: Send + 'static>(def: &StepDef<P>, section: &ConfigSection, prefix: &str) -> StepwiseResult<()> {
  for (name, child_section) in &section.children {
    let path = format!("{}.{}", prefix, name);
    match def.child(name) {
      Some(child) => validate_section(child.def.as_ref(), child_section, &path)?,
      None => {
        event!(Level::ERROR, section = %path, "Configuration file addresses an unknown step.");
        return Err(StepwiseError::UnknownStepPath { path });
      }
    }
  }
  Ok(())
}

fn apply<P: Send + 'static>(
  params: &mut ParameterSet,
  def: &StepDef<P>,
  step_path: &str,
  key: &str,
  raw: &str,
  provenance: Provenance,
) -> StepwiseResult<()> {
  if raw.trim().eq_ignore_ascii_case(NONE_LITERAL) {
    params.set(key, None, provenance);
    return Ok(());
  }

  let kind = match def.param_spec(key) {
    Some(spec) => spec.kind,
    None => {
      event!(
        Level::WARN,
        step = step_path,
        key,
        "Parameter is not declared by the step type; passing it through as a string."
      );
      ParamKind::Str
    }
  };

  let value = kind.coerce(raw).ok_or_else(|| StepwiseError::BadParameterValue {
    step_path: step_path.to_string(),
    key: key.to_string(),
    value: raw.to_string(),
    expected: kind.name().to_string(),
  })?;
  params.set(key, Some(value), provenance);
  Ok(())
}
