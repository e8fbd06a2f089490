// stepwise/src/core/step.rs

//! Class-level declaration of a step type: its parameters, its naming
//! suffixes, its processing and, for pipelines, its fixed set of children.

use crate::core::params::{self, ParamKind, ParamSpec, ParamValue};
use crate::core::process::{Passthrough, Process};
use std::sync::Arc;

/// Leaf steps have no children; composite steps (pipelines) own an ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
  Leaf,
  Composite,
}

/// A named child slot of a composite step type.
pub struct ChildDecl<P: Send + 'static> {
  pub name: String,
  pub def: Arc<StepDef<P>>,
}

impl<P: Send + 'static> Clone for ChildDecl<P> {
  fn clone(&self) -> Self {
    Self {
      name: self.name.clone(),
      def: Arc::clone(&self.def),
    }
  }
}

/// Declaration of a step type.
///
/// Every type carries the standard parameters (`output_dir`, `output_file`,
/// `save_results`, `skip`, `suffix`) in addition to whatever it declares.
pub struct StepDef<P: Send + 'static> {
  pub(crate) type_name: String,
  pub(crate) default_name: String,
  pub(crate) kind: StepKind,
  pub(crate) suffix: String,
  pub(crate) renaming_suffix: Option<String>,
  pub(crate) params: Vec<ParamSpec>,
  pub(crate) processor: Arc<dyn Process<P>>,
  pub(crate) children: Vec<ChildDecl<P>>,
}

impl<P: Send + 'static> StepDef<P> {
  /// Declares a leaf step. Its instance name and declared suffix both default
  /// to the last segment of `type_name`.
  pub fn leaf(type_name: impl Into<String>, processor: Arc<dyn Process<P>>) -> Self {
    Self::declare(type_name.into(), StepKind::Leaf, processor)
  }

  /// Declares a pipeline. Children are added with [`StepDef::with_step`] and run
  /// in the order they were added; the pipeline's own processing defaults to
  /// [`Passthrough`] and runs after its children.
  pub fn pipeline(type_name: impl Into<String>) -> Self {
    Self::declare(type_name.into(), StepKind::Composite, Arc::new(Passthrough))
  }

  fn declare(type_name: String, kind: StepKind, processor: Arc<dyn Process<P>>) -> Self {
    let short = type_name.rsplit('.').next().unwrap_or(&type_name).to_string();
    let params = vec![
      ParamSpec::new(params::OUTPUT_DIR, ParamKind::Path, None),
      ParamSpec::new(params::OUTPUT_FILE, ParamKind::Path, None),
      ParamSpec::new(params::SAVE_RESULTS, ParamKind::Bool, Some(ParamValue::Bool(false))),
      ParamSpec::new(params::SKIP, ParamKind::Bool, Some(ParamValue::Bool(false))),
      ParamSpec::new(params::SUFFIX, ParamKind::Str, Some(ParamValue::Str(short.clone()))),
    ];
    Self {
      type_name,
      default_name: short.clone(),
      kind,
      suffix: short,
      renaming_suffix: None,
      params,
      processor,
      children: Vec::new(),
    }
  }

  /// Instance name used when this type is the root of an invocation.
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.default_name = name.into();
    self
  }

  /// Sets the declared suffix appended to the stem when this step saves.
  pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
    let suffix = suffix.into();
    self.set_default(params::SUFFIX, ParamValue::Str(suffix.clone()));
    self.suffix = suffix;
    self
  }

  /// Sets the suffix this step appends to the working stem for every node
  /// executed after it.
  pub fn with_renaming_suffix(mut self, suffix: impl Into<String>) -> Self {
    self.renaming_suffix = Some(suffix.into());
    self
  }

  pub fn with_processor(mut self, processor: Arc<dyn Process<P>>) -> Self {
    self.processor = processor;
    self
  }

  /// Declares a step-specific parameter. Redeclaring a name replaces it.
  pub fn with_param(mut self, name: &str, kind: ParamKind, default: Option<ParamValue>) -> Self {
    let spec = ParamSpec::new(name, kind, default);
    match self.params.iter_mut().find(|s| s.name == name) {
      Some(existing) => *existing = spec,
      None => self.params.push(spec),
    }
    self
  }

  /// Changes the class default of an already declared parameter, e.g.
  /// `save_results` for steps that save unless told otherwise.
  pub fn with_default(mut self, name: &str, value: ParamValue) -> Self {
    self.set_default(name, value);
    self
  }

  /// Adds a named child to a pipeline. Panics on leaf steps and on duplicate
  /// names: both are declaration mistakes, not runtime conditions.
  pub fn with_step(mut self, name: impl Into<String>, def: Arc<StepDef<P>>) -> Self {
    let name = name.into();
    if self.kind != StepKind::Composite {
      panic!("Stepwise setup error: leaf step '{}' cannot own child '{}'.", self.type_name, name);
    }
    if self.child(&name).is_some() {
      panic!(
        "Stepwise setup error: step '{}' already exists in pipeline '{}'.",
        name, self.type_name
      );
    }
    self.children.push(ChildDecl { name, def });
    self
  }

  fn set_default(&mut self, name: &str, value: ParamValue) {
    match self.params.iter_mut().find(|s| s.name == name) {
      Some(spec) => {
        if spec.kind != value.kind() {
          panic!(
            "Stepwise setup error: default for '{}' on '{}' must be a {}.",
            name,
            self.type_name,
            spec.kind.name()
          );
        }
        spec.default = Some(value);
      }
      None => panic!(
        "Stepwise setup error: parameter '{}' is not declared on '{}'.",
        name, self.type_name
      ),
    }
  }

  /// Case-insensitive lookup of a declared child.
  pub fn child(&self, name: &str) -> Option<&ChildDecl<P>> {
    self.children.iter().find(|c| c.name.eq_ignore_ascii_case(name))
  }

  pub fn type_name(&self) -> &str {
    &self.type_name
  }

  pub fn default_name(&self) -> &str {
    &self.default_name
  }

  pub fn kind(&self) -> StepKind {
    self.kind
  }

  pub fn suffix(&self) -> &str {
    &self.suffix
  }

  pub fn renaming_suffix(&self) -> Option<&str> {
    self.renaming_suffix.as_deref()
  }

  pub fn params(&self) -> &[ParamSpec] {
    &self.params
  }

  pub fn param_spec(&self, name: &str) -> Option<&ParamSpec> {
    self.params.iter().find(|s| s.name == name)
  }

  pub fn children(&self) -> &[ChildDecl<P>] {
    &self.children
  }
}

impl<P: Send + 'static> std::fmt::Debug for StepDef<P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("type_name", &self.type_name)
      .field("default_name", &self.default_name)
      .field("kind", &self.kind)
      .field("suffix", &self.suffix)
      .field("renaming_suffix", &self.renaming_suffix)
      .field("params", &self.params.len())
      .field("children", &self.children.iter().map(|c| c.name.as_str()).collect::<Vec<_>>())
      .finish()
  }
}
