// stepwise/src/registry.rs

//! Defines `StepRegistry`, which maps qualified step-type names to their
//! declarations and turns an `Invocation` into a built, runnable `StepTree`.

use crate::config::assignment::{self, Assignment};
use crate::config::file::ConfigFile;
use crate::config::resolver::ConfigResolver;
use crate::core::control::ExecutionReport;
use crate::core::step::StepDef;
use crate::core::store::DataStore;
use crate::error::{StepwiseError, StepwiseResult};
use crate::pipeline::tree::StepTree;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{event, instrument, Level};

const CONFIG_EXTENSION: &str = "toml";

/// One run request: what to run, on which input, with which overrides.
#[derive(Debug, Clone)]
pub struct Invocation {
  /// Qualified step-type name, or the path of a configuration file whose
  /// `class` names the type.
  pub target: String,
  pub input: PathBuf,
  pub assignments: Vec<Assignment>,
  /// Directory outputs default to, captured when the invocation is created.
  pub working_dir: PathBuf,
}

impl Invocation {
  /// Parses `assignments` and captures the current working directory.
  pub fn new<I, S>(target: impl Into<String>, input: impl Into<PathBuf>, assignments: I) -> StepwiseResult<Self>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let assignments = assignment::parse_all(assignments)?;
    let working_dir = std::env::current_dir().map_err(|e| StepwiseError::WorkingDirectory { source: e.into() })?;
    Ok(Self {
      target: target.into(),
      input: input.into(),
      assignments,
      working_dir,
    })
  }

  /// Replaces the captured working directory.
  pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.working_dir = dir.into();
    self
  }
}

/// A registry of step types, keyed by qualified name.
pub struct StepRegistry<P: Send + 'static> {
  types: RwLock<HashMap<String, Arc<StepDef<P>>>>,
}

impl<P: Send + 'static> Default for StepRegistry<P> {
  fn default() -> Self {
    Self::new()
  }
}

impl<P: Send + 'static> StepRegistry<P> {
  pub fn new() -> Self {
    Self {
      types: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `def` under its type name, replacing any earlier registration.
  pub fn register(&self, def: Arc<StepDef<P>>) {
    let name = def.type_name().to_string();
    self.register_as(name, def);
  }

  /// Registers `def` under an additional name.
  pub fn register_as(&self, name: impl Into<String>, def: Arc<StepDef<P>>) {
    let name = name.into();
    event!(Level::DEBUG, step_type = %name, "Registering step type.");
    self.types.write().insert(name, def);
  }

  pub fn get(&self, name: &str) -> Option<Arc<StepDef<P>>> {
    self.types.read().get(name).cloned()
  }

  /// Registered names, sorted.
  pub fn type_names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.types.read().keys().cloned().collect();
    names.sort();
    names
  }

  /// Locates the root type of `target` and the configuration file that named
  /// it, if any.
  #[instrument(name = "StepRegistry::resolve_target", skip(self), err(Display))]
  pub fn resolve_target(&self, target: &str) -> StepwiseResult<(Arc<StepDef<P>>, Option<ConfigFile>)> {
    let path = Path::new(target);
    let is_config = path.is_file() || path.extension().is_some_and(|e| e == CONFIG_EXTENSION);

    if !is_config {
      let def = self.get(target).ok_or_else(|| StepwiseError::UnresolvableTarget {
        target: target.to_string(),
        reason: "no step type is registered under this name".to_string(),
      })?;
      return Ok((def, None));
    }

    if !path.exists() {
      return Err(StepwiseError::UnresolvableTarget {
        target: target.to_string(),
        reason: "configuration file does not exist".to_string(),
      });
    }
    let file = ConfigFile::load(path)?;
    let class = file.class.clone().ok_or_else(|| StepwiseError::UnresolvableTarget {
      target: target.to_string(),
      reason: "configuration file has no 'class' entry".to_string(),
    })?;
    let def = self.get(&class).ok_or_else(|| StepwiseError::UnresolvableTarget {
      target: target.to_string(),
      reason: format!("class '{}' is not a registered step type", class),
    })?;
    Ok((def, Some(file)))
  }

  /// Resolves the target and builds the fully configured tree. Every
  /// configuration error surfaces here, before anything is loaded or run.
  pub fn prepare(&self, invocation: &Invocation) -> StepwiseResult<StepTree<P>> {
    let (def, file) = self.resolve_target(&invocation.target)?;
    let (section, root_name) = match file {
      Some(f) => (f.root, f.name),
      None => Default::default(),
    };
    let resolver = ConfigResolver::new(section, invocation.assignments.clone());
    StepTree::build(
      def,
      root_name.as_deref(),
      &resolver,
      &invocation.input,
      invocation.working_dir.clone(),
    )
  }
}

impl<P: Send + Sync + 'static> StepRegistry<P> {
  /// Prepares and runs `invocation` against `store`.
  #[instrument(
    name = "StepRegistry::run",
    skip_all,
    fields(target = %invocation.target, input = %invocation.input.display()),
    err(Display)
  )]
  pub async fn run<S>(&self, invocation: &Invocation, store: &S) -> StepwiseResult<ExecutionReport<P>>
  where
    S: DataStore<Payload = P>,
  {
    let tree = self.prepare(invocation)?;
    tree.run(store).await
  }
}
