// stepwise/src/pipeline/tree.rs

//! The step tree of one invocation: an arena of nodes in depth-first
//! declaration order, each carrying its resolved parameters.

use crate::config::resolver::ConfigResolver;
use crate::core::params::ParameterSet;
use crate::core::step::{StepDef, StepKind};
use crate::error::StepwiseResult;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Index of a node in its `StepTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
  pub const ROOT: NodeId = NodeId(0);

  pub fn index(self) -> usize {
    self.0
  }
}

pub struct Node<P: Send + 'static> {
  name: String,
  path: String,
  parent: Option<NodeId>,
  children: Vec<NodeId>,
  params: ParameterSet,
  def: Arc<StepDef<P>>,
}

impl<P: Send + 'static> Node<P> {
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Dotted path from the root, e.g. `SavePipeline.savestep`.
  pub fn path(&self) -> &str {
    &self.path
  }

  pub fn kind(&self) -> StepKind {
    self.def.kind()
  }

  pub fn parent(&self) -> Option<NodeId> {
    self.parent
  }

  pub fn is_root(&self) -> bool {
    self.parent.is_none()
  }

  pub fn children(&self) -> &[NodeId] {
    &self.children
  }

  pub fn params(&self) -> &ParameterSet {
    &self.params
  }

  pub fn def(&self) -> &StepDef<P> {
    &self.def
  }

  /// The instance's `suffix` parameter, falling back to the type's declared suffix.
  pub fn declared_suffix(&self) -> &str {
    self.params.suffix().unwrap_or_else(|| self.def.suffix())
  }

  pub fn renaming_suffix(&self) -> Option<&str> {
    self.def.renaming_suffix()
  }
}

impl<P: Send + 'static> std::fmt::Debug for Node<P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Node")
      .field("path", &self.path)
      .field("type", &self.def.type_name())
      .field("parent", &self.parent)
      .field("children", &self.children)
      .field("params", &self.params)
      .finish()
  }
}

#[derive(Debug)]
pub struct StepTree<P: Send + 'static> {
  nodes: Vec<Node<P>>,
  input: PathBuf,
  working_dir: PathBuf,
}

impl<P: Send + 'static> StepTree<P> {
  /// Builds the tree for `def`, resolving every node's parameters through
  /// `resolver`. All dotted paths are validated first; on error nothing is
  /// returned, so a partially configured tree can never run.
  ///
  /// `working_dir` is the directory outputs default to. It is captured by the
  /// caller once and never re-read.
  #[instrument(
    name = "StepTree::build",
    skip_all,
    fields(root_type = %def.type_name(), input = %input.as_ref().display()),
    err(Display)
  )]
  pub fn build(
    def: Arc<StepDef<P>>,
    root_name: Option<&str>,
    resolver: &ConfigResolver,
    input: impl AsRef<Path>,
    working_dir: impl Into<PathBuf>,
  ) -> StepwiseResult<Self> {
    resolver.validate_paths(def.as_ref())?;

    let root_name = root_name.unwrap_or_else(|| def.default_name()).to_string();
    let mut tree = Self {
      nodes: Vec::new(),
      input: input.as_ref().to_path_buf(),
      working_dir: working_dir.into(),
    };
    tree.add_node(def, root_name, None, &mut Vec::new(), resolver)?;
    event!(Level::DEBUG, nodes = tree.nodes.len(), "Step tree built.");
    Ok(tree)
  }

  fn add_node(
    &mut self,
    def: Arc<StepDef<P>>,
    name: String,
    parent: Option<NodeId>,
    names: &mut Vec<String>,
    resolver: &ConfigResolver,
  ) -> StepwiseResult<NodeId> {
    let path = match parent {
      Some(p) => format!("{}.{}", self.node(p).path, name),
      None => name.clone(),
    };
    let params = resolver.resolve(def.as_ref(), names, &path)?;

    let id = NodeId(self.nodes.len());
    self.nodes.push(Node {
      name,
      path,
      parent,
      children: Vec::new(),
      params,
      def: Arc::clone(&def),
    });

    for child in def.children() {
      names.push(child.name.clone());
      let child_id = self.add_node(Arc::clone(&child.def), child.name.clone(), Some(id), names, resolver)?;
      names.pop();
      self.nodes[id.0].children.push(child_id);
    }
    Ok(id)
  }

  pub fn root(&self) -> &Node<P> {
    &self.nodes[NodeId::ROOT.0]
  }

  /// Panics if `id` does not belong to this tree.
  pub fn node(&self, id: NodeId) -> &Node<P> {
    &self.nodes[id.0]
  }

  pub fn input(&self) -> &Path {
    &self.input
  }

  pub fn working_dir(&self) -> &Path {
    &self.working_dir
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Node ids in execution (depth-first, declaration) order.
  pub fn ids(&self) -> impl Iterator<Item = NodeId> {
    (0..self.nodes.len()).map(NodeId)
  }

  /// Strict ancestors of `id`, nearest first.
  pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::successors(self.node(id).parent, move |p| self.node(*p).parent)
  }

  /// Finds a node by its child-name path below the root (`"a.b"`),
  /// case-insensitively. The empty string is the root.
  pub fn find(&self, relative_path: &str) -> Option<NodeId> {
    if relative_path.is_empty() {
      return Some(NodeId::ROOT);
    }
    relative_path.split('.').try_fold(NodeId::ROOT, |current, segment| {
      self
        .node(current)
        .children
        .iter()
        .copied()
        .find(|c| self.node(*c).name.eq_ignore_ascii_case(segment))
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::assignment::parse_all;
  use crate::config::file::ConfigSection;
  use crate::core::process::Passthrough;
  use crate::error::StepwiseError;

  fn root_def() -> Arc<StepDef<()>> {
    let leaf = |n: &str| -> Arc<StepDef<()>> { Arc::new(StepDef::leaf(n, Arc::new(Passthrough))) };
    let mid = Arc::new(StepDef::pipeline("t.Mid").with_step("x", leaf("t.X")).with_step("y", leaf("t.Y")));
    Arc::new(StepDef::pipeline("t.Root").with_step("first", leaf("t.First")).with_step("mid", mid))
  }

  #[test]
  fn nodes_are_laid_out_depth_first() {
    let tree = StepTree::build(root_def(), None, &ConfigResolver::default(), "in.dat", "/work").unwrap();
    let paths: Vec<&str> = tree.ids().map(|id| tree.node(id).path()).collect();
    assert_eq!(paths, vec!["Root", "Root.first", "Root.mid", "Root.mid.x", "Root.mid.y"]);
    assert!(tree.root().is_root());
    assert_eq!(tree.root().kind(), StepKind::Composite);
    assert_eq!(tree.working_dir(), Path::new("/work"));
  }

  #[test]
  fn find_and_ancestors() {
    let tree = StepTree::build(root_def(), Some("Custom"), &ConfigResolver::default(), "in.dat", "/work").unwrap();
    let y = tree.find("MID.y").unwrap();
    assert_eq!(tree.node(y).path(), "Custom.mid.y");
    let chain: Vec<&str> = tree.ancestors(y).map(|a| tree.node(a).name()).collect();
    assert_eq!(chain, vec!["mid", "Custom"]);
    assert_eq!(tree.find(""), Some(NodeId::ROOT));
    assert_eq!(tree.find("mid.z"), None);
  }

  #[test]
  fn resolution_reaches_nested_nodes() {
    let resolver = ConfigResolver::new(ConfigSection::default(), parse_all(["steps.mid.y.save_results=true"]).unwrap());
    let tree = StepTree::build(root_def(), None, &resolver, "in.dat", "/work").unwrap();
    assert!(tree.node(tree.find("mid.y").unwrap()).params().save_results());
    assert!(!tree.node(tree.find("mid.x").unwrap()).params().save_results());
  }

  #[test]
  fn unknown_path_builds_nothing() {
    let resolver = ConfigResolver::new(ConfigSection::default(), parse_all(["steps.mid.q.skip=true"]).unwrap());
    let err = StepTree::build(root_def(), None, &resolver, "in.dat", "/work").unwrap_err();
    assert!(matches!(err, StepwiseError::UnknownStepPath { .. }));
  }
}
