// stepwise/src/pipeline/output.rs

//! Output naming: where a node saves, under which name, and how the working
//! stem moves forward as nodes execute.
//!
//! Everything here is a pure function of the tree (parameters, suffixes, the
//! captured working directory) and the current `WorkingStem`.

use crate::core::step::StepKind;
use crate::pipeline::tree::{NodeId, StepTree};
use std::path::{Path, PathBuf};

/// The base file name threaded through execution, plus the extension outputs
/// reuse when no explicit one is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingStem {
  stem: String,
  /// Includes the leading dot; empty when the input has no extension.
  extension: String,
}

impl WorkingStem {
  pub fn new(stem: impl Into<String>, extension: impl Into<String>) -> Self {
    Self {
      stem: stem.into(),
      extension: extension.into(),
    }
  }

  pub fn from_path(path: &Path) -> Self {
    let (stem, extension) = split_name(path);
    Self::new(stem, extension.unwrap_or_default())
  }

  pub fn stem(&self) -> &str {
    &self.stem
  }

  pub fn extension(&self) -> &str {
    &self.extension
  }
}

/// Directory and file name a node persists to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
  pub dir: PathBuf,
  pub filename: String,
}

impl OutputTarget {
  pub fn path(&self) -> PathBuf {
    self.dir.join(&self.filename)
  }
}

/// Splits the file-name part of `path` into its stem and dotted extension.
fn split_name(path: &Path) -> (String, Option<String>) {
  let stem = path
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_default();
  let extension = path.extension().map(|e| format!(".{}", e.to_string_lossy()));
  (stem, extension)
}

fn with_suffix(stem: &str, suffix: &str) -> String {
  if suffix.is_empty() {
    stem.to_string()
  } else {
    format!("{}_{}", stem, suffix)
  }
}

pub struct OutputResolver<'t, P: Send + 'static> {
  tree: &'t StepTree<P>,
}

impl<'t, P: Send + 'static> OutputResolver<'t, P> {
  pub fn new(tree: &'t StepTree<P>) -> Self {
    Self { tree }
  }

  /// Stem before the first node runs: the root's `output_file` stem if one
  /// is given, otherwise the input's stem. The extension always comes from
  /// the input.
  pub fn initial_stem(&self) -> WorkingStem {
    let input = WorkingStem::from_path(self.tree.input());
    match self.tree.root().params().output_file() {
      Some(file) => WorkingStem::new(split_name(file).0, input.extension),
      None => input,
    }
  }

  /// Own `output_dir`, else the nearest ancestor's, else the working
  /// directory. Relative directories are taken from the working directory.
  pub fn output_dir(&self, id: NodeId) -> PathBuf {
    let explicit = std::iter::once(id)
      .chain(self.tree.ancestors(id))
      .find_map(|n| self.tree.node(n).params().output_dir());
    match explicit {
      Some(dir) => self.tree.working_dir().join(dir),
      None => self.tree.working_dir().to_path_buf(),
    }
  }

  /// The root always persists; other nodes only when `save_results` is set
  /// and `skip` is not.
  pub fn should_persist(&self, id: NodeId) -> bool {
    let node = self.tree.node(id);
    if node.is_root() {
      return true;
    }
    node.params().save_results() && !node.params().skip()
  }

  /// Where `id` saves, given the stem current when it finished processing.
  pub fn target(&self, id: NodeId, stem: &WorkingStem) -> OutputTarget {
    let node = self.tree.node(id);
    let suffix = node.declared_suffix();

    let filename = match node.params().output_file() {
      Some(file) => {
        let (file_stem, file_ext) = split_name(file);
        if node.is_root() {
          // Only the root may choose its own extension.
          let ext = file_ext.unwrap_or_else(|| stem.extension().to_string());
          match node.kind() {
            StepKind::Leaf => format!("{}{}", file_stem, ext),
            StepKind::Composite => format!("{}{}", with_suffix(&file_stem, suffix), ext),
          }
        } else {
          format!("{}{}", with_suffix(&file_stem, suffix), stem.extension())
        }
      }
      None => format!("{}{}", with_suffix(stem.stem(), suffix), stem.extension()),
    };

    OutputTarget {
      dir: self.output_dir(id),
      filename,
    }
  }

  /// Called before a non-root composite runs its children. An explicit
  /// `output_file` replaces the stem here, so the composite's descendants
  /// already save under it.
  pub fn enter(&self, id: NodeId, stem: &mut WorkingStem) {
    let node = self.tree.node(id);
    if node.is_root() || node.kind() != StepKind::Composite {
      return;
    }
    if let Some(file) = node.params().output_file() {
      stem.stem = split_name(file).0;
    }
  }

  /// Moves the stem past a non-root node that has processed. An explicit
  /// `output_file` replaces the stem (for composites this already happened
  /// in [`OutputResolver::enter`]); otherwise a renaming suffix is appended.
  /// Nodes with neither leave it alone.
  pub fn advance(&self, id: NodeId, stem: &mut WorkingStem) {
    let node = self.tree.node(id);
    if node.is_root() {
      return;
    }
    if let Some(file) = node.params().output_file() {
      if node.kind() == StepKind::Leaf {
        stem.stem = split_name(file).0;
      }
    } else if let Some(renaming) = node.renaming_suffix() {
      stem.stem = with_suffix(&stem.stem, renaming);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::assignment::parse_all;
  use crate::config::file::ConfigSection;
  use crate::config::resolver::ConfigResolver;
  use crate::core::process::Passthrough;
  use crate::core::step::StepDef;
  use std::sync::Arc;

  fn proper_pipeline() -> Arc<StepDef<()>> {
    let swm = Arc::new(StepDef::leaf("t.StepWithModel", Arc::new(Passthrough)).with_suffix("swm"));
    let aswm = Arc::new(StepDef::leaf("t.AnotherStepWithModel", Arc::new(Passthrough)).with_suffix("aswm"));
    let save = Arc::new(
      StepDef::leaf("t.SaveStep", Arc::new(Passthrough))
        .with_suffix("processed")
        .with_renaming_suffix("processed"),
    );
    Arc::new(
      StepDef::pipeline("t.ProperPipeline")
        .with_suffix("pp")
        .with_step("stepwithmodel", swm)
        .with_step("another_stepwithmodel", aswm)
        .with_step("savestep", save),
    )
  }

  fn build(args: &[&str]) -> StepTree<()> {
    let resolver = ConfigResolver::new(ConfigSection::default(), parse_all(args).unwrap());
    StepTree::build(proper_pipeline(), None, &resolver, "/data/ppbase.fits", "/cwd").unwrap()
  }

  #[test]
  fn root_name_uses_input_stem_and_root_suffix() {
    let tree = build(&[]);
    let out = OutputResolver::new(&tree);
    let stem = out.initial_stem();
    assert_eq!(stem, WorkingStem::new("ppbase", ".fits"));
    assert_eq!(out.target(NodeId::ROOT, &stem).path(), PathBuf::from("/cwd/ppbase_pp.fits"));
    assert!(out.should_persist(NodeId::ROOT));
  }

  #[test]
  fn output_dir_inherits_from_nearest_ancestor() {
    let tree = build(&["output_dir=/out", "steps.another_stepwithmodel.output_dir=/elsewhere"]);
    let out = OutputResolver::new(&tree);
    assert_eq!(out.output_dir(tree.find("stepwithmodel").unwrap()), PathBuf::from("/out"));
    assert_eq!(
      out.output_dir(tree.find("another_stepwithmodel").unwrap()),
      PathBuf::from("/elsewhere")
    );
    assert_eq!(out.output_dir(NodeId::ROOT), PathBuf::from("/out"));
  }

  #[test]
  fn relative_output_dir_is_taken_from_working_dir() {
    let tree = build(&["output_dir=results"]);
    assert_eq!(OutputResolver::new(&tree).output_dir(NodeId::ROOT), PathBuf::from("/cwd/results"));
  }

  #[test]
  fn renaming_step_saves_under_incoming_stem_then_renames() {
    let tree = build(&[]);
    let out = OutputResolver::new(&tree);
    let save = tree.find("savestep").unwrap();
    let mut stem = out.initial_stem();
    assert_eq!(out.target(save, &stem).filename, "ppbase_processed.fits");
    out.advance(save, &mut stem);
    assert_eq!(stem.stem(), "ppbase_processed");
    assert_eq!(out.target(NodeId::ROOT, &stem).filename, "ppbase_processed_pp.fits");
  }

  #[test]
  fn plain_steps_leave_the_stem_alone() {
    let tree = build(&[]);
    let out = OutputResolver::new(&tree);
    let mut stem = out.initial_stem();
    out.advance(tree.find("stepwithmodel").unwrap(), &mut stem);
    assert_eq!(stem.stem(), "ppbase");
  }

  #[test]
  fn persistence_rules() {
    let tree = build(&[
      "save_results=false",
      "steps.stepwithmodel.save_results=true",
      "steps.another_stepwithmodel.save_results=true",
      "steps.another_stepwithmodel.skip=true",
    ]);
    let out = OutputResolver::new(&tree);
    assert!(out.should_persist(NodeId::ROOT));
    assert!(out.should_persist(tree.find("stepwithmodel").unwrap()));
    assert!(!out.should_persist(tree.find("another_stepwithmodel").unwrap()));
    assert!(!out.should_persist(tree.find("savestep").unwrap()));
  }

  #[test]
  fn root_output_file_fixes_the_stem() {
    let tree = build(&["output_file=junk.fits"]);
    let out = OutputResolver::new(&tree);
    let stem = out.initial_stem();
    assert_eq!(stem.stem(), "junk");
    assert_eq!(out.target(NodeId::ROOT, &stem).filename, "junk_pp.fits");
  }

  #[test]
  fn root_output_file_without_extension_reuses_input_extension() {
    let tree = build(&["output_file=junk"]);
    let out = OutputResolver::new(&tree);
    assert_eq!(out.target(NodeId::ROOT, &out.initial_stem()).filename, "junk_pp.fits");
  }

  #[test]
  fn leaf_root_output_file_is_used_verbatim() {
    let def = Arc::new(StepDef::<()>::leaf("t.StepWithModel", Arc::new(Passthrough)));
    let resolver = ConfigResolver::new(ConfigSection::default(), parse_all(["output_file=result"]).unwrap());
    let tree = StepTree::build(def, None, &resolver, "flat.fits", "/cwd").unwrap();
    let out = OutputResolver::new(&tree);
    assert_eq!(out.target(NodeId::ROOT, &out.initial_stem()).filename, "result.fits");
  }

  #[test]
  fn intermediate_output_file_becomes_the_new_stem() {
    let tree = build(&["steps.stepwithmodel.output_file=renamed.dat"]);
    let out = OutputResolver::new(&tree);
    let swm = tree.find("stepwithmodel").unwrap();
    let mut stem = out.initial_stem();
    assert_eq!(out.target(swm, &stem).filename, "renamed_swm.fits");
    out.advance(swm, &mut stem);
    assert_eq!(stem, WorkingStem::new("renamed", ".fits"));
  }

  #[test]
  fn root_output_file_keeps_its_own_extension() {
    let tree = build(&["output_file=junk.dat"]);
    let out = OutputResolver::new(&tree);
    assert_eq!(out.target(NodeId::ROOT, &out.initial_stem()).filename, "junk_pp.dat");
  }

  #[test]
  fn composite_output_file_renames_its_descendants() {
    let leaf = Arc::new(StepDef::<()>::leaf("t.Leaf", Arc::new(Passthrough)).with_suffix("lf"));
    let mid = Arc::new(StepDef::pipeline("t.Mid").with_suffix("md").with_step("b", leaf));
    let root = Arc::new(StepDef::pipeline("t.Outer").with_suffix("out").with_step("a", mid));
    let resolver = ConfigResolver::new(ConfigSection::default(), parse_all(["steps.a.output_file=foo.txt"]).unwrap());
    let tree = StepTree::build(root, None, &resolver, "/data/obs.dat", "/cwd").unwrap();
    let out = OutputResolver::new(&tree);
    let (a, b) = (tree.find("a").unwrap(), tree.find("a.b").unwrap());

    let mut stem = out.initial_stem();
    out.enter(a, &mut stem);
    assert_eq!(out.target(b, &stem).filename, "foo_lf.dat");
    out.advance(b, &mut stem);
    assert_eq!(out.target(a, &stem).filename, "foo_md.dat");
    out.advance(a, &mut stem);
    assert_eq!(stem.stem(), "foo");
  }

  #[test]
  fn suffix_parameter_overrides_declared_suffix() {
    let tree = build(&["suffix=final"]);
    let out = OutputResolver::new(&tree);
    assert_eq!(out.target(NodeId::ROOT, &out.initial_stem()).filename, "ppbase_final.fits");
  }
}
