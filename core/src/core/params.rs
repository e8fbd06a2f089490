// stepwise/src/core/params.rs

//! Typed parameter values, their declarations, and the per-node `ParameterSet`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Directory a node's artifact is written to. Inherited from ancestors when unset.
pub const OUTPUT_DIR: &str = "output_dir";
/// Explicit output name (may carry an extension).
pub const OUTPUT_FILE: &str = "output_file";
/// Whether a non-root node persists its result.
pub const SAVE_RESULTS: &str = "save_results";
/// Bypass processing and saving for a non-root node.
pub const SKIP: &str = "skip";
/// Per-instance override of the declared suffix.
pub const SUFFIX: &str = "suffix";

/// The literal that unsets a parameter from file or command line.
pub(crate) const NONE_LITERAL: &str = "none";

/// The kind a parameter's textual value is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
  Bool,
  Int,
  Float,
  Str,
  Path,
}

impl ParamKind {
  pub fn name(&self) -> &'static str {
    match self {
      ParamKind::Bool => "boolean",
      ParamKind::Int => "integer",
      ParamKind::Float => "float",
      ParamKind::Str => "string",
      ParamKind::Path => "path",
    }
  }

  /// Coerces raw text into a value of this kind. `None` if the text does not parse.
  pub fn coerce(&self, raw: &str) -> Option<ParamValue> {
    let text = raw.trim();
    match self {
      ParamKind::Bool => match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(ParamValue::Bool(true)),
        "false" | "no" | "off" | "0" => Some(ParamValue::Bool(false)),
        _ => None,
      },
      ParamKind::Int => text.parse::<i64>().ok().map(ParamValue::Int),
      ParamKind::Float => text.parse::<f64>().ok().map(ParamValue::Float),
      ParamKind::Str => Some(ParamValue::Str(text.to_string())),
      ParamKind::Path => {
        if text.is_empty() {
          None
        } else {
          Some(ParamValue::Path(PathBuf::from(text)))
        }
      }
    }
  }
}

/// A coerced parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
  Path(PathBuf),
}

impl ParamValue {
  pub fn kind(&self) -> ParamKind {
    match self {
      ParamValue::Bool(_) => ParamKind::Bool,
      ParamValue::Int(_) => ParamKind::Int,
      ParamValue::Float(_) => ParamKind::Float,
      ParamValue::Str(_) => ParamKind::Str,
      ParamValue::Path(_) => ParamKind::Path,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      ParamValue::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      ParamValue::Int(i) => Some(*i),
      _ => None,
    }
  }

  /// Integers widen to floats.
  pub fn as_float(&self) -> Option<f64> {
    match self {
      ParamValue::Float(f) => Some(*f),
      ParamValue::Int(i) => Some(*i as f64),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      ParamValue::Str(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_path(&self) -> Option<&Path> {
    match self {
      ParamValue::Path(p) => Some(p),
      _ => None,
    }
  }
}

impl fmt::Display for ParamValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ParamValue::Bool(b) => write!(f, "{}", b),
      ParamValue::Int(i) => write!(f, "{}", i),
      ParamValue::Float(x) => write!(f, "{}", x),
      ParamValue::Str(s) => f.write_str(s),
      ParamValue::Path(p) => write!(f, "{}", p.display()),
    }
  }
}

/// Which configuration layer last set a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Provenance {
  Default,
  File,
  Cli,
}

/// Class-level declaration of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
  pub name: String,
  pub kind: ParamKind,
  pub default: Option<ParamValue>,
}

impl ParamSpec {
  pub fn new(name: impl Into<String>, kind: ParamKind, default: Option<ParamValue>) -> Self {
    Self {
      name: name.into(),
      kind,
      default,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
  pub value: Option<ParamValue>,
  pub provenance: Provenance,
}

/// The resolved parameters of one node.
///
/// Built by the config resolver, read-only afterwards: outside the crate only
/// accessors are available.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
  entries: BTreeMap<String, Param>,
}

impl ParameterSet {
  /// Seeds a set with every declared parameter at its class default.
  pub fn from_specs(specs: &[ParamSpec]) -> Self {
    let entries = specs
      .iter()
      .map(|spec| {
        (
          spec.name.clone(),
          Param {
            value: spec.default.clone(),
            provenance: Provenance::Default,
          },
        )
      })
      .collect();
    Self { entries }
  }

  pub(crate) fn set(&mut self, key: &str, value: Option<ParamValue>, provenance: Provenance) {
    self.entries.insert(key.to_string(), Param { value, provenance });
  }

  pub fn param(&self, key: &str) -> Option<&Param> {
    self.entries.get(key)
  }

  pub fn get(&self, key: &str) -> Option<&ParamValue> {
    self.entries.get(key).and_then(|p| p.value.as_ref())
  }

  pub fn provenance(&self, key: &str) -> Option<Provenance> {
    self.entries.get(key).map(|p| p.provenance)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.entries.contains_key(key)
  }

  pub fn bool(&self, key: &str) -> Option<bool> {
    self.get(key).and_then(ParamValue::as_bool)
  }

  pub fn int(&self, key: &str) -> Option<i64> {
    self.get(key).and_then(ParamValue::as_int)
  }

  pub fn float(&self, key: &str) -> Option<f64> {
    self.get(key).and_then(ParamValue::as_float)
  }

  pub fn str(&self, key: &str) -> Option<&str> {
    self.get(key).and_then(ParamValue::as_str)
  }

  pub fn path(&self, key: &str) -> Option<&Path> {
    self.get(key).and_then(ParamValue::as_path)
  }

  pub fn output_dir(&self) -> Option<&Path> {
    self.path(OUTPUT_DIR)
  }

  pub fn output_file(&self) -> Option<&Path> {
    self.path(OUTPUT_FILE)
  }

  pub fn save_results(&self) -> bool {
    self.bool(SAVE_RESULTS).unwrap_or(false)
  }

  pub fn skip(&self) -> bool {
    self.bool(SKIP).unwrap_or(false)
  }

  pub fn suffix(&self) -> Option<&str> {
    self.str(SUFFIX).filter(|s| !s.is_empty())
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bool_coercion_accepts_common_spellings() {
    for raw in ["True", "yes", "ON", "1", " true "] {
      assert_eq!(ParamKind::Bool.coerce(raw), Some(ParamValue::Bool(true)), "{raw}");
    }
    for raw in ["False", "no", "off", "0"] {
      assert_eq!(ParamKind::Bool.coerce(raw), Some(ParamValue::Bool(false)), "{raw}");
    }
    assert_eq!(ParamKind::Bool.coerce("maybe"), None);
  }

  #[test]
  fn numeric_and_path_coercion() {
    assert_eq!(ParamKind::Int.coerce("42"), Some(ParamValue::Int(42)));
    assert_eq!(ParamKind::Int.coerce("4.2"), None);
    assert_eq!(ParamKind::Float.coerce("4.5"), Some(ParamValue::Float(4.5)));
    assert_eq!(ParamKind::Path.coerce("out/dir"), Some(ParamValue::Path(PathBuf::from("out/dir"))));
    assert_eq!(ParamKind::Path.coerce("  "), None);
  }

  #[test]
  fn defaults_carry_default_provenance() {
    let set = ParameterSet::from_specs(&[
      ParamSpec::new(SKIP, ParamKind::Bool, Some(ParamValue::Bool(false))),
      ParamSpec::new(OUTPUT_DIR, ParamKind::Path, None),
    ]);
    assert_eq!(set.len(), 2);
    assert!(!set.skip());
    assert_eq!(set.output_dir(), None);
    assert_eq!(set.provenance(OUTPUT_DIR), Some(Provenance::Default));
  }

  #[test]
  fn int_widens_to_float() {
    assert_eq!(ParamValue::Int(3).as_float(), Some(3.0));
  }
}
