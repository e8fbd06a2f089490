// stepwise/src/config/file.rs

//! TOML configuration files.
//!
//! ```toml
//! class = "tests.SavePipeline"   # step type of the root
//! name = "SavePipeline"          # optional root instance name
//! output_dir = "out"             # root parameters
//!
//! [steps.savestep]               # section for the child `savestep`
//! skip = true
//!
//! [steps.savestep.inner]         # sub-tables of a step section are its children
//! save_results = true
//! ```

use crate::error::{StepwiseError, StepwiseResult};
use anyhow::anyhow;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// Parameter values and child sections addressed to one node.
///
/// Values stay textual here; they are coerced by the resolver once the
/// node's declared parameter kinds are known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSection {
  pub values: BTreeMap<String, String>,
  pub children: BTreeMap<String, ConfigSection>,
}

impl ConfigSection {
  /// Case-insensitive lookup of a child section.
  pub fn child(&self, name: &str) -> Option<&ConfigSection> {
    self
      .children
      .iter()
      .find(|(k, _)| k.eq_ignore_ascii_case(name))
      .map(|(_, v)| v)
  }

  /// Follows `names` down the section tree.
  pub fn descend(&self, names: &[String]) -> Option<&ConfigSection> {
    names.iter().try_fold(self, |section, name| section.child(name))
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
  pub path: Option<PathBuf>,
  /// Qualified step type of the root.
  pub class: Option<String>,
  /// Root instance name, overriding the type's default name.
  pub name: Option<String>,
  pub root: ConfigSection,
}

#[derive(Debug, Deserialize)]
struct RawConfigFile {
  class: Option<String>,
  name: Option<String>,
  #[serde(default)]
  steps: Table,
  #[serde(flatten)]
  settings: Table,
}

impl ConfigFile {
  pub fn load(path: &Path) -> StepwiseResult<Self> {
    let text = std::fs::read_to_string(path).map_err(|e| StepwiseError::ConfigFile {
      path: path.to_path_buf(),
      source: anyhow!(e),
    })?;
    let mut file = Self::parse(&text, path)?;
    file.path = Some(path.to_path_buf());
    Ok(file)
  }

  /// Parses configuration text. `origin` is only used in error messages.
  pub fn parse(text: &str, origin: &Path) -> StepwiseResult<Self> {
    let raw: RawConfigFile = toml::from_str(text).map_err(|e| StepwiseError::ConfigFile {
      path: origin.to_path_buf(),
      source: anyhow!(e),
    })?;

    let mut root = ConfigSection::default();
    for (key, value) in raw.settings {
      root.values.insert(key.clone(), scalar_text(&value, "<root>", &key)?);
    }
    for (name, value) in raw.steps {
      let section_path = format!("steps.{}", name);
      match value {
        Value::Table(table) => {
          root.children.insert(name, section_from_table(table, &section_path)?);
        }
        other => {
          return Err(StepwiseError::BadParameterValue {
            step_path: "steps".to_string(),
            key: name,
            value: other.to_string(),
            expected: "step section".to_string(),
          })
        }
      }
    }

    Ok(Self {
      path: None,
      class: raw.class,
      name: raw.name,
      root,
    })
  }
}

fn section_from_table(table: Table, section_path: &str) -> StepwiseResult<ConfigSection> {
  let mut section = ConfigSection::default();
  for (key, value) in table {
    match value {
      Value::Table(child) => {
        let child_path = format!("{}.{}", section_path, key);
        section.children.insert(key, section_from_table(child, &child_path)?);
      }
      scalar => {
        let text = scalar_text(&scalar, section_path, &key)?;
        section.values.insert(key, text);
      }
    }
  }
  Ok(section)
}

fn scalar_text(value: &Value, section_path: &str, key: &str) -> StepwiseResult<String> {
  match value {
    Value::String(s) => Ok(s.clone()),
    Value::Boolean(b) => Ok(b.to_string()),
    Value::Integer(i) => Ok(i.to_string()),
    Value::Float(f) => Ok(f.to_string()),
    other => Err(StepwiseError::BadParameterValue {
      step_path: section_path.to_string(),
      key: key.to_string(),
      value: other.to_string(),
      expected: "scalar".to_string(),
    }),
  }
}
