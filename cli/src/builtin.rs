//! Step types shipped with the binary. All of them operate on raw bytes.

use std::sync::Arc;
use stepwise::{process_fn, ParamKind, ParamValue, StepDef, StepRegistry};

pub(crate) type Bytes = Vec<u8>;

fn upper() -> Arc<StepDef<Bytes>> {
  Arc::new(
    StepDef::leaf(
      "stepwise.builtin.Upper",
      process_fn(|data: Bytes, _params| Ok(data.to_ascii_uppercase())),
    )
    .with_suffix("upper"),
  )
}

fn lower() -> Arc<StepDef<Bytes>> {
  Arc::new(
    StepDef::leaf(
      "stepwise.builtin.Lower",
      process_fn(|data: Bytes, _params| Ok(data.to_ascii_lowercase())),
    )
    .with_suffix("lower"),
  )
}

/// Strips surrounding whitespace, per line when `per_line` is set.
fn trim() -> Arc<StepDef<Bytes>> {
  Arc::new(
    StepDef::leaf(
      "stepwise.builtin.Trim",
      process_fn(|data: Bytes, params| {
        if params.bool("per_line").unwrap_or(false) {
          let lines: Vec<&[u8]> = data.split(|b| *b == b'\n').map(<[u8]>::trim_ascii).collect();
          Ok(lines.join(&b'\n'))
        } else {
          Ok(data.trim_ascii().to_vec())
        }
      }),
    )
    .with_suffix("trim")
    .with_renaming_suffix("trimmed")
    .with_param("per_line", ParamKind::Bool, Some(ParamValue::Bool(false))),
  )
}

fn normalize() -> Arc<StepDef<Bytes>> {
  Arc::new(
    StepDef::pipeline("stepwise.builtin.Normalize")
      .with_suffix("norm")
      .with_step("trim", trim())
      .with_step("lower", lower()),
  )
}

pub(crate) fn registry() -> StepRegistry<Bytes> {
  let registry = StepRegistry::new();
  for def in [upper(), lower(), trim(), normalize()] {
    registry.register(def);
  }
  registry
}
