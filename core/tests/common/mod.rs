// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stepwise::{process_fn, DataStore, FileStore, ParamKind, ParamValue, StepDef, StepRegistry};
use tracing::Level;

pub type Bytes = Vec<u8>;

// --- Step type declarations mirroring a small test library ---

/// Appends `label` and a separator to the payload, so tests can read the
/// execution order back from the output.
pub fn tag(label: &'static str) -> Arc<dyn stepwise::Process<Bytes>> {
  process_fn(move |mut data: Bytes, _params| {
    data.extend_from_slice(label.as_bytes());
    data.push(b';');
    Ok(data)
  })
}

pub fn failing(message: &'static str) -> Arc<dyn stepwise::Process<Bytes>> {
  process_fn(move |_data: Bytes, _params| Err(anyhow::anyhow!(message)))
}

pub fn step_with_model() -> Arc<StepDef<Bytes>> {
  Arc::new(StepDef::leaf("tests.steps.StepWithModel", tag("swm")))
}

pub fn proper_pipeline() -> Arc<StepDef<Bytes>> {
  let swm = Arc::new(StepDef::leaf("tests.steps.StepWithModel", tag("swm")).with_suffix("swm"));
  let aswm = Arc::new(StepDef::leaf("tests.steps.AnotherStepWithModel", tag("aswm")).with_suffix("aswm"));
  Arc::new(
    StepDef::pipeline("tests.steps.ProperPipeline")
      .with_suffix("pp")
      .with_step("stepwithmodel", swm)
      .with_step("another_stepwithmodel", aswm),
  )
}

/// A step that saves unless told otherwise and renames the stem for
/// everything after it.
pub fn save_step() -> Arc<StepDef<Bytes>> {
  Arc::new(
    StepDef::leaf("tests.steps.SaveStep", tag("save"))
      .with_suffix("processed")
      .with_renaming_suffix("processed")
      .with_default("save_results", ParamValue::Bool(true))
      .with_param("scale", ParamKind::Float, Some(ParamValue::Float(1.0))),
  )
}

pub fn save_pipeline() -> Arc<StepDef<Bytes>> {
  Arc::new(StepDef::pipeline("tests.steps.SavePipeline").with_step("savestep", save_step()))
}

pub fn registry() -> StepRegistry<Bytes> {
  let registry = StepRegistry::new();
  registry.register(step_with_model());
  registry.register(proper_pipeline());
  registry.register(save_step());
  registry.register(save_pipeline());
  registry
}

// --- Scratch directories, like a fresh checkout per test ---

pub struct Dirs {
  pub current: tempfile::TempDir,
  pub data: tempfile::TempDir,
  pub config: tempfile::TempDir,
}

impl Dirs {
  pub fn new() -> Self {
    Self {
      current: tempfile::tempdir().unwrap(),
      data: tempfile::tempdir().unwrap(),
      config: tempfile::tempdir().unwrap(),
    }
  }

  pub fn current(&self) -> &Path {
    self.current.path()
  }

  pub fn data(&self) -> &Path {
    self.data.path()
  }

  pub fn config(&self) -> &Path {
    self.config.path()
  }

  /// Writes an input file into the data directory and returns its path.
  pub fn input(&self, name: &str) -> PathBuf {
    let path = self.data().join(name);
    std::fs::write(&path, b"input;").unwrap();
    path
  }

  pub fn write_config(&self, name: &str, text: &str) -> PathBuf {
    let path = self.config().join(name);
    std::fs::write(&path, text).unwrap();
    path
  }
}

/// Sorted file names directly under `dir`.
pub fn files_in(dir: &Path) -> Vec<String> {
  let mut names: Vec<String> = std::fs::read_dir(dir)
    .unwrap()
    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
    .collect();
  names.sort();
  names
}

// --- A store that counts what the engine asks of it ---

#[derive(Default)]
pub struct CountingStore {
  pub inner: FileStore,
  pub loads: AtomicUsize,
  pub saves: AtomicUsize,
}

#[async_trait]
impl DataStore for CountingStore {
  type Payload = Bytes;

  async fn load(&self, path: &Path) -> anyhow::Result<Bytes> {
    self.loads.fetch_add(1, Ordering::SeqCst);
    self.inner.load(path).await
  }

  async fn save(&self, payload: &Bytes, dir: &Path, filename: &str) -> anyhow::Result<PathBuf> {
    self.saves.fetch_add(1, Ordering::SeqCst);
    self.inner.save(payload, dir, filename).await
  }
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
