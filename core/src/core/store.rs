// stepwise/src/core/store.rs

//! The I/O collaborator that loads the input artifact and persists results.

use anyhow::{bail, Context};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{event, Level};

/// Loads the invocation's input and persists node results.
///
/// `save` receives the payload by reference: after a node saves, the same
/// payload is still the input of the next node.
#[async_trait]
pub trait DataStore: Send + Sync {
  type Payload: Send + Sync + 'static;

  async fn load(&self, path: &Path) -> anyhow::Result<Self::Payload>;

  /// Writes `payload` as `dir/filename`, replacing any existing file, and
  /// returns the written path.
  async fn save(&self, payload: &Self::Payload, dir: &Path, filename: &str) -> anyhow::Result<PathBuf>;
}

/// Byte-level store over the local filesystem.
///
/// Output directories are never created: saving into a directory that does
/// not exist fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

#[async_trait]
impl DataStore for FileStore {
  type Payload = Vec<u8>;

  async fn load(&self, path: &Path) -> anyhow::Result<Vec<u8>> {
    event!(Level::DEBUG, path = %path.display(), "Loading input.");
    fs::read(path).await.with_context(|| format!("reading {}", path.display()))
  }

  async fn save(&self, payload: &Vec<u8>, dir: &Path, filename: &str) -> anyhow::Result<PathBuf> {
    match fs::metadata(dir).await {
      Ok(meta) if meta.is_dir() => {}
      _ => bail!("output directory {} does not exist", dir.display()),
    }
    let target = dir.join(filename);
    fs::write(&target, payload)
      .await
      .with_context(|| format!("writing {}", target.display()))?;
    event!(Level::DEBUG, path = %target.display(), bytes = payload.len(), "Artifact written.");
    Ok(target)
  }
}
