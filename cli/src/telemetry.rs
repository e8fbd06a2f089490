//! Tracing initialization.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. Logs go to stderr so stdout stays free
/// for `--list` output.
///
/// The level is read from `RUST_LOG`, defaulting to `info`:
///
/// ```bash
/// RUST_LOG=debug stepwise stepwise.builtin.Normalize notes.txt
/// RUST_LOG=stepwise=trace stepwise pipeline.toml notes.txt
/// ```
pub(crate) fn init_tracing() -> anyhow::Result<()> {
  let env_filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new("info"))
    .map_err(|e| anyhow::anyhow!("Failed to create env filter: {e}"))?;

  let fmt_layer = fmt::layer()
    .with_writer(std::io::stderr)
    .with_target(true)
    .with_level(true)
    .with_ansi(true);

  tracing_subscriber::registry()
    .with(fmt_layer)
    .with(env_filter)
    .try_init()
    .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

  Ok(())
}
