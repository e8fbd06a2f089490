// stepwise/examples/config_file.rs

use std::sync::Arc;
use stepwise::{process_fn, FileStore, Invocation, ParamKind, ParamValue, StepDef, StepRegistry};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

  info!("--- Configuration File Example ---");

  let repeat = Arc::new(
    StepDef::leaf(
      "demo.Repeat",
      process_fn(|data: Vec<u8>, params| {
        let times = params.int("times").unwrap_or(1).max(0) as usize;
        Ok(data.repeat(times))
      }),
    )
    .with_suffix("rep")
    .with_param("times", ParamKind::Int, Some(ParamValue::Int(1))),
  );
  let registry = StepRegistry::new();
  registry.register(Arc::new(StepDef::pipeline("demo.Echo").with_step("repeat", repeat)));

  let workdir = tempfile::tempdir()?;
  std::fs::create_dir(workdir.path().join("out"))?;
  let config = workdir.path().join("echo.toml");
  std::fs::write(
    &config,
    r#"
class = "demo.Echo"
name = "Loud"
output_dir = "out"

[steps.repeat]
times = 2
save_results = true
"#,
  )?;
  let input = workdir.path().join("word.txt");
  std::fs::write(&input, b"hey ")?;

  // The command line wins over the file: three repetitions, not two.
  let invocation = Invocation::new(config.display().to_string(), &input, ["steps.repeat.times=3"])?
    .with_working_dir(workdir.path());
  let report = registry.run(&invocation, &FileStore).await?;

  for artifact in &report.artifacts {
    info!("{} -> {}", artifact.step_path, artifact.path.display());
  }
  info!("Output: {}", String::from_utf8_lossy(&report.output));
  Ok(())
}
