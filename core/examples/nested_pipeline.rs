// stepwise/examples/nested_pipeline.rs

use std::sync::Arc;
use stepwise::{process_fn, FileStore, Invocation, StepDef, StepRegistry, StepwiseError};
use tracing::info;

type Text = Vec<u8>;

fn append(label: &'static str) -> Arc<dyn stepwise::Process<Text>> {
  process_fn(move |mut data: Text, _params| {
    data.extend_from_slice(label.as_bytes());
    data.push(b'\n');
    Ok(data)
  })
}

#[tokio::main]
async fn main() -> Result<(), StepwiseError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Nested Pipeline Example ---");

  // 1. Declare the step types. `clean` renames its output so everything
  //    after it carries "_clean" in its name.
  let clean = Arc::new(
    StepDef::leaf("demo.Clean", append("cleaned"))
      .with_suffix("clean")
      .with_renaming_suffix("clean"),
  );
  let measure = Arc::new(StepDef::leaf("demo.Measure", append("measured")).with_suffix("meas"));
  let calibrate = Arc::new(
    StepDef::pipeline("demo.Calibrate")
      .with_suffix("cal")
      .with_step("measure", measure),
  );
  let reduce = Arc::new(
    StepDef::pipeline("demo.Reduce")
      .with_suffix("red")
      .with_step("clean", clean)
      .with_step("calibrate", calibrate),
  );

  // 2. Register the root type.
  let registry = StepRegistry::new();
  registry.register(reduce);

  // 3. Run it on a scratch input with a couple of overrides.
  let workdir = std::env::temp_dir().join("stepwise-nested-demo");
  std::fs::create_dir_all(&workdir).map_err(|e| StepwiseError::LoadFailure {
    path: workdir.clone(),
    source: e.into(),
  })?;
  let input = workdir.join("night1.txt");
  std::fs::write(&input, b"raw\n").map_err(|e| StepwiseError::LoadFailure {
    path: input.clone(),
    source: e.into(),
  })?;

  let invocation = Invocation::new(
    "demo.Reduce",
    &input,
    ["--steps.calibrate.save_results=true", "steps.calibrate.measure.save_results=true"],
  )?
  .with_working_dir(&workdir);

  let report = registry.run(&invocation, &FileStore).await?;

  // 4. night1_clean_meas.txt, night1_clean_cal.txt, night1_clean_red.txt
  for artifact in &report.artifacts {
    info!("{} -> {}", artifact.step_path, artifact.path.display());
  }
  info!("Final output:\n{}", String::from_utf8_lossy(&report.output));

  Ok(())
}
