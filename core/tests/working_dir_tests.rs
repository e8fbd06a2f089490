// tests/working_dir_tests.rs
//! These tests change the process working directory, so they live in their
//! own test binary and run one at a time.
mod common;

use common::*;
use serial_test::serial;
use stepwise::{FileStore, Invocation, StepwiseError};

#[tokio::test]
#[serial]
async fn test_default_output_dir_is_the_directory_at_invocation_time() {
  setup_tracing();
  let dirs = Dirs::new();
  let input = dirs.input("flat.fits");
  let previous = std::env::current_dir().unwrap();

  std::env::set_current_dir(dirs.current()).unwrap();
  let inv = Invocation::new("tests.steps.StepWithModel", &input, Vec::<String>::new());
  std::env::set_current_dir(&previous).unwrap();

  // The run happens after the directory changed back; outputs still land in
  // the directory captured when the invocation was created.
  registry().run(&inv.unwrap(), &FileStore).await.unwrap();
  assert!(dirs.current().join("flat_StepWithModel.fits").is_file());
}

#[cfg(unix)]
#[tokio::test]
#[serial]
async fn test_unreadable_working_directory_is_reported() {
  setup_tracing();
  let dirs = Dirs::new();
  let input = dirs.input("flat.fits");
  let previous = std::env::current_dir().unwrap();
  let doomed = dirs.current().join("doomed");
  std::fs::create_dir(&doomed).unwrap();

  std::env::set_current_dir(&doomed).unwrap();
  std::fs::remove_dir(&doomed).unwrap();
  let result = Invocation::new("tests.steps.StepWithModel", &input, Vec::<String>::new());
  std::env::set_current_dir(&previous).unwrap();

  match result {
    Err(err @ StepwiseError::WorkingDirectory { .. }) => assert!(err.is_configuration_error()),
    other => panic!("Expected WorkingDirectory, got {:?}", other),
  }
}
