pub mod control;
pub mod params;
pub mod process;
pub mod step;
pub mod store;

// Re-export key types for easier access from other modules (and lib.rs)
pub use control::{Artifact, ExecutionReport};
pub use params::{ParamKind, ParamSpec, ParamValue, ParameterSet, Provenance};
pub use process::{process_fn, Passthrough, Process};
pub use step::{ChildDecl, StepDef, StepKind};
pub use store::{DataStore, FileStore};
