// src/lib.rs

//! Stepwise: a hierarchical step/pipeline runner.
//!
//! A root step type (a single step or a pipeline of named steps, possibly
//! nested) is configured from three layers and then executed in declaration
//! order:
//!  - Class defaults declared on each `StepDef`.
//!  - A TOML configuration file, with `[steps.<name>]` sections for children.
//!  - Command-line assignments, `key=value` for the root and
//!    `steps.<name>[.<name>...].key=value` for descendants.
//!
//! Every node then decides whether to persist its result and under which
//! name. Output names carry a trail of suffixes (`<stem>_<suffix><ext>`) so a
//! multi-stage run leaves readable provenance in its file names.

pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

// --- Re-exports for the Public API ---

pub use crate::core::control::{Artifact, ExecutionReport};
pub use crate::core::params::{ParamKind, ParamValue, ParameterSet, Provenance};
pub use crate::core::process::{process_fn, Passthrough, Process};
pub use crate::core::step::{StepDef, StepKind};
pub use crate::core::store::{DataStore, FileStore};

pub use crate::config::{Assignment, ConfigFile, ConfigResolver};
pub use crate::pipeline::{NodeId, OutputResolver, StepTree, WorkingStem};

pub use crate::error::{StepwiseError, StepwiseResult};

pub use crate::registry::{Invocation, StepRegistry};

/*
    Typical use:
    1. Declare step types with `StepDef::leaf` / `StepDef::pipeline`, giving
       each a processor, a declared suffix and, where the step renames its
       output, a renaming suffix.
    2. Register the root types in a `StepRegistry`.
    3. Build an `Invocation` from the target, the input path and the raw
       `key=value` overrides.
    4. `registry.run(&invocation, &store).await` resolves configuration, builds
       the tree, loads the input and executes it; the returned report lists
       every artifact written.
*/
