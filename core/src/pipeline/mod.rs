// stepwise/src/pipeline/mod.rs

//! Defines the `StepTree`, its output naming, and its execution.

pub mod execution;
pub mod output;
pub mod tree;

pub use output::{OutputResolver, OutputTarget, WorkingStem};
pub use tree::{Node, NodeId, StepTree};
