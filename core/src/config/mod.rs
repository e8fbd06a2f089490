// stepwise/src/config/mod.rs

//! The configuration cascade: command-line assignments, configuration files,
//! and the resolver that layers them over class defaults.

pub mod assignment;
pub mod file;
pub mod resolver;

pub use assignment::Assignment;
pub use file::{ConfigFile, ConfigSection};
pub use resolver::ConfigResolver;
