//! Pathname expansion support built on the virtual filesystem.

pub mod glob_expander;
pub mod glob_helpers;

pub use glob_expander::{GlobExpander, GlobOptions};
