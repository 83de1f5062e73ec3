//! Output rendering for a finished run.

pub mod generator;

pub use generator::{render, write_report, RunMetadata};
