//! Remote repository handling.

pub mod cloner;

pub use cloner::{clone_repository, repo_label, CloneOptions};
