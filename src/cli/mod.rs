//! Command Line Interface (CLI) layer for s2series.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) that loads a JSON parameter preset,
//! applies flag overrides and runs the file-to-directory flow exposed via
//! `s2series::api`.
//!
//! If you are embedding s2series into another application, prefer using
//! the high-level `s2series::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
