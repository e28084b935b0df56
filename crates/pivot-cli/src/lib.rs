#![forbid(unsafe_code)]

//! Library side of the `pivot` command-line client.
//!
//! `pivot generate` streams a tree from a live generator over a websocket;
//! `pivot replay` drives the same session logic from a recorded JSONL file.
//! Both render the final (or, with `--watch`, every changed) model as a text
//! outline or as JSON.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod render;
pub mod run;

pub use cli::{Cli, Commands, run, run_from_env};
pub use config::PivotConfig;
pub use error::{CliError, Result};
