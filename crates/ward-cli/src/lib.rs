//! Ward Assist CLI library.
//!
//! This crate provides the command-line interface, the interactive REPL,
//! and the launcher for the HTTP API.

pub mod cli;
pub mod commands;
pub mod error;
pub mod repl;

pub use error::{CliError, Result};
