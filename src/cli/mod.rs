//! CLI layer for agentic-rag.
//!
//! Provides the command-line interface using clap, with one interactive
//! command per way of querying the tools plus index building and prompt
//! initialization.

pub mod commands;
pub mod parser;
pub mod repl;

pub use commands::execute;
pub use parser::{Cli, Commands};
pub use repl::{ReplExit, Session, run_repl};
