//! Botblocks command line support
//!
//! - Program file format (JSON nested instruction lists)
//! - `run`, `plan`, and `simulate` subcommand bodies

#![warn(unreachable_pub)]

pub mod commands;
pub mod program_file;

pub use program_file::{Entry, ProgramFile, ProgramFileError};
