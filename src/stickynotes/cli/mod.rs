//! # CLI Layer
//!
//! One possible client of the library. This is the only place that knows about
//! stdout, stdin, colors and exit codes.
//!
//! ## Module Structure
//!
//! - `setup`: Argument parsing via clap
//! - `commands`: Context setup and per-command handlers that call `NotesApi`
//! - `print`: Output formatting (note lists, single notes, colored messages)

mod commands;
mod print;
pub mod setup;

pub use commands::run;
