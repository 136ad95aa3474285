//! Library side of the `ssis-build` command-line tool.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
