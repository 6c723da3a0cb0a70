//! Command-line interface

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};

use crate::logger::{debug_enabled, Logger};
use std::io;

/// Buildpack-style logger on stdout, colored when the terminal supports it
pub fn stdout_logger() -> Logger {
    Logger::stdout().with_color(console::colors_enabled())
}

/// Logger on stderr, for commands whose stdout is machine-readable
pub fn stderr_logger() -> Logger {
    Logger::new(Box::new(io::stderr()))
        .with_color(console::colors_enabled_stderr())
        .with_debug(debug_enabled())
}
