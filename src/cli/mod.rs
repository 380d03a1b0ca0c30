//! Command-line interface for the filter.
//!
//! ## Flags
//!
//! - `-i/--input` — source file or directory to filter
//! - `-o/--output` — output directory
//! - `-r/--recurse` — descend into subdirectories
//! - `-c/--clear` — clear the output directory first
//! - `-v/--verbose`, `-q/--quiet` — summary verbosity
//! - `--keep-solution` — leave solution blocks and stub markers in place
//! - `--skip-tests` — copy test sources through without rewriting
//!
//! ## Design
//!
//! Argument parsing uses clap derive macros. Command functions return
//! `CliResult<T>` instead of calling `process::exit`; only the top-level
//! `run()` handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::Parser;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    /// A fatal condition: the run was halted, not merely incomplete.
    pub const FATAL: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Create a fatal error (exit code 2).
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FATAL)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Distribution filter for gcheck test sources
#[derive(Parser, Debug)]
#[command(name = "gfilter")]
#[command(version = VERSION)]
#[command(about = "Distribution filter for gcheck test sources", long_about = None)]
pub struct Cli {
    /// Source file or directory to filter
    #[arg(short = 'i', long = "input", value_name = "PATH", default_value = "")]
    pub input: PathBuf,

    /// Output directory
    #[arg(short = 'o', long = "output", value_name = "PATH", default_value = "")]
    pub output: PathBuf,

    /// Descend into subdirectories
    #[arg(short = 'r', long = "recurse")]
    pub recurse: bool,

    /// Clear the output directory first
    #[arg(short = 'c', long = "clear")]
    pub clear: bool,

    /// List ignored files in the summary
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Suppress the run summary
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Leave solution blocks and stub markers in place
    #[arg(long = "keep-solution")]
    pub keep_solution: bool,

    /// Copy test sources through without rewriting them
    #[arg(long = "skip-tests")]
    pub skip_tests: bool,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match commands::filter_path(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
