//! CLI command implementation.
//!
//! `filter_path` validates the input/output layout, runs the walker (or the
//! single-file path), then flushes the run log. It returns `CliResult`
//! instead of exiting; error handling and exits happen in the top-level
//! `run()`.

use std::fs;
use std::path::Path;

use crate::walk::{self, Options, RunLog};

use super::{Cli, CliError, CliResult, ExitCode};

/// Filter the input file or tree into the output directory.
pub fn filter_path(cli: Cli) -> CliResult<ExitCode> {
    let input = cli.input.as_path();
    let output = cli.output.as_path();

    let is_file = input.is_file();
    let is_dir = input.is_dir();
    if !is_file && !is_dir {
        return Err(CliError::failure(format!(
            "error: {} is not a directory or a file.",
            input.display()
        )));
    }
    if output.is_file() {
        return Err(CliError::failure(format!(
            "error: {} is a file, not a directory.",
            output.display()
        )));
    }
    if cli.clear && output.is_dir() {
        fs::remove_dir_all(output).map_err(|err| {
            CliError::failure(format!("error: cannot clear {}: {err}", output.display()))
        })?;
    }

    let opts = Options {
        recurse: cli.recurse,
        keep_solution: cli.keep_solution,
        skip_tests: cli.skip_tests,
    };

    let mut log = RunLog::default();
    if is_dir {
        walk::filter_tree(input, output, &opts, &mut log)
            .map_err(|err| CliError::fatal(format!("fatal: {err}. Stopping.")))?;
    } else {
        walk::filter_file(input, output, &opts, &mut log);
    }

    flush(&log, &cli);
    Ok(ExitCode::SUCCESS)
}

/// Write the log file and print the run summary.
fn flush(log: &RunLog, cli: &Cli) {
    if let Err(err) = log.write_to(Path::new(walk::LOG_FILENAME)) {
        tracing::warn!(%err, "could not write {}", walk::LOG_FILENAME);
    }
    if cli.quiet {
        return;
    }
    if cli.verbose {
        for path in &log.ignored {
            eprintln!("Ignored {}", path.display());
        }
    }
    eprintln!(
        "gfilter finished with {} ignored files and {} files with errors of which {} were copied anyway.",
        log.ignored.len(),
        log.errors.len(),
        log.copied_count()
    );
}
