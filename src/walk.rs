//! Directory traversal, ignore-pattern files, and the run log.
//!
//! The walker mirrors the input tree under the output root, filtering each
//! file through the redaction/rewrite pipeline. Every directory may carry a
//! `.remignore` file of regex patterns; patterns accumulate down the tree
//! and the last matching rule decides. An unreadable or uncompilable
//! `.remignore` is the one fatal condition of a run — per-file failures
//! only accumulate in the [`RunLog`].

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use walkdir::WalkDir;

use crate::redact;
use crate::report;
use crate::rewrite;

/// Name of the per-directory ignore-pattern file.
pub const IGNORE_FILENAME: &str = ".remignore";

/// Name of the run-summary log written next to the invocation.
pub const LOG_FILENAME: &str = "gfilter.log";

/// Per-run behavior switches, straight from the CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub recurse: bool,
    pub keep_solution: bool,
    pub skip_tests: bool,
}

/// The one error that halts a whole run.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("failed to compile {path}: {message}")]
    BadIgnoreFile { path: PathBuf, message: String },
}

/// One file the run could not fully process.
#[derive(Debug)]
pub struct FileIssue {
    pub path: PathBuf,
    pub message: String,
    /// Whether the file was still copied to the output, unrewritten.
    pub copied: bool,
}

/// Append-only accumulator for a whole run; threaded explicitly through the
/// walker and flushed once by the caller.
#[derive(Debug, Default)]
pub struct RunLog {
    pub errors: Vec<FileIssue>,
    pub ignored: Vec<PathBuf>,
    pub processed: usize,
}

impl RunLog {
    pub fn next_file(&mut self, path: &Path) {
        self.processed += 1;
        tracing::trace!(path = %path.display(), n = self.processed, "processing");
    }

    pub fn error(&mut self, path: &Path, message: impl Into<String>, copied: bool) {
        let message = message.into();
        if copied {
            tracing::error!(path = %path.display(), %message, "file copied without rewriting");
        } else {
            tracing::error!(path = %path.display(), %message, "file dropped");
        }
        self.errors.push(FileIssue {
            path: path.to_path_buf(),
            message,
            copied,
        });
    }

    pub fn ignore(&mut self, path: &Path) {
        tracing::debug!(path = %path.display(), "ignored");
        self.ignored.push(path.to_path_buf());
    }

    pub fn copied_count(&self) -> usize {
        self.errors.iter().filter(|e| e.copied).count()
    }

    pub fn dropped_count(&self) -> usize {
        self.errors.iter().filter(|e| !e.copied).count()
    }

    /// Write the full issue listing to `path`.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let mut out = String::new();
        let dropped: Vec<&FileIssue> = self.errors.iter().filter(|e| !e.copied).collect();
        out.push_str(&format!("Files with errors that weren't copied ({}):\n", dropped.len()));
        for issue in &dropped {
            out.push_str(&format!("   {}: {}\n", issue.path.display(), issue.message));
        }
        let copied: Vec<&FileIssue> = self.errors.iter().filter(|e| e.copied).collect();
        out.push_str(&format!("Files with errors that were copied ({}):\n", copied.len()));
        for issue in &copied {
            out.push_str(&format!("   {}: {}\n", issue.path.display(), issue.message));
        }
        out.push_str(&format!("Files that were ignored ({}):\n", self.ignored.len()));
        for path in &self.ignored {
            out.push_str(&format!("   {}\n", path.display()));
        }
        fs::write(path, out)
    }
}

/// One `.remignore` rule: a regex and whether a match re-includes the file.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pattern: Regex,
    reinclude: bool,
}

/// Rules every run starts with: never export the walker's own bookkeeping.
pub fn builtin_rules() -> Vec<IgnoreRule> {
    [r"\.remignore$", r"gfilter\.log$"]
        .iter()
        .map(|p| IgnoreRule {
            pattern: Regex::new(p).unwrap(),
            reinclude: false,
        })
        .collect()
}

/// Load the `.remignore` rules of `dir`, if it has any.
///
/// Syntax: one regex per line; `#` starts a comment line; a leading `!`
/// re-includes matches; `\!`/`\#` escape those prefixes.
pub fn load_ignore_rules(dir: &Path) -> Result<Vec<IgnoreRule>, FatalError> {
    let path = dir.join(IGNORE_FILENAME);
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(&path).map_err(|err| FatalError::BadIgnoreFile {
        path: path.clone(),
        message: err.to_string(),
    })?;
    let mut rules = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let reinclude = line.starts_with('!');
        let pattern = if reinclude || line.starts_with("\\!") || line.starts_with("\\#") {
            &line[1..]
        } else {
            line
        };
        let pattern = Regex::new(pattern).map_err(|err| FatalError::BadIgnoreFile {
            path: path.clone(),
            message: err.to_string(),
        })?;
        rules.push(IgnoreRule { pattern, reinclude });
    }
    Ok(rules)
}

/// Whether `path` passes the accumulated rules: default yes, last matching
/// rule wins.
pub fn included(path: &str, rules: &[IgnoreRule]) -> bool {
    let mut include = true;
    for rule in rules {
        if rule.pattern.is_match(path) {
            include = rule.reinclude;
        }
    }
    include
}

/// Filter one file into `outdir`.
pub fn filter_file(path: &Path, outdir: &Path, opts: &Options, log: &mut RunLog) {
    if let Err(err) = fs::create_dir_all(outdir) {
        log.error(path, format!("cannot create {}: {err}", outdir.display()), false);
        return;
    }
    let outfile = outdir.join(path.file_name().unwrap_or_default());

    let mut content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            // Unreadable as text: pass the bytes through untouched.
            log.error(path, err.to_string(), true);
            if let Err(err) = fs::copy(path, &outfile) {
                tracing::error!(path = %path.display(), %err, "copy failed");
            }
            return;
        }
    };

    if !opts.keep_solution {
        content = redact::remove_solution(&content);
        content = redact::apply_stubs(&content);
    }

    if rewrite::is_test_source(&content) {
        if opts.skip_tests {
            log.ignore(path);
            return;
        }
        let report = match report::load_for(path) {
            Ok(report) => report,
            Err(err) => {
                log.error(path, err.to_string(), false);
                return;
            }
        };
        content = match rewrite::apply(&content, &report) {
            Ok(content) => content,
            Err(err) => {
                log.error(path, err.to_string(), false);
                return;
            }
        };
        content = redact::remove_server_internal(&content);
        content = redact::apply_students(&content);
        content = redact::remove_ignores(&content);
    }

    if let Err(err) = fs::write(&outfile, content) {
        log.error(path, format!("cannot write {}: {err}", outfile.display()), false);
    }
}

/// Filter a whole tree, mirroring `input` under `output`.
pub fn filter_tree(
    input: &Path,
    output: &Path,
    opts: &Options,
    log: &mut RunLog,
) -> Result<(), FatalError> {
    let mut rules = builtin_rules();
    rules.extend(load_ignore_rules(Path::new("."))?);

    let max_depth = if opts.recurse { usize::MAX } else { 1 };
    // (depth, rule count before that directory's own rules) — popped when
    // the walk leaves the directory.
    let mut dir_stack: Vec<(usize, usize)> = Vec::new();

    for entry in WalkDir::new(input).max_depth(max_depth).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(input).to_path_buf();
                log.error(&path, err.to_string(), false);
                continue;
            }
        };
        while dir_stack.last().is_some_and(|&(depth, _)| depth >= entry.depth()) {
            let (_, len) = dir_stack.pop().unwrap_or_default();
            rules.truncate(len);
        }
        if entry.file_type().is_dir() {
            dir_stack.push((entry.depth(), rules.len()));
            rules.extend(load_ignore_rules(entry.path())?);
            continue;
        }

        let path = entry.path();
        log.next_file(path);
        if !included(&path.to_string_lossy(), &rules) {
            log.ignore(path);
            continue;
        }
        let rel = path.strip_prefix(input).unwrap_or(path);
        let outdir = match rel.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => output.join(parent),
            _ => output.to_path_buf(),
        };
        filter_file(path, &outdir, opts, log);
    }
    Ok(())
}
