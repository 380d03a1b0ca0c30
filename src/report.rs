//! Report document model and harness invocation.
//!
//! The report is produced by an instrumented run of the test sources with
//! the reference implementation present. It is consumed read-only: per
//! suite and test, a list of result entries, of which the `TC` entries feed
//! per-case invocation rewriting and the `FC` entries feed fixture-body
//! generation. Unknown fields are ignored so the model tolerates report
//! revisions that only add data.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use thiserror::Error;

/// Name of the report document the harness leaves in the source directory.
pub const REPORT_FILENAME: &str = "report.json";

/// Errors raised while obtaining or decoding a report. All file-scoped.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to run `make -s {rule}` in {dir}: {source}")]
    HarnessSpawn {
        rule: &'static str,
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("`make -s {rule}` exited with {status} in {dir}; does the get-report rule exist?")]
    HarnessFailed {
        rule: &'static str,
        dir: PathBuf,
        status: std::process::ExitStatus,
    },

    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed report {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The whole report document.
#[derive(Debug, Clone, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub max_points: f64,
    /// suite name → test name → entry.
    #[serde(default)]
    pub test_results: BTreeMap<String, BTreeMap<String, TestEntry>>,
}

/// One test's results.
#[derive(Debug, Clone, Deserialize)]
pub struct TestEntry {
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub max_points: f64,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub results: Vec<ResultEntry>,
}

/// One result entry, discriminated by its `type` tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ResultEntry {
    /// Per-case comparison data from a `TestCase` invocation.
    #[serde(rename = "TC")]
    CallableCases {
        #[serde(default)]
        cases: Vec<TcCase>,
    },
    /// Per-run fixture data from a function/io/method test.
    #[serde(rename = "FC")]
    FixtureCases {
        #[serde(default)]
        cases: Vec<FcCase>,
    },
    /// Expectation entries; carried in the document but not consumed here.
    #[serde(rename = "EE")]
    ExpectEqual {},
    #[serde(rename = "ET")]
    ExpectTrue {},
    #[serde(rename = "EF")]
    ExpectFalse {},
}

/// One comparison case: literal inputs and the expected output.
#[derive(Debug, Clone, Deserialize)]
pub struct TcCase {
    #[serde(default)]
    pub result: Option<bool>,
    /// Literal input values, one per argument position.
    #[serde(default)]
    pub input_args: Vec<serde_json::Value>,
    /// Pre-rendered construct text for the inputs; overrides `input_args`
    /// when non-empty.
    #[serde(default)]
    pub input_params: String,
    /// Expected output value.
    #[serde(default)]
    pub output_json: serde_json::Value,
    /// Pre-rendered construct text for the output; overrides `output_json`
    /// when non-empty.
    #[serde(default)]
    pub output_params: String,
}

/// A reported value with its JSON form, display string, and optional C++
/// construct rendering.
#[derive(Debug, Clone, Deserialize)]
pub struct UserObject {
    #[serde(default)]
    pub json: serde_json::Value,
    #[serde(default)]
    pub string: Option<String>,
    #[serde(default)]
    pub construct: Option<String>,
}

/// One fixture run: whichever dimensions the run recorded.
#[derive(Debug, Clone, Deserialize)]
pub struct FcCase {
    #[serde(default)]
    pub result: Option<bool>,
    #[serde(default)]
    pub input: Option<UserObject>,
    #[serde(default)]
    pub output: Option<UserObject>,
    #[serde(default)]
    pub output_expected: Option<UserObject>,
    #[serde(default)]
    pub error: Option<UserObject>,
    #[serde(default)]
    pub error_expected: Option<UserObject>,
    #[serde(default)]
    pub arguments: Option<UserObject>,
    #[serde(default)]
    pub arguments_after: Option<UserObject>,
    #[serde(default)]
    pub arguments_after_expected: Option<UserObject>,
    #[serde(default)]
    pub return_value: Option<UserObject>,
    #[serde(default)]
    pub return_value_expected: Option<UserObject>,
    #[serde(default)]
    pub object: Option<UserObject>,
    #[serde(default)]
    pub object_after: Option<UserObject>,
    #[serde(default)]
    pub object_after_expected: Option<UserObject>,
    #[serde(default)]
    pub run_time: Option<serde_json::Number>,
    #[serde(default)]
    pub max_run_time: Option<serde_json::Number>,
    #[serde(default)]
    pub timeout: Option<serde_json::Number>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Report {
    pub fn test(&self, suite: &str, test: &str) -> Option<&TestEntry> {
        self.test_results.get(suite)?.get(test)
    }

    /// Ordered `TC` entries for a test, one per `TestCase` invocation.
    pub fn callable_cases(&self, suite: &str, test: &str) -> Option<Vec<&[TcCase]>> {
        let entry = self.test(suite, test)?;
        Some(
            entry
                .results
                .iter()
                .filter_map(|r| match r {
                    ResultEntry::CallableCases { cases } => Some(cases.as_slice()),
                    _ => None,
                })
                .collect(),
        )
    }

    /// The fixture runs for a test: the first `FC` entry's cases.
    pub fn fixture_cases(&self, suite: &str, test: &str) -> Option<&[FcCase]> {
        self.test(suite, test)?.results.iter().find_map(|r| match r {
            ResultEntry::FixtureCases { cases } => Some(cases.as_slice()),
            _ => None,
        })
    }
}

/// Parse a report document from JSON text.
pub fn parse(text: &str) -> Result<Report, serde_json::Error> {
    serde_json::from_str(text)
}

/// Produce and load the report for the directory containing `source`.
///
/// Runs `make -s get-report` there, reads `report.json`, then runs
/// `make -s clean`. The clean step is best-effort; its failure only logs.
pub fn load_for(source: &Path) -> Result<Report, ReportError> {
    let dir = match source.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    run_make(dir, "get-report")?;

    let path = dir.join(REPORT_FILENAME);
    let text = std::fs::read_to_string(&path).map_err(|source| ReportError::Unreadable {
        path: path.clone(),
        source,
    })?;
    let report = parse(&text).map_err(|source| ReportError::Malformed { path, source })?;

    if let Err(err) = run_make(dir, "clean") {
        tracing::warn!(%err, "post-report clean failed");
    }
    Ok(report)
}

fn run_make(dir: &Path, rule: &'static str) -> Result<(), ReportError> {
    let status = Command::new("make")
        .arg("-s")
        .arg(rule)
        .current_dir(dir)
        .status()
        .map_err(|source| ReportError::HarnessSpawn {
            rule,
            dir: dir.to_path_buf(),
            source,
        })?;
    if !status.success() {
        return Err(ReportError::HarnessFailed {
            rule,
            dir: dir.to_path_buf(),
            status,
        });
    }
    Ok(())
}
