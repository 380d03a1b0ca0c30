//! Per-file rewriting: partition, classify, regenerate, reassemble.
//!
//! The pipeline takes redacted source text plus the report for its
//! directory and produces the distributable text: test bodies regenerated
//! from literal report data and reference callables removed.

pub mod cases;
pub mod fixture;
pub mod literal;

use std::collections::{BTreeSet, HashMap};
use std::ops::Range;
use std::sync::OnceLock;

use gfilter_syntax::SyntaxError;
use gfilter_syntax::classify::{self, TestCaseInvocation, TestHead, TestKind};
use gfilter_syntax::scope::{self, Scope, ScopeKind};
use regex::Regex;
use thiserror::Error;

use crate::report::{Report, ReportError};

/// Errors that abandon a single file. The run continues past all of them.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("failed to parse source structure: {0}")]
    Parse(#[from] SyntaxError),

    #[error("failed to retrieve report data: {0}")]
    Report(#[from] ReportError),

    #[error("report input for {suite}:{test} contains null fields; cannot substitute")]
    AmbiguousData { suite: String, test: String },

    #[error("reference callable `{name}` is also used as an under-test callable; cannot remove")]
    ConflictingReference { name: String },

    #[error("report has no entry for {suite}:{test}")]
    MissingEntry { suite: String, test: String },

    #[error("report entry for {suite}:{test} lacks case data at position {index}")]
    MissingCase {
        suite: String,
        test: String,
        index: usize,
    },
}

/// Whether a file is a test source: it includes a gcheck header and
/// declares at least one recognized test form.
pub fn is_test_source(content: &str) -> bool {
    static DECL: OnceLock<Regex> = OnceLock::new();
    let decl = DECL.get_or_init(|| {
        Regex::new(r"(TEST|IOTEST|FUNCTIONTEST|METHODTEST|METHODIOTEST)\([^\n]*\)\s*\{").unwrap()
    });
    content
        .lines()
        .any(|line| line.contains("#include") && line.contains("gcheck.h"))
        && content.lines().any(|line| decl.is_match(line))
}

struct Declaration<'a> {
    /// Index into the partition's scope list.
    index: usize,
    head: &'a TestHead,
    ignore: bool,
    invocations: Vec<TestCaseInvocation>,
}

/// Rewrite all test declarations in `text` from `report` data and drop the
/// reference callables they made removable.
pub fn apply(text: &str, report: &Report) -> Result<String, FilterError> {
    let partition = scope::extract(text)?;

    // Collect declarations; ignored ones still participate in the conflict
    // check below.
    let mut decls: Vec<Declaration<'_>> = Vec::new();
    for (index, s) in partition.scopes.iter().enumerate() {
        let Some(head) = &s.head else { continue };
        let Some(test) = &head.test else { continue };
        let invocations = if test.kind == TestKind::CallableCompare {
            classify::parse_invocations(&text[s.body.clone()])?
        } else {
            Vec::new()
        };
        decls.push(Declaration {
            index,
            head: test,
            ignore: head.ignore,
            invocations,
        });
    }

    // Names referenced as reference callables by live declarations.
    let mut referenced: BTreeSet<String> = BTreeSet::new();
    for d in decls.iter().filter(|d| !d.ignore) {
        for inv in &d.invocations {
            referenced.insert(inv.reference.clone());
        }
    }

    // A name is removable when it resolves to exactly one function
    // definition and that definition is not itself ignored.
    let mut remove: BTreeSet<String> = BTreeSet::new();
    for name in referenced {
        let matching: Vec<&Scope> = partition
            .scopes
            .iter()
            .filter(|s| s.kind == ScopeKind::Function && s.name == name)
            .collect();
        if let [definition] = matching.as_slice() {
            if !definition.head.as_ref().is_some_and(|h| h.ignore) {
                remove.insert(name);
            }
        }
    }

    // A removed callable must not be under test anywhere in the file.
    for d in &decls {
        let under_tests = d
            .invocations
            .iter()
            .map(|inv| inv.under_test.clone())
            .chain(d.head.under_test.clone());
        for name in under_tests {
            if remove.contains(&name) {
                return Err(FilterError::ConflictingReference { name });
            }
        }
    }

    let mut rewritten: HashMap<usize, String> = HashMap::new();
    for d in decls.iter().filter(|d| !d.ignore) {
        let scope_item = &partition.scopes[d.index];
        match d.head.kind {
            TestKind::CallableCompare => {
                if let Some(content) = rewrite_callable(text, &partition.scopes, scope_item, d, report)? {
                    rewritten.insert(d.index, content);
                }
            }
            kind => {
                if let Some(content) = rewrite_fixture(text, scope_item, d, kind, report) {
                    rewritten.insert(d.index, content);
                }
            }
        }
    }

    // Reassemble: fillers verbatim, scopes rewritten or dropped.
    let mut out = String::with_capacity(text.len());
    for (i, s) in partition.scopes.iter().enumerate() {
        out.push_str(&text[partition.fillers[i].clone()]);
        if s.kind == ScopeKind::Function && remove.contains(&s.name) {
            tracing::debug!(name = %s.name, "omitting reference callable");
            continue;
        }
        match rewritten.get(&i) {
            Some(content) => out.push_str(content),
            None => out.push_str(&text[s.span.clone()]),
        }
    }
    if let Some(last) = partition.fillers.last() {
        out.push_str(&text[last.clone()]);
    }
    Ok(out)
}

fn rewrite_callable(
    text: &str,
    scopes: &[Scope],
    scope_item: &Scope,
    d: &Declaration<'_>,
    report: &Report,
) -> Result<Option<String>, FilterError> {
    if d.invocations.is_empty() {
        return Ok(None);
    }
    let suite = &d.head.suite;
    let test = &d.head.test;
    let entries = report
        .callable_cases(suite, test)
        .ok_or_else(|| FilterError::MissingEntry {
            suite: suite.clone(),
            test: test.clone(),
        })?;

    let mut replacements: Vec<(Range<usize>, String)> = Vec::new();
    for (index, inv) in d.invocations.iter().enumerate() {
        let entry_cases = entries.get(index).copied().filter(|c| !c.is_empty()).ok_or_else(|| {
            FilterError::MissingCase {
                suite: suite.clone(),
                test: test.clone(),
                index,
            }
        })?;
        if cases::has_null_input(entry_cases) {
            return Err(FilterError::AmbiguousData {
                suite: suite.clone(),
                test: test.clone(),
            });
        }

        let definitions: Vec<&Scope> = scopes
            .iter()
            .filter(|s| s.kind == ScopeKind::Function && s.name == inv.reference)
            .collect();
        let [definition] = definitions.as_slice() else {
            // Most likely a local variable, not a file-level callable.
            tracing::debug!(reference = %inv.reference, "not a unique known function; invocation left as written");
            continue;
        };
        let param_types = definition
            .head
            .as_ref()
            .map(|h| h.param_types.as_slice())
            .unwrap_or(&[]);
        replacements.push((inv.span.clone(), cases::replacement(inv, entry_cases, param_types)));
    }
    if replacements.is_empty() {
        return Ok(None);
    }

    // Splice rightmost-first so earlier offsets stay valid.
    let body_offset = scope_item.body.start - scope_item.span.start;
    let mut content = text[scope_item.span.clone()].to_string();
    for (span, new_text) in replacements.iter().rev() {
        content.replace_range(body_offset + span.start..body_offset + span.end, new_text);
    }
    Ok(Some(content))
}

fn rewrite_fixture(
    text: &str,
    scope_item: &Scope,
    d: &Declaration<'_>,
    kind: TestKind,
    report: &Report,
) -> Option<String> {
    let suite = &d.head.suite;
    let test = &d.head.test;
    let fc = report
        .fixture_cases(suite, test)
        .filter(|cases| !cases.is_empty());
    let Some(fc) = fc else {
        tracing::warn!(%suite, %test, "report has no fixture data; declaration left as written");
        return None;
    };

    let indent = line_indent(text, scope_item.span.start);
    let body = fixture::body(kind, fc, &indent);
    let body_offset = scope_item.body.start - scope_item.span.start;
    let mut content = text[scope_item.span.clone()].to_string();
    content.replace_range(body_offset.., &body);
    Some(content)
}

/// The leading whitespace of the line `pos` sits on, or empty when the line
/// holds other text before `pos`.
fn line_indent(text: &str, pos: usize) -> String {
    let line_start = text[..pos].rfind('\n').map_or(0, |i| i + 1);
    let lead = &text[line_start..pos];
    if lead.trim().is_empty() { lead.to_string() } else { String::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report;

    const SOURCE: &str = r#"#include <gcheck/gcheck.h>

int Reference(int a) {
    return a + 1;
}

int Answer(int a) {
    return a + 1;
}

TEST(math, increment) {
    TestCase(2, Reference, Answer, RandomInt(0, 9));
}
"#;

    fn math_report() -> Report {
        report::parse(
            r#"{
            "test_results": {
                "math": {
                    "increment": {
                        "results": [
                            {"type": "TC", "cases": [
                                {"result": true, "input_args": [3], "input_params": "",
                                 "output_json": 4, "output_params": ""},
                                {"result": true, "input_args": [7], "input_params": "",
                                 "output_json": 8, "output_params": ""}
                            ]}
                        ]
                    }
                }
            }
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn detects_test_sources() {
        assert!(is_test_source(SOURCE));
        assert!(!is_test_source("int main() { return 0; }\n"));
        // A gcheck include alone is not enough.
        assert!(!is_test_source("#include <gcheck/gcheck.h>\nint main() { return 0; }\n"));
    }

    #[test]
    fn removes_reference_and_inlines_data() {
        let out = apply(SOURCE, &math_report()).unwrap();
        assert!(!out.contains("int Reference"));
        assert!(out.contains("int Answer"));
        assert!(out.contains("std::vector correct_not_reserved = {4,8};"));
        assert!(out.contains("gcheck::SequenceArgument inputs_not_reserved0({3,7});"));
        assert!(out.contains("TestCase(2,correct_not_reserved,Answer,inputs_not_reserved0);"));
        assert!(!out.contains("RandomInt"));
    }

    #[test]
    fn conflicting_reference_fails_the_file() {
        let source = SOURCE.replace("Answer, RandomInt", "Reference, RandomInt");
        let err = apply(&source, &math_report()).unwrap_err();
        assert!(matches!(err, FilterError::ConflictingReference { name } if name == "Reference"));
    }

    #[test]
    fn ignored_declaration_is_left_alone() {
        let source = SOURCE.replace("TEST(math, increment)", "// IGNORE\nTEST(math, increment)");
        let out = apply(&source, &math_report()).unwrap();
        assert!(out.contains("int Reference"));
        assert!(out.contains("TestCase(2, Reference, Answer, RandomInt(0, 9));"));
    }

    #[test]
    fn missing_report_entry_fails_the_file() {
        let report = report::parse(r#"{"test_results": {}}"#).unwrap();
        assert!(matches!(
            apply(SOURCE, &report),
            Err(FilterError::MissingEntry { .. })
        ));
    }

    #[test]
    fn null_input_aborts_with_ambiguous_data() {
        let report = report::parse(
            r#"{"test_results": {"math": {"increment": {"results": [
                {"type": "TC", "cases": [
                    {"result": true, "input_args": [null], "input_params": "",
                     "output_json": 1, "output_params": ""}
                ]}
            ]}}}}"#,
        )
        .unwrap();
        assert!(matches!(
            apply(SOURCE, &report),
            Err(FilterError::AmbiguousData { .. })
        ));
    }

    #[test]
    fn unresolved_reference_leaves_invocation_as_written() {
        let source = SOURCE.replace("TestCase(2, Reference,", "TestCase(2, local_lambda,");
        let out = apply(&source, &math_report()).unwrap();
        assert!(out.contains("TestCase(2, local_lambda, Answer, RandomInt(0, 9));"));
        assert!(out.contains("int Reference"));
    }

    #[test]
    fn fixture_declaration_body_is_replaced() {
        let source = r#"#include <gcheck/gcheck.h>

int Square(int x) {
    return x * x;
}

FUNCTIONTEST(math, Square, 2, Square) {
    SetArguments(ComputeSecret(GetRunIndex()));
    SetReturn(SecretAnswer(GetRunIndex()));
}
"#;
        let report = report::parse(
            r#"{"test_results": {"math": {"Square": {"results": [
                {"type": "FC", "cases": [
                    {"arguments": {"json": [2], "construct": "std::tuple(2)"},
                     "return_value_expected": {"json": 4, "construct": "4"}},
                    {"arguments": {"json": [5], "construct": "std::tuple(5)"},
                     "return_value_expected": {"json": 25, "construct": "25"}}
                ]}
            ]}}}}"#,
        )
        .unwrap();
        let out = apply(source, &report).unwrap();
        assert!(!out.contains("ComputeSecret"));
        assert!(!out.contains("SecretAnswer"));
        assert!(out.contains("std::vector arguments_not_reserved = {std::tuple(2),std::tuple(5)};"));
        assert!(out.contains("SetArguments(arguments_not_reserved[arguments_map_not_reserved[GetRunIndex()]]);"));
        assert!(out.contains("std::vector return_value_not_reserved = {4,25};"));
        // The under-test function itself stays.
        assert!(out.contains("int Square"));
    }

    #[test]
    fn fixture_without_report_data_is_left_as_written() {
        let source = r#"#include <gcheck/gcheck.h>

IOTEST(io, echo, 1, Echo) {
    SetInput("hidden");
}
"#;
        let report = report::parse(r#"{"test_results": {}}"#).unwrap();
        let out = apply(source, &report).unwrap();
        assert_eq!(out, source);
    }
}
