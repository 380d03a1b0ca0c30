//! End-to-end pipeline tests: redaction, rewriting, and removal together,
//! driven the same way the walker drives a real file (minus the harness —
//! report data is injected directly).

use gfilter::{redact, report, rewrite};

/// The per-file pipeline, as the walker runs it for a test source.
fn pipeline(source: &str, report: &report::Report) -> Result<String, rewrite::FilterError> {
    let content = redact::remove_solution(source);
    let content = redact::apply_stubs(&content);
    let content = rewrite::apply(&content, report)?;
    let content = redact::remove_server_internal(&content);
    let content = redact::apply_students(&content);
    Ok(redact::remove_ignores(&content))
}

const SOURCE: &str = r#"#include <iostream>
#include <gcheck/gcheck.h>

// BEGIN SOLUTION
// Grader notes: the reference below must never ship.
// END SOLUTION

std::string Greet(const std::string& name) {
    /* STUB: return ""; */
    return "Hello, " + name + "!";
}

std::string CorrectGreet(const std::string& name) {
    return "Hello, " + name + "!";
}

TEST(greetings, basic) {
    TestCase(2, CorrectGreet, Greet, RandomName());
}
"#;

fn greeting_report() -> report::Report {
    report::parse(
        r#"{
        "test_results": {
            "greetings": {
                "basic": {
                    "results": [
                        {"type": "TC", "cases": [
                            {"result": true, "input_args": ["Ada"], "input_params": "",
                             "output_json": "Hello, Ada!", "output_params": ""},
                            {"result": true, "input_args": ["Bob\n"], "input_params": "",
                             "output_json": "Hello, Bob\n!\"", "output_params": ""}
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
fn reference_callable_is_removed_and_under_test_kept() {
    let out = pipeline(SOURCE, &greeting_report()).unwrap();
    assert!(!out.contains("CorrectGreet"));
    assert!(out.contains("std::string Greet"));
    assert!(out.contains("return \"Hello, \" + name + \"!\";"));
}

#[test]
fn expected_outputs_are_escaped_literals() {
    let out = pipeline(SOURCE, &greeting_report()).unwrap();
    assert!(out.contains(r#"std::vector correct_not_reserved = {"Hello, Ada!","Hello, Bob\n!\""};"#));
}

#[test]
fn string_inputs_use_the_quoted_constructor() {
    let out = pipeline(SOURCE, &greeting_report()).unwrap();
    assert!(out.contains(r#"gcheck::SequenceArgument inputs_not_reserved0({std::string("Ada"),std::string("Bob\n")});"#));
}

#[test]
fn no_markers_survive() {
    let out = pipeline(SOURCE, &greeting_report()).unwrap();
    assert!(!out.to_ascii_uppercase().contains("SOLUTION"));
    assert!(!out.to_ascii_uppercase().contains("STUB"));
    assert!(!out.contains("Grader notes"));
    assert!(!out.contains("/*"));
}

#[test]
fn ignored_declaration_keeps_reference_and_body() {
    let source = SOURCE.replace("TEST(greetings, basic)", "// IGNORE\nTEST(greetings, basic)");
    let out = pipeline(&source, &greeting_report()).unwrap();
    assert!(out.contains("CorrectGreet"));
    assert!(out.contains("TestCase(2, CorrectGreet, Greet, RandomName());"));
    // The marker line itself is stripped on the way out.
    assert!(!out.contains("IGNORE"));
}

#[test]
fn conflicting_reference_fails_and_produces_no_output() {
    let source = SOURCE.replace("CorrectGreet, Greet", "CorrectGreet, CorrectGreet");
    let err = pipeline(&source, &greeting_report()).unwrap_err();
    assert!(matches!(
        err,
        rewrite::FilterError::ConflictingReference { name } if name == "CorrectGreet"
    ));
}

#[test]
fn server_internal_blocks_vanish_from_test_sources() {
    let source = SOURCE.replace(
        "TEST(greetings, basic)",
        "// BEGIN SERVER INTERNAL\nint secret_weight = 3;\n// END SERVER INTERNAL\nTEST(greetings, basic)",
    );
    let out = pipeline(&source, &greeting_report()).unwrap();
    assert!(!out.contains("secret_weight"));
}

#[test]
fn student_markers_expand_in_test_sources() {
    let source = SOURCE.replace(
        "#include <iostream>",
        "#include <iostream>\n// STUDENT: int attempts = 0;",
    );
    let out = pipeline(&source, &greeting_report()).unwrap();
    assert!(out.contains("int attempts = 0;"));
    assert!(!out.to_ascii_uppercase().contains("STUDENT"));
}

#[test]
fn unbalanced_source_is_a_parse_failure() {
    let source = "#include <gcheck/gcheck.h>\nTEST(a, b) {\n    TestCase(1, R, U, g);\n";
    let err = pipeline(source, &greeting_report()).unwrap_err();
    assert!(matches!(err, rewrite::FilterError::Parse(_)));
}

#[test]
fn output_is_deterministic() {
    let report = greeting_report();
    let first = pipeline(SOURCE, &report).unwrap();
    let second = pipeline(SOURCE, &report).unwrap();
    assert_eq!(first, second);
}
