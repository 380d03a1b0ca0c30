//! Generating fixture-setup bodies for function/io/method tests.
//!
//! These declarations run their body once per run index; the rewritten body
//! feeds each fixture dimension from a literal vector harvested from the
//! report. Runs that did not record a dimension keep their neighbours'
//! indices intact through a per-dimension indirection vector holding `-1`
//! for the missing runs.

use gfilter_syntax::classify::TestKind;

use crate::report::{FcCase, UserObject};
use crate::rewrite::literal;

/// One fixture dimension: a named aspect of expected per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    Object,
    ObjectAfter,
    Arguments,
    ArgumentsAfter,
    ReturnValue,
    Input,
    Output,
    Error,
    Timeout,
    MaxRunTime,
}

impl Dim {
    /// Variable-name stem used in generated code.
    fn stem(self) -> &'static str {
        match self {
            Dim::Object => "object",
            Dim::ObjectAfter => "object_after",
            Dim::Arguments => "arguments",
            Dim::ArgumentsAfter => "arguments_after",
            Dim::ReturnValue => "return_value",
            Dim::Input => "input",
            Dim::Output => "output",
            Dim::Error => "error",
            Dim::Timeout => "timeout",
            Dim::MaxRunTime => "max_run_time",
        }
    }

    /// The fixture setter the generated body calls.
    fn setter(self) -> &'static str {
        match self {
            Dim::Object => "SetObject",
            Dim::ObjectAfter => "SetObjectAfter",
            Dim::Arguments => "SetArguments",
            Dim::ArgumentsAfter => "SetArgumentsAfter",
            Dim::ReturnValue => "SetReturn",
            Dim::Input => "SetInput",
            Dim::Output => "SetOutput",
            Dim::Error => "SetError",
            Dim::Timeout => "SetTimeout",
            Dim::MaxRunTime => "SetMaxRunTime",
        }
    }
}

/// The ordered dimension set each declaration kind feeds.
///
/// `MethodIo` is the union of `Method` and `Io`.
pub fn dimensions(kind: TestKind) -> &'static [Dim] {
    use Dim::*;
    match kind {
        TestKind::CallableCompare => &[],
        TestKind::Function => &[Arguments, ArgumentsAfter, ReturnValue, Timeout, MaxRunTime],
        TestKind::Io => &[Arguments, Input, Output, Error, Timeout, MaxRunTime],
        TestKind::Method => &[
            Object, ObjectAfter, Arguments, ArgumentsAfter, ReturnValue, Timeout, MaxRunTime,
        ],
        TestKind::MethodIo => &[
            Object, ObjectAfter, Arguments, ArgumentsAfter, ReturnValue, Input, Output, Error,
            Timeout, MaxRunTime,
        ],
    }
}

/// Render a reported value as C++ text: the construct rendering when the
/// report carries one, otherwise a literal derived from the JSON value.
fn render(uo: Option<&UserObject>) -> Option<String> {
    let uo = uo?;
    match uo.construct.as_deref() {
        Some(c) if !c.is_empty() => Some(c.to_string()),
        _ => match &uo.json {
            serde_json::Value::Null => None,
            value => Some(literal::render_expected(value)),
        },
    }
}

/// The value a run supplies for a dimension, if it recorded one.
///
/// Pre-state dimensions read the run's plain fields; post-state dimensions
/// read the expected variants the reference run established.
fn dim_value(case: &FcCase, dim: Dim) -> Option<String> {
    match dim {
        Dim::Object => render(case.object.as_ref()),
        Dim::ObjectAfter => render(case.object_after_expected.as_ref()),
        Dim::Arguments => render(case.arguments.as_ref()),
        Dim::ArgumentsAfter => render(case.arguments_after_expected.as_ref()),
        Dim::ReturnValue => render(case.return_value_expected.as_ref()),
        Dim::Input => render(case.input.as_ref()),
        Dim::Output => render(case.output_expected.as_ref()),
        Dim::Error => render(case.error_expected.as_ref()),
        Dim::Timeout => case.timeout.as_ref().map(|n| n.to_string()),
        Dim::MaxRunTime => case.max_run_time.as_ref().map(|n| n.to_string()),
    }
}

/// Build the replacement body for a fixture-kind declaration.
///
/// `indent` is the declaration's own leading whitespace; generated
/// statements sit one level deeper.
pub fn body(kind: TestKind, cases: &[FcCase], indent: &str) -> String {
    let inner = format!("{indent}    ");
    let mut out = String::from("{\n");
    for &dim in dimensions(kind) {
        let values: Vec<Option<String>> = cases.iter().map(|c| dim_value(c, dim)).collect();
        if values.iter().all(Option::is_none) {
            continue;
        }

        let mut present: Vec<String> = Vec::new();
        let mut map: Vec<String> = Vec::new();
        for value in values {
            match value {
                Some(text) => {
                    map.push(present.len().to_string());
                    present.push(text);
                }
                None => map.push("-1".to_string()),
            }
        }

        let stem = dim.stem();
        out.push_str(&format!(
            "{inner}std::vector {stem}_not_reserved = {{{}}};\n",
            present.join(",")
        ));
        out.push_str(&format!(
            "{inner}std::vector<long> {stem}_map_not_reserved = {{{}}};\n",
            map.join(",")
        ));
        out.push_str(&format!(
            "{inner}if({stem}_map_not_reserved[GetRunIndex()] >= 0)\n"
        ));
        out.push_str(&format!(
            "{inner}    {}({stem}_not_reserved[{stem}_map_not_reserved[GetRunIndex()]]);\n",
            dim.setter()
        ));
    }
    out.push_str(indent);
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn case(fields: serde_json::Value) -> FcCase {
        serde_json::from_value(fields).unwrap()
    }

    #[test]
    fn method_io_is_the_union_of_method_and_io() {
        let method = dimensions(TestKind::Method);
        let io = dimensions(TestKind::Io);
        let union = dimensions(TestKind::MethodIo);
        for dim in method.iter().chain(io) {
            assert!(union.contains(dim));
        }
        assert_eq!(union.len(), method.len() + io.len() - 3);
    }

    #[test]
    fn emits_only_supplied_dimensions() {
        let cases = vec![case(json!({
            "arguments": {"json": [1, 2], "construct": "std::tuple(1,2)"},
            "return_value_expected": {"json": 3, "construct": "3"}
        }))];
        let got = body(TestKind::Function, &cases, "");
        assert!(got.contains("SetArguments(arguments_not_reserved[arguments_map_not_reserved[GetRunIndex()]]);"));
        assert!(got.contains("SetReturn(return_value_not_reserved[return_value_map_not_reserved[GetRunIndex()]]);"));
        assert!(!got.contains("SetTimeout"));
        assert!(!got.contains("SetInput"));
    }

    #[test]
    fn missing_runs_keep_stable_indices() {
        let cases = vec![
            case(json!({"return_value_expected": {"json": 1, "construct": "1"}})),
            case(json!({})),
            case(json!({"return_value_expected": {"json": 3, "construct": "3"}})),
        ];
        let got = body(TestKind::Function, &cases, "");
        assert!(got.contains("std::vector return_value_not_reserved = {1,3};"));
        assert!(got.contains("std::vector<long> return_value_map_not_reserved = {0,-1,1};"));
    }

    #[test]
    fn io_bodies_quote_stream_text() {
        let cases = vec![case(json!({
            "input": {"json": "in\n"},
            "output_expected": {"json": "out\"put"}
        }))];
        let got = body(TestKind::Io, &cases, "    ");
        assert!(got.contains("std::vector input_not_reserved = {\"in\\n\"};"));
        assert!(got.contains("std::vector output_not_reserved = {\"out\\\"put\"};"));
        assert!(got.ends_with("    }"));
    }

    #[test]
    fn timeout_values_pass_through() {
        let cases = vec![case(json!({"timeout": 4000, "max_run_time": 120}))];
        let got = body(TestKind::Method, &cases, "");
        assert!(got.contains("SetTimeout(timeout_not_reserved[timeout_map_not_reserved[GetRunIndex()]]);"));
        assert!(got.contains("std::vector timeout_not_reserved = {4000};"));
        assert!(got.contains("std::vector max_run_time_not_reserved = {120};"));
    }
}
