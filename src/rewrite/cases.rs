//! Regenerating `TestCase` invocations from report data.
//!
//! Each live invocation `TestCase(repeat, reference, under_test, inputs...)`
//! is replaced by a block that no longer mentions the reference callable:
//! a literal vector of expected outputs and one literal `SequenceArgument`
//! per input position, followed by the data-driven `TestCase` overload on
//! the under-test callable.

use gfilter_syntax::classify::TestCaseInvocation;

use crate::report::TcCase;
use crate::rewrite::literal;

/// Build the replacement block for one invocation.
///
/// `cases` are the matched report cases in run order; `param_types` are the
/// reference callable's declared parameter types, used to pick literal
/// forms per input position.
pub fn replacement(invocation: &TestCaseInvocation, cases: &[TcCase], param_types: &[String]) -> String {
    let outputs: Vec<String> = if cases.first().is_some_and(|c| c.output_params.is_empty()) {
        cases.iter().map(|c| literal::render_expected(&c.output_json)).collect()
    } else {
        cases.iter().map(|c| c.output_params.clone()).collect()
    };

    // One literal sequence per input position. A case with pre-rendered
    // construct text contributes it as a single leading item instead.
    let mut inputs: Vec<Vec<String>> = Vec::new();
    for case in cases {
        if case.input_params.is_empty() {
            for (index, arg) in case.input_args.iter().enumerate() {
                let arg_type = param_types.get(index).map(String::as_str).unwrap_or("");
                let item = literal::render_argument(arg_type, arg);
                if inputs.len() > index {
                    inputs[index].push(item);
                } else {
                    inputs.push(vec![item]);
                }
            }
        } else if let Some(first) = inputs.first_mut() {
            first.push(case.input_params.clone());
        } else {
            inputs.push(vec![case.input_params.clone()]);
        }
    }

    let indent = format!("{}    ", invocation.indent);
    let mut out = String::from("{\n");
    out.push_str(&format!(
        "{indent}std::vector correct_not_reserved = {{{}}};\n",
        outputs.join(",")
    ));
    for (index, items) in inputs.iter().enumerate() {
        out.push_str(&format!(
            "{indent}gcheck::SequenceArgument inputs_not_reserved{index}({{{}}});\n",
            items.join(",")
        ));
    }
    out.push_str(&format!(
        "{indent}TestCase({},correct_not_reserved,{},",
        invocation.repeats, invocation.under_test_full
    ));
    let names: Vec<String> = (0..inputs.len()).map(|i| format!("inputs_not_reserved{i}")).collect();
    out.push_str(&names.join(","));
    out.push_str(");\n");
    out.push_str(&invocation.indent);
    out.push('}');
    out
}

/// Whether any case input carries the report's null sentinel, which makes
/// literal inlining ambiguous.
pub fn has_null_input(cases: &[TcCase]) -> bool {
    cases.iter().any(|c| c.input_args.iter().any(literal::contains_null))
}
