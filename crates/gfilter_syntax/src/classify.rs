//! Call-form parsing and test-declaration classification.
//!
//! A function scope is classified by re-parsing the call form that
//! immediately precedes its body: `name(arg0, arg1, ...)`. Five call names
//! mark gcheck test declarations; everything else is an ordinary function
//! whose parameter types are harvested for later literal formatting.

use std::ops::Range;

use crate::diagnostics::SyntaxError;
use crate::scanner;

/// The recognized test-declaration kinds.
///
/// A closed set: shared emission logic downstream is parameterized by the
/// kind rather than by subclassing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestKind {
    /// `TEST` (also `TEST_`, `PREREQ_TEST`) — body holds per-case `TestCase`
    /// invocations comparing a reference callable against an under-test one.
    CallableCompare,
    /// `FUNCTIONTEST` — per-run argument/return fixtures.
    Function,
    /// `IOTEST` — per-run stdin/stdout/stderr fixtures.
    Io,
    /// `METHODTEST` — per-run object-state fixtures.
    Method,
    /// `METHODIOTEST` — object-state and stdio fixtures combined.
    MethodIo,
}

impl TestKind {
    /// Map a call name to a declaration kind, if it is one.
    pub fn from_call_name(name: &str) -> Option<Self> {
        match name {
            "TEST" | "TEST_" | "PREREQ_TEST" => Some(Self::CallableCompare),
            "FUNCTIONTEST" => Some(Self::Function),
            "IOTEST" => Some(Self::Io),
            "METHODTEST" => Some(Self::Method),
            "METHODIOTEST" => Some(Self::MethodIo),
            _ => None,
        }
    }
}

/// One parsed call argument: trimmed text plus its untrimmed span.
#[derive(Debug, Clone)]
pub struct Arg {
    pub text: String,
    pub span: Range<usize>,
}

/// A call form split at bracket depth 1.
#[derive(Debug, Clone)]
pub struct CallArgs {
    pub args: Vec<Arg>,
    /// Offset of the opening `(`.
    pub open: usize,
    /// Offset of the closing `)`.
    pub close: usize,
}

/// Split the argument list of the call whose `(` is at `open`.
///
/// Commas are located with the level-aware scanner, so commas nested in
/// parentheses, braces, strings, or template argument lists do not split.
pub fn split_call_args(text: &str, open: usize) -> Option<CallArgs> {
    let mut start = open + 1;
    let close = scanner::find_forward(text, b')', start)?;
    let mut args = Vec::new();
    loop {
        let idx = match scanner::find_forward(text, b',', start) {
            Some(i) if i < close => i,
            _ => close,
        };
        args.push(Arg {
            text: text[start..idx].trim().to_string(),
            span: start..idx,
        });
        if idx == close {
            break;
        }
        start = idx + 1;
    }
    Some(CallArgs { args, open, close })
}

/// Remove a template argument list from a callable name: `Ref<int>` → `Ref`.
pub fn strip_template(name: &str) -> String {
    match (name.find('<'), name.rfind('>')) {
        (Some(i), Some(j)) if i < j => format!("{}{}", &name[..i], &name[j + 1..]),
        _ => name.to_string(),
    }
}

/// Test metadata attached to a classified declaration.
#[derive(Debug, Clone)]
pub struct TestHead {
    pub kind: TestKind,
    pub suite: String,
    pub test: String,
    /// The under-test callable named in the macro head (fixture kinds only;
    /// `CallableCompare` names its callables per invocation instead).
    pub under_test: Option<String>,
}

/// The parsed head of a function-shaped scope.
#[derive(Debug, Clone)]
pub struct FunctionHead {
    /// Where the emitted span starts: the return-type word for ordinary
    /// functions, the call name for test declarations.
    pub start: usize,
    pub name: String,
    /// Declared parameter type texts, `const`/`&` stripped, defaults dropped.
    /// Empty for test declarations.
    pub param_types: Vec<String>,
    pub test: Option<TestHead>,
    /// Whether the text before the declaration ends in an `IGNORE` marker.
    pub ignore: bool,
}

/// Parse the call form or parameter list preceding the body brace at
/// `scope_start`. Returns `None` when no plausible head exists.
pub fn parse_head(text: &str, scope_start: usize) -> Option<FunctionHead> {
    let head_text = &text[..scope_start];
    let rparen = head_text.rfind(')')?;
    let open = scanner::find_backward(text, b'(', rparen)?;
    let call = split_call_args(text, open)?;

    let name_start = text.as_bytes()[..open]
        .iter()
        .rposition(|b| b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    let name = text[name_start..open].to_string();

    if let Some(kind) = TestKind::from_call_name(&name) {
        if call.args.len() >= 2 {
            let under_test = match kind {
                TestKind::CallableCompare => None,
                _ => call.args.get(3).map(|a| strip_template(&a.text)),
            };
            return Some(FunctionHead {
                start: name_start,
                name,
                param_types: Vec::new(),
                test: Some(TestHead {
                    kind,
                    suite: call.args[0].text.clone(),
                    test: call.args[1].text.clone(),
                    under_test,
                }),
                ignore: trailing_ignore(&text[..name_start]),
            });
        }
    }

    let param_types = call.args.iter().map(|a| param_type(&a.text)).collect();
    let bytes = text.as_bytes();
    let (start, ignore) = match bytes[..name_start].iter().rposition(|b| !b.is_ascii_whitespace()) {
        None => (name_start, trailing_ignore(&text[..name_start])),
        Some(ret_end) => {
            let ret_start = bytes[..ret_end]
                .iter()
                .rposition(|b| b.is_ascii_whitespace())
                .map_or(0, |i| i + 1);
            (ret_start, trailing_ignore(&text[..ret_start]))
        }
    };

    Some(FunctionHead {
        start,
        name,
        param_types,
        test: None,
        ignore,
    })
}

/// Extract the declared type from one parameter text, dropping a default
/// value and the `const`/`&` decorations: `const std::vector<int>& v` →
/// `std::vector<int>`.
fn param_type(arg: &str) -> String {
    let mut prefix = arg;
    if let Some(space) = scanner::find_backward(arg, b' ', arg.len()) {
        prefix = &arg[..space];
        if prefix.trim_end().ends_with('=') {
            let base = arg[..space.saturating_sub(1)].trim_end();
            prefix = match scanner::find_backward(base, b' ', base.len()) {
                Some(s) => &base[..s],
                None => "",
            };
        }
    } else {
        prefix = "";
    }
    prefix.replace("const", "").replace('&', "").trim().to_string()
}

fn trailing_ignore(prefix: &str) -> bool {
    prefix.trim_end().to_ascii_uppercase().ends_with("IGNORE")
}

/// The literal marker a `CallableCompare` body is split on.
pub const CASE_MARKER: &str = "TestCase";

/// One per-case invocation inside a `CallableCompare` body.
#[derive(Debug, Clone)]
pub struct TestCaseInvocation {
    /// Span within the body text, from the marker through the closing `)`.
    pub span: Range<usize>,
    pub repeats: String,
    pub reference_full: String,
    pub reference: String,
    pub under_test_full: String,
    pub under_test: String,
    pub inputs: Vec<String>,
    /// Leading whitespace of the invocation's line, used for regeneration.
    pub indent: String,
}

/// Parse all live `TestCase` invocations inside a declaration body.
/// Occurrences inside comments are left alone.
pub fn parse_invocations(body: &str) -> Result<Vec<TestCaseInvocation>, SyntaxError> {
    let bytes = body.as_bytes();
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(found) = body[from..].find(CASE_MARKER).map(|i| i + from) {
        from = found + CASE_MARKER.len();
        if scanner::in_comment(bytes, found) {
            continue;
        }
        let Some(open) = body[from..].find('(').map(|i| i + from) else {
            continue;
        };
        let call = split_call_args(body, open).ok_or(SyntaxError::MalformedCall { at: found })?;
        if call.args.len() < 3 {
            return Err(SyntaxError::MalformedCall { at: found });
        }

        let line_start = body[..found].rfind('\n').map_or(0, |i| i + 1);
        let lead = &body[line_start..found];
        let indent = if lead.trim().is_empty() { lead.to_string() } else { String::new() };

        out.push(TestCaseInvocation {
            span: found..call.close + 1,
            repeats: call.args[0].text.clone(),
            reference_full: call.args[1].text.clone(),
            reference: strip_template(&call.args[1].text),
            under_test_full: call.args[2].text.clone(),
            under_test: strip_template(&call.args[2].text),
            inputs: call.args[3..].iter().map(|a| a.text.clone()).collect(),
            indent,
        });
        from = call.close + 1;
    }
    Ok(out)
}
