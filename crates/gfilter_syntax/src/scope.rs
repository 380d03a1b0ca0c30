//! Partition a source file into filler text and classified top-level scopes.
//!
//! A scope is a brace-delimited region owned by a function, struct, or
//! class. Ownership is decided by a bounded backward search from the `{`:
//! a `struct`/`class` keyword (not cut off by an intervening `{` or `;`),
//! or a parameter-list `)` directly before the brace (or before a `->`
//! trailing return type). Blocks owned by neither — bare blocks, lambdas,
//! conditional bodies — are skipped and extraction resumes past them.
//!
//! The partition is exact: concatenating fillers and scope contents in
//! order reproduces the input byte for byte.

use std::ops::Range;

use crate::classify::{self, FunctionHead};
use crate::diagnostics::SyntaxError;
use crate::scanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Function,
    Struct,
    Class,
}

/// One classified top-level construct.
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    /// Span over the original text, end exclusive. For structs and classes
    /// a directly trailing `;` is included.
    pub span: Range<usize>,
    pub name: String,
    /// The brace block, from `{` through `}` inclusive-exclusive.
    pub body: Range<usize>,
    /// Parsed head for functions; `None` for structs and classes.
    pub head: Option<FunctionHead>,
}

/// Alternating filler/scope partition of a whole file.
///
/// `fillers.len() == scopes.len() + 1`; filler `i` precedes scope `i`.
#[derive(Debug, Clone)]
pub struct Partition {
    pub fillers: Vec<Range<usize>>,
    pub scopes: Vec<Scope>,
}

/// Partition `text` into fillers and scopes.
pub fn extract(text: &str) -> Result<Partition, SyntaxError> {
    let mut fillers = Vec::new();
    let mut scopes = Vec::new();
    let mut pos = 0;
    while let Some(mut scope) = next_scope(text, pos)? {
        // A head parsed from unbounded backward searches must not reach into
        // the region already emitted.
        if scope.span.start < pos {
            scope.span.start = pos;
        }
        fillers.push(pos..scope.span.start);
        pos = scope.span.end;
        scopes.push(scope);
    }
    fillers.push(pos..text.len());
    Ok(Partition { fillers, scopes })
}

/// What the backward search decided owns a brace block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Function,
    Struct { keyword: usize },
    Class { keyword: usize },
    Skip,
}

/// Classify the construct owning the `{` at `open`.
fn classify_owner(text: &str, open: usize) -> Owner {
    let head_text = &text[..open];
    let bound = head_text.rfind('{').max(head_text.rfind(';')).map_or(-1, |i| i as isize);
    let keyword = |k: &str| head_text.rfind(k).map_or(-1, |i| i as isize);
    let mut s_start = keyword("struct");
    let mut c_start = keyword("class");
    if bound > s_start {
        s_start = -1;
    }
    if bound > c_start {
        c_start = -1;
    }

    let stripped = head_text.trim_end();
    let mut f_end: isize = -1;
    if !stripped.is_empty() {
        if stripped.ends_with(')') {
            f_end = head_text.rfind(')').map_or(-1, |i| i as isize);
        } else {
            // Trailing return type: `auto f(...) -> T {`.
            let rdecl = stripped.rfind("->").map_or(-1, |i| i as isize);
            let arg_end = stripped.rfind(')').map_or(-1, |i| i as isize);
            let brace = stripped.rfind('{').map_or(-1, |i| i as isize);
            if rdecl > arg_end && brace < arg_end {
                f_end = arg_end;
            }
        }
    }

    if f_end < 0 && s_start < 0 && c_start < 0 {
        Owner::Skip
    } else if f_end > s_start && f_end > c_start {
        Owner::Function
    } else if s_start > c_start {
        Owner::Struct { keyword: s_start as usize }
    } else {
        Owner::Class { keyword: c_start as usize }
    }
}

/// Find and classify the next scope at or after `from`.
fn next_scope(text: &str, from: usize) -> Result<Option<Scope>, SyntaxError> {
    let bytes = text.as_bytes();
    let mut from = from;
    loop {
        let Some(open) = scanner::find_not_in_comment(text, "{", from) else {
            return Ok(None);
        };
        let close = scanner::find_forward(text, b'}', open + 1)
            .ok_or(SyntaxError::UnbalancedBraces { open })?;

        let scope = match classify_owner(text, open) {
            Owner::Skip => {
                tracing::trace!(open, "skipping unowned brace block");
                from = close;
                continue;
            }
            Owner::Function => match classify::parse_head(text, open) {
                Some(head) => Scope {
                    kind: ScopeKind::Function,
                    span: head.start..close + 1,
                    name: head.name.clone(),
                    body: open..close + 1,
                    head: Some(head),
                },
                None => {
                    from = close;
                    continue;
                }
            },
            Owner::Struct { keyword } => {
                keyword_scope(text, bytes, ScopeKind::Struct, keyword, keyword + "struct".len(), open, close)
            }
            Owner::Class { keyword } => {
                keyword_scope(text, bytes, ScopeKind::Class, keyword, keyword + "class".len(), open, close)
            }
        };
        return Ok(Some(scope));
    }
}

fn keyword_scope(
    text: &str,
    bytes: &[u8],
    kind: ScopeKind,
    start: usize,
    name_from: usize,
    open: usize,
    close: usize,
) -> Scope {
    // Take the trailing `;` with the type definition when directly adjacent.
    let end = if bytes.get(close + 1) == Some(&b';') { close + 2 } else { close + 1 };
    Scope {
        kind,
        span: start..end,
        name: text[name_from.min(open)..open].trim().to_string(),
        body: open..close + 1,
        head: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassembled(text: &str) -> String {
        let partition = extract(text).unwrap();
        let mut out = String::new();
        for (filler, scope) in partition.fillers.iter().zip(&partition.scopes) {
            out.push_str(&text[filler.clone()]);
            out.push_str(&text[scope.span.clone()]);
        }
        out.push_str(&text[partition.fillers.last().unwrap().clone()]);
        out
    }

    #[test]
    fn partition_reproduces_input() {
        let text = "#include <vector>\n\nint add(int a, int b) {\n    return a + b;\n}\n\nstruct Point {\n    int x;\n};\n";
        assert_eq!(reassembled(text), text);
    }

    #[test]
    fn classifies_function_struct_class() {
        let text = "int f() { return 1; }\nstruct S {\n    int a;\n};\nclass C {\npublic:\n    void m();\n};\n";
        let partition = extract(text).unwrap();
        let kinds: Vec<_> = partition.scopes.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![ScopeKind::Function, ScopeKind::Struct, ScopeKind::Class]);
        assert_eq!(partition.scopes[0].name, "f");
        assert_eq!(partition.scopes[1].name, "S");
        assert_eq!(partition.scopes[2].name, "C");
    }

    #[test]
    fn struct_span_includes_trailing_semicolon() {
        let text = "struct P { int x; };\n";
        let partition = extract(text).unwrap();
        assert_eq!(&text[partition.scopes[0].span.clone()], "struct P { int x; };");
        assert_eq!(reassembled(text), text);
    }

    #[test]
    fn bare_blocks_are_skipped() {
        let text = "namespace {\n}\nint f() { return 0; }\n";
        // The namespace brace has no parameter list or keyword we classify;
        // extraction resumes past it and still finds the function.
        let partition = extract(text).unwrap();
        assert_eq!(partition.scopes.len(), 1);
        assert_eq!(partition.scopes[0].name, "f");
        assert_eq!(reassembled(text), text);
    }

    #[test]
    fn nested_braces_stay_inside_the_scope() {
        let text = "int f() {\n    if (x) { y(); }\n    return 0;\n}\n";
        let partition = extract(text).unwrap();
        assert_eq!(partition.scopes.len(), 1);
        assert!(text[partition.scopes[0].span.clone()].contains("if (x) { y(); }"));
        assert_eq!(reassembled(text), text);
    }

    #[test]
    fn keyword_inside_earlier_statement_does_not_leak() {
        // The `;` between `struct` and the brace invalidates the keyword; the
        // parameter list wins and the scope is a function.
        let text = "struct Q;\nint f() { return 0; }\n";
        let partition = extract(text).unwrap();
        assert_eq!(partition.scopes.len(), 1);
        assert_eq!(partition.scopes[0].kind, ScopeKind::Function);
    }

    #[test]
    fn trailing_return_type_is_a_function() {
        let text = "auto f(int x) -> int {\n    return x;\n}\n";
        let partition = extract(text).unwrap();
        assert_eq!(partition.scopes.len(), 1);
        assert_eq!(partition.scopes[0].kind, ScopeKind::Function);
        assert_eq!(partition.scopes[0].name, "f");
    }

    #[test]
    fn unbalanced_braces_fail_extraction() {
        let text = "int f() { return 0;\n";
        assert!(matches!(extract(text), Err(SyntaxError::UnbalancedBraces { .. })));
    }

    #[test]
    fn test_declaration_is_classified() {
        let text = "TEST(suite, name) {\n    TestCase(1, Ref, Impl, gen);\n}\n";
        let partition = extract(text).unwrap();
        let scope = &partition.scopes[0];
        assert_eq!(scope.kind, ScopeKind::Function);
        let head = scope.head.as_ref().unwrap();
        let test = head.test.as_ref().unwrap();
        assert_eq!(test.suite, "suite");
        assert_eq!(test.test, "name");
    }
}
