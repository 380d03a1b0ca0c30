//! Marker redaction: delimiter-pair removals and stub/student expansion.
//!
//! Each pass finds all non-overlapping matches and splices rightmost-first
//! so earlier offsets stay valid. Matching is case-insensitive and accepts
//! both line- and block-comment marker forms. Every pass is idempotent on
//! its own output: the replacements never produce new markers.

use std::sync::OnceLock;

use regex::Regex;

struct MarkerPatterns {
    solution: Regex,
    server_internal: Regex,
    stub_block: Regex,
    stub_line: Regex,
    student_block: Regex,
    student_line: Regex,
    ignore_line: Regex,
}

fn patterns() -> &'static MarkerPatterns {
    static PATTERNS: OnceLock<MarkerPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| MarkerPatterns {
        solution: Regex::new(
            r"(?is)(?://\s*BEGIN SOLUTION|/\*\s*BEGIN SOLUTION\s*\*/).*?(?://\s*END SOLUTION|/\*\s*END SOLUTION\s*\*/)",
        )
        .unwrap(),
        // Tolerates a missing end marker: the block then runs to end of file.
        server_internal: Regex::new(
            r"(?is)(?://|/\*)\s*BEGIN\s+SERVER\s+INTERNAL.*?(?:(?://|/\*)\s*END\s+SERVER\s+INTERNAL\s*(?:\*/)?|\z)",
        )
        .unwrap(),
        stub_block: Regex::new(r"(?is)/\*\s*STUB:\s*(.*?)(?:\*/|\z)").unwrap(),
        stub_line: Regex::new(r"(?i)//\s*STUB:\s*([^\n]*)").unwrap(),
        student_block: Regex::new(r"(?is)/\*\s*STUDENT:\s*(.*?)(?:\*/|\z)").unwrap(),
        student_line: Regex::new(r"(?i)//\s*STUDENT:\s*([^\n]*)").unwrap(),
        ignore_line: Regex::new(r"(?i)//\s*IGNORE[^\S\r\n]*\n?").unwrap(),
    })
}

/// Replace every match of `re` rightmost-first: with the captured group
/// when `keep_group` is set, with nothing otherwise.
fn replace_matching(content: &str, re: &Regex, keep_group: bool) -> String {
    let mut out = content.to_string();
    if keep_group {
        let found: Vec<(std::ops::Range<usize>, String)> = re
            .captures_iter(content)
            .map(|caps| {
                let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
                let kept = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
                (whole, kept)
            })
            .collect();
        for (range, kept) in found.iter().rev() {
            out.replace_range(range.clone(), kept);
        }
    } else {
        let found: Vec<std::ops::Range<usize>> = re.find_iter(content).map(|m| m.range()).collect();
        for range in found.iter().rev() {
            out.replace_range(range.clone(), "");
        }
    }
    out
}

/// Remove `BEGIN SOLUTION … END SOLUTION` blocks.
pub fn remove_solution(content: &str) -> String {
    replace_matching(content, &patterns().solution, false)
}

/// Remove `BEGIN SERVER INTERNAL … END SERVER INTERNAL` blocks.
pub fn remove_server_internal(content: &str) -> String {
    replace_matching(content, &patterns().server_internal, false)
}

/// Expand `STUB:` markers to their replacement text.
pub fn apply_stubs(content: &str) -> String {
    let content = replace_matching(content, &patterns().stub_block, true);
    replace_matching(&content, &patterns().stub_line, true)
}

/// Expand `STUDENT:` markers to their replacement text.
pub fn apply_students(content: &str) -> String {
    let content = replace_matching(content, &patterns().student_block, true);
    replace_matching(&content, &patterns().student_line, true)
}

/// Strip standalone `// IGNORE` lines.
pub fn remove_ignores(content: &str) -> String {
    replace_matching(content, &patterns().ignore_line, false)
}
