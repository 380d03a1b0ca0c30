//! Error types for the syntax frontend.

use thiserror::Error;

/// Errors produced while partitioning a source file into scopes.
///
/// All variants are file-scoped: the caller abandons the current file and
/// moves on, they are never fatal to a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    /// A `{` at the given offset has no matching `}` on its nesting level,
    /// even after the relaxed re-scan.
    #[error("unbalanced braces: no matching `}}` for `{{` at offset {open}")]
    UnbalancedBraces { open: usize },

    /// A call form could not be split into arguments (missing `(` or `)`).
    #[error("malformed call arguments near offset {at}")]
    MalformedCall { at: usize },
}
