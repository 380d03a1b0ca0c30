//! Shared syntax frontend for gcheck test sources: scanner, scope extraction, test classification.
//!
//! This crate is dependency-light and intended for reuse across the filter CLI and future
//! interactive tooling.
//!
//! ## Notes
//! - This crate is intentionally heuristic: it locates top-level constructs in raw C++ text
//!   without building a full grammar, a symbol table, or resolving overloads.
//! - All positions are byte offsets into the original text; every structurally significant
//!   character is ASCII.
//!
//! ## Examples
//! ```rust
//! use gfilter_syntax::scope;
//!
//! let partition = scope::extract("int add(int a, int b) { return a + b; }\n").unwrap();
//! assert_eq!(partition.scopes.len(), 1);
//! assert_eq!(partition.scopes[0].name, "add");
//! ```

pub mod classify;
pub mod diagnostics;
pub mod scanner;
pub mod scope;

pub use diagnostics::SyntaxError;
