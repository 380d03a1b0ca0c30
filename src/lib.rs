//! gfilter: distribution filter for gcheck test sources.
//!
//! Prepares instructor test sources for distribution to students: strips
//! solution code, expands stub/student markers, and rewrites test
//! declarations that exercise a hidden reference implementation into
//! self-contained declarations carrying literal expected data harvested
//! from a prior instrumented run.
//!
//! The heavy lifting — locating top-level constructs in raw C++ text and
//! telling template argument lists apart from comparison operators without
//! a full grammar — lives in the [`gfilter_syntax`] crate; this crate adds
//! the report data source, the body rewriters, marker redaction, and the
//! directory walker behind the CLI.

pub mod cli;
pub mod redact;
pub mod report;
pub mod rewrite;
pub mod walk;
