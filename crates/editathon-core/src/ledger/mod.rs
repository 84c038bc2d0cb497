//! Contribution-ledger parsing and rewriting.
//!
//! A ledger page is a wiki table whose rows carry status annotations such as
//! `{{2026SFEditasonStatus|pass|5}}`. [`parse`] extracts them as records
//! addressed by `(line_index, occurrence_index)`; [`rewrite`] applies updates
//! addressed the same way. Both go through [`normalize_to_logical_lines`], so
//! addresses produced by one are valid for the other as long as the page has
//! not changed in between.

pub mod grammar;
pub mod normalize;
pub mod parser;
pub mod region;
pub mod rewriter;

pub use grammar::{AnnotationSpan, AnnotationSyntax, DEFAULT_TEMPLATE, Segment, SyntaxError};
pub use normalize::{LineKind, LogicalLine, normalize_to_logical_lines};
pub use parser::{AnnotationRecord, ParseOutcome, format_score, parse, score_value};
pub use region::{TableRegion, table_lines};
pub use rewriter::{UpdateInstruction, rewrite};
