//! Review queue extraction and application of reviewer decisions.

use serde::{Deserialize, Serialize};

use crate::ledger::{AnnotationRecord, AnnotationSyntax, ParseOutcome, UpdateInstruction, format_score};
use crate::page::update_header_counts;

/// Statuses that always need a reviewer.
pub const PENDING_STATUSES: &[&str] = &["pending", "待审核", "doing", "审核中"];
/// Accepted statuses; these still need a reviewer until they carry a score.
pub const PASS_STATUSES: &[&str] = &["pass", "通过"];

/// An annotation waiting for review, tagged with its page and owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub page: String,
    pub user: String,
    #[serde(flatten)]
    pub record: AnnotationRecord,
}

/// A reviewer's decisions for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewBatch {
    pub title: String,
    #[serde(default)]
    pub items: Vec<UpdateInstruction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ReviewBatch {
    /// Edit summary, falling back to `default` when the batch has none.
    pub fn summary_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(default)
    }
}

/// A page after review decisions were applied and its header recounted.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewedPage {
    pub text: String,
    pub entry_count: usize,
    pub total_score: f64,
}

impl ReviewedPage {
    pub fn changed(&self, original: &str) -> bool {
        self.text != original
    }
}

/// Whether `record` still needs a reviewer.
pub fn is_pending(record: &AnnotationRecord) -> bool {
    let status = record.status.trim().to_lowercase();
    PENDING_STATUSES.contains(&status.as_str())
        || (PASS_STATUSES.contains(&status.as_str()) && record.is_unscored())
}

/// Pending records of one parsed page, in page order.
pub fn collect_pending(page: &str, user: &str, outcome: &ParseOutcome) -> Vec<ReviewItem> {
    outcome
        .items
        .iter()
        .filter(|record| is_pending(record))
        .map(|record| ReviewItem {
            page: page.to_string(),
            user: user.to_string(),
            record: record.clone(),
        })
        .collect()
}

/// Apply `updates` to a ledger page, then refresh its header counters from the
/// rewritten ledger.
pub fn apply_review(
    syntax: &AnnotationSyntax,
    document: &str,
    updates: &[UpdateInstruction],
) -> ReviewedPage {
    let rewritten = syntax.rewrite(document, updates);
    recount(syntax, &rewritten)
}

/// Refresh a page's header counters from its ledger.
pub fn recount(syntax: &AnnotationSyntax, document: &str) -> ReviewedPage {
    let outcome = syntax.parse(document);
    let total_score = format_score(outcome.total_score);
    ReviewedPage {
        text: update_header_counts(document, outcome.entry_count, total_score),
        entry_count: outcome.entry_count,
        total_score,
    }
}
