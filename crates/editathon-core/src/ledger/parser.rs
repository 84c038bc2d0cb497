//! Ledger parser: logical lines in, addressable annotation records out.

use serde::{Deserialize, Serialize};

use super::grammar::{AnnotationSpan, AnnotationSyntax, remark_body};
use super::normalize::{LogicalLine, normalize_to_logical_lines};
use super::region::table_lines;

/// One status/score annotation found inside a table region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// First cell of the row, best-effort.
    pub entry_name: String,
    pub status: String,
    /// Score text as written, `None` when the token has no score field.
    pub score: Option<String>,
    /// Remark text without its markup.
    pub remark: Option<String>,
    pub line_index: usize,
    pub occurrence_index: usize,
    /// Character offset in the comment-stripped document.
    pub absolute_position: usize,
    /// Character offset within the comment-stripped logical line.
    pub relative_position: usize,
    /// Matched token plus attached remark, comments removed.
    pub original_span: String,
    /// The trimmed logical line the record was found on.
    pub original_line: String,
}

impl AnnotationRecord {
    /// Numeric score, when present and finite.
    pub fn score_value(&self) -> Option<f64> {
        self.score.as_deref().and_then(score_value)
    }

    /// True when the token carries no score or an empty one.
    pub fn is_unscored(&self) -> bool {
        self.score.as_deref().is_none_or(|s| s.trim().is_empty())
    }
}

/// Result of parsing one ledger page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseOutcome {
    pub entry_count: usize,
    pub total_score: f64,
    pub items: Vec<AnnotationRecord>,
}

/// Parse a ledger page with the default template.
pub fn parse(document: &str) -> ParseOutcome {
    AnnotationSyntax::standard().parse(document)
}

/// Interpret score text as a number. Non-numeric and non-finite values yield `None`.
pub fn score_value(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Round a score to four decimal places.
pub fn format_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

impl AnnotationSyntax {
    /// Parse `document` into annotation records addressed by
    /// `(line_index, occurrence_index)`.
    pub fn parse(&self, document: &str) -> ParseOutcome {
        let lines = normalize_to_logical_lines(document);
        table_lines(&lines).fold(ParseOutcome::default(), |outcome, line| {
            self.collect_line(outcome, line)
        })
    }

    fn collect_line(&self, mut outcome: ParseOutcome, line: &LogicalLine<'_>) -> ParseOutcome {
        let spans = self.annotations(&line.text);
        if spans.is_empty() {
            return outcome;
        }

        let visible = line.visible_text();
        let entry_name = entry_name(&visible);
        let original_line = visible.trim().to_string();

        for (occurrence_index, span) in spans.into_iter().enumerate() {
            let record = record_for(line, &span, &entry_name, &original_line, occurrence_index);
            if let Some(value) = record.score_value() {
                outcome.total_score += value;
            }
            outcome.entry_count += 1;
            outcome.items.push(record);
        }
        outcome
    }
}

fn record_for(
    line: &LogicalLine<'_>,
    span: &AnnotationSpan,
    entry_name: &str,
    original_line: &str,
    occurrence_index: usize,
) -> AnnotationRecord {
    let relative_position = line.visible_chars_before(span.span.start);
    AnnotationRecord {
        entry_name: entry_name.to_string(),
        status: line.visible(span.status.clone()),
        score: span.score().map(|r| line.visible(r)),
        remark: span
            .remark_text
            .clone()
            .map(|r| remark_body(&line.visible(r)).to_string()),
        line_index: line.index,
        occurrence_index,
        absolute_position: line.visible_offset + relative_position,
        relative_position,
        original_span: line.visible(span.span.clone()),
        original_line: original_line.to_string(),
    }
}

/// Text between the first and second `|` of a row, minus a leading `!`.
fn entry_name(line: &str) -> String {
    let mut cells = line.split('|');
    cells.next();
    let Some(first) = cells.next() else {
        return String::new();
    };
    let name = first.trim();
    name.strip_prefix('!').map_or(name, str::trim).to_string()
}
