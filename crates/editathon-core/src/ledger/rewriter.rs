//! Template rewriter: apply reviewer decisions to annotations in place.
//!
//! Each affected logical line is scanned into literal and annotation segments
//! and rebuilt from the source text, mapping only addressed annotation spans
//! through their update. Untouched lines are copied verbatim, so the output is
//! byte-identical to the input outside the replaced spans.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::grammar::{AnnotationSpan, AnnotationSyntax, Segment, render_remark};
use super::normalize::{LogicalLine, normalize_to_logical_lines};
use super::parser::AnnotationRecord;
use super::region::table_lines;

/// A change to one annotation, addressed like [`AnnotationRecord`].
///
/// `None` keeps the original value. For `new_score`, `Some("")` removes the
/// score field entirely. A blank `new_remark` keeps the original remark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateInstruction {
    pub line_index: usize,
    pub occurrence_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_score: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_remark: Option<String>,
}

impl UpdateInstruction {
    /// An instruction addressing `record` that changes nothing yet.
    pub fn for_record(record: &AnnotationRecord) -> Self {
        Self {
            line_index: record.line_index,
            occurrence_index: record.occurrence_index,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.new_status = Some(status.into());
        self
    }

    pub fn with_score(mut self, score: impl Into<String>) -> Self {
        self.new_score = Some(score.into());
        self
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.new_remark = Some(remark.into());
        self
    }

    /// Whether the new values can be written without changing the token's
    /// field layout. Status and score may not contain `|`, braces or line
    /// breaks; a remark may not contain line breaks.
    pub fn is_renderable(&self) -> bool {
        let field_ok = |v: &Option<String>| {
            v.as_deref()
                .is_none_or(|v| !v.contains(['|', '{', '}', '\n', '\r']))
        };
        field_ok(&self.new_status)
            && field_ok(&self.new_score)
            && self
                .new_remark
                .as_deref()
                .is_none_or(|r| !r.contains(['\n', '\r']))
    }
}

/// Rewrite annotations using the default template.
pub fn rewrite(document: &str, updates: &[UpdateInstruction]) -> String {
    AnnotationSyntax::standard().rewrite(document, updates)
}

type LineUpdates<'u> = BTreeMap<usize, &'u UpdateInstruction>;

impl AnnotationSyntax {
    /// Apply `updates` to `document`.
    ///
    /// Instructions whose line is out of range or outside a table, or whose
    /// occurrence has no matching annotation, are skipped. When several
    /// instructions address the same annotation the last one wins.
    pub fn rewrite(&self, document: &str, updates: &[UpdateInstruction]) -> String {
        if updates.is_empty() {
            return document.to_string();
        }

        let mut by_line: BTreeMap<usize, LineUpdates<'_>> = BTreeMap::new();
        for update in updates {
            by_line
                .entry(update.line_index)
                .or_default()
                .insert(update.occurrence_index, update);
        }

        let lines = normalize_to_logical_lines(document);
        let mut rebuilt: Vec<Cow<'_, str>> = lines.iter().map(|l| Cow::Borrowed(l.source)).collect();

        for line in table_lines(&lines) {
            if let Some(line_updates) = by_line.remove(&line.index) {
                rebuilt[line.index] = Cow::Owned(self.rebuild_line(line, &line_updates));
            }
        }

        for (line_index, skipped) in &by_line {
            debug!(
                line_index,
                count = skipped.len(),
                "no table line at index, updates skipped"
            );
        }

        rebuilt.join("\n")
    }

    fn rebuild_line(&self, line: &LogicalLine<'_>, updates: &LineUpdates<'_>) -> String {
        let mut out = String::with_capacity(line.source.len());
        let mut occurrence = 0;
        for segment in self.scan(&line.text) {
            match segment {
                Segment::Literal(range) => out.push_str(&line.source[range]),
                Segment::Annotation(span) => {
                    match updates.get(&occurrence) {
                        Some(update) if update.is_renderable() => {
                            out.push_str(&self.replacement(line, &span, update))
                        }
                        Some(_) => {
                            debug!(
                                line_index = line.index,
                                occurrence_index = occurrence,
                                "update would break annotation markup, skipped"
                            );
                            out.push_str(&line.source[span.span.clone()]);
                        }
                        None => out.push_str(&line.source[span.span.clone()]),
                    }
                    occurrence += 1;
                }
            }
        }
        for occurrence_index in updates.range(occurrence..).map(|(k, _)| k) {
            debug!(
                line_index = line.index,
                occurrence_index, "no annotation at occurrence, update skipped"
            );
        }
        out
    }

    fn replacement(
        &self,
        line: &LogicalLine<'_>,
        span: &AnnotationSpan,
        update: &UpdateInstruction,
    ) -> String {
        let status = update
            .new_status
            .as_deref()
            .unwrap_or(&line.source[span.status.clone()]);

        let score_field: Cow<'_, str> = match update.new_score.as_deref() {
            Some("") => Cow::Borrowed(""),
            Some(score) => Cow::Owned(format!("|{score}")),
            None => Cow::Borrowed(
                span.score_field
                    .clone()
                    .map_or("", |r| &line.source[r]),
            ),
        };

        let remark: Cow<'_, str> = match update
            .new_remark
            .as_deref()
            .filter(|r| !r.trim().is_empty())
        {
            Some(remark) => Cow::Owned(render_remark(remark)),
            None => Cow::Borrowed(span.remark.clone().map_or("", |r| &line.source[r])),
        };

        let mut text = self.render_token(status, &score_field);
        text.push_str(&remark);
        text
    }
}
