//! Annotation markup grammar.
//!
//! An annotation token is `{{<template>|<status>}}` or
//! `{{<template>|<status>|<score>}}`, optionally followed directly by a remark
//! span `<br/><small>...</small>` (`<br>`, `<br/>` and `<br />` all accepted).
//!
//! [`AnnotationSyntax::scan`] splits a logical line into an ordered list of
//! literal and annotation segments that together cover the whole line.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Status template used by the 2026 Spring Festival editathon ledgers.
pub const DEFAULT_TEMPLATE: &str = "2026SFEditasonStatus";

static STANDARD: LazyLock<AnnotationSyntax> = LazyLock::new(|| {
    AnnotationSyntax::new(DEFAULT_TEMPLATE).expect("invalid default annotation template")
});

#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error("template name is empty")]
    EmptyTemplate,
    #[error("template name {0:?} contains markup characters")]
    InvalidTemplate(String),
    #[error("annotation pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

/// Compiled annotation grammar for one template name.
#[derive(Debug, Clone)]
pub struct AnnotationSyntax {
    template: String,
    token: Regex,
}

/// One piece of a scanned logical line. Ranges are byte offsets into the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(Range<usize>),
    Annotation(AnnotationSpan),
}

impl Segment {
    pub fn into_annotation(self) -> Option<AnnotationSpan> {
        match self {
            Segment::Annotation(span) => Some(span),
            Segment::Literal(_) => None,
        }
    }
}

/// Byte ranges of one matched annotation and its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSpan {
    /// Token plus attached remark span, if any.
    pub span: Range<usize>,
    pub status: Range<usize>,
    /// Score field including its leading `|`.
    pub score_field: Option<Range<usize>>,
    /// Whole remark markup, `<br/>` through `</small>`.
    pub remark: Option<Range<usize>>,
    /// Text between `<small>` and `</small>`.
    pub remark_text: Option<Range<usize>>,
}

impl AnnotationSpan {
    /// Score value range, without the leading `|`.
    pub fn score(&self) -> Option<Range<usize>> {
        self.score_field.as_ref().map(|r| r.start + 1..r.end)
    }
}

impl AnnotationSyntax {
    pub fn new(template: &str) -> Result<Self, SyntaxError> {
        let template = template.trim();
        if template.is_empty() {
            return Err(SyntaxError::EmptyTemplate);
        }
        if template.contains(['|', '{', '}', '\n']) {
            return Err(SyntaxError::InvalidTemplate(template.to_string()));
        }
        let pattern = [
            r"\{\{",
            &regex::escape(template),
            r"\|([^|}]*)(\|[^}]*)?\}\}",
            r"(<br\s*/?>\s*<small>(.*?)</small>)?",
        ]
        .concat();
        Ok(Self {
            template: template.to_string(),
            token: Regex::new(&pattern)?,
        })
    }

    /// Grammar for [`DEFAULT_TEMPLATE`].
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Split `text` into literal and annotation segments, left to right.
    pub fn scan(&self, text: &str) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut cursor = 0;
        for caps in self.token.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(status) = caps.get(1) else { continue };
            if whole.start() > cursor {
                segments.push(Segment::Literal(cursor..whole.start()));
            }
            segments.push(Segment::Annotation(AnnotationSpan {
                span: whole.range(),
                status: status.range(),
                score_field: caps.get(2).map(|m| m.range()),
                remark: caps.get(3).map(|m| m.range()),
                remark_text: caps.get(4).map(|m| m.range()),
            }));
            cursor = whole.end();
        }
        if cursor < text.len() {
            segments.push(Segment::Literal(cursor..text.len()));
        }
        segments
    }

    /// Annotation spans of `text` in occurrence order.
    pub fn annotations(&self, text: &str) -> Vec<AnnotationSpan> {
        self.scan(text)
            .into_iter()
            .filter_map(Segment::into_annotation)
            .collect()
    }

    /// Render a token from its status and an already formatted score field
    /// (empty, or `|` followed by the score).
    pub fn render_token(&self, status: &str, score_field: &str) -> String {
        let template = &self.template;
        format!("{{{{{template}|{status}{score_field}}}}}")
    }
}

/// Render a remark span. `#` placeholders are dropped.
pub fn render_remark(remark: &str) -> String {
    format!("<br/><small>（{}）</small>", remark.replace('#', ""))
}

/// Strip the full-width parentheses a rendered remark is wrapped in.
pub fn remark_body(inner: &str) -> &str {
    let trimmed = inner.trim();
    trimmed
        .strip_prefix('（')
        .and_then(|s| s.strip_suffix('）'))
        .unwrap_or(trimmed)
}
