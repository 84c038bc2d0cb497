//! Logical-line normalization shared by the ledger parser and the rewriter.
//!
//! Wiki tables may spread one row's cells over several physical lines, each
//! continuation starting with `|`. Annotations are addressed by the index of
//! the merged ("logical") line, so parsing and rewriting must agree byte for
//! byte on how lines are merged. This module is the only place that decides it.
//!
//! Both transformations applied here preserve length, so a byte offset into a
//! logical line's `text` is also a byte offset into its `source` slice:
//!
//! - comment spans (`<!-- ... -->`) are blanked to spaces, newlines included;
//! - the newline in front of a continuation line becomes the [`JOINER`].
//!
//! A newline inside a comment therefore never starts a new physical line, and
//! continuation and structure checks look at the comment-free text. The result
//! is the same line structure as removing comments before splitting.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Replaces the newline in front of a continuation line.
pub const JOINER: char = '|';

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("invalid comment pattern"));

/// Structural role of a logical line in wiki table markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `{| ...`
    TableOpen,
    /// `|}`
    TableClose,
    /// `|- ...`
    RowSeparator,
    Content,
}

impl LineKind {
    /// Classify a line by its comment-free text, ignoring leading whitespace.
    pub fn classify(text: &str) -> Self {
        let trimmed = text.trim_start();
        if trimmed.starts_with("{|") {
            LineKind::TableOpen
        } else if trimmed.starts_with("|}") {
            LineKind::TableClose
        } else if trimmed.starts_with("|-") {
            LineKind::RowSeparator
        } else {
            LineKind::Content
        }
    }

    /// Structural lines never absorb continuation lines.
    pub fn is_structural(self) -> bool {
        !matches!(self, LineKind::Content)
    }
}

/// One row-worth of markup after continuation merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine<'a> {
    /// Zero-based position in the normalized sequence.
    pub index: usize,
    /// Byte offset of the first physical line in the source document.
    pub offset: usize,
    /// Exact source slice covered, including merged newlines and comments.
    pub source: &'a str,
    /// Logical text: joiners in place of merged newlines, comments blanked.
    pub text: String,
    /// Character offset of this line's start in the comment-stripped document.
    pub visible_offset: usize,
    comments: Vec<Range<usize>>,
}

impl LogicalLine<'_> {
    pub fn kind(&self) -> LineKind {
        LineKind::classify(&self.visible_text())
    }

    /// Byte range of this line in the source document.
    pub fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.source.len()
    }

    /// Comment-free text of `range` (byte offsets relative to this line).
    pub fn visible(&self, range: Range<usize>) -> String {
        let mut out = String::with_capacity(range.len());
        let mut pos = range.start;
        for comment in &self.comments {
            if comment.end <= pos || comment.start >= range.end {
                continue;
            }
            if comment.start > pos {
                out.push_str(&self.text[pos..comment.start]);
            }
            pos = comment.end;
        }
        if pos < range.end {
            out.push_str(&self.text[pos..range.end]);
        }
        out
    }

    /// Comment-free text of the whole line.
    pub fn visible_text(&self) -> String {
        self.visible(0..self.text.len())
    }

    /// Number of comment-free characters between the line start and `pos`.
    pub fn visible_chars_before(&self, pos: usize) -> usize {
        self.visible(0..pos).chars().count()
    }
}

/// Split `document` into logical lines.
///
/// A physical line is a continuation when it starts with `|` but is neither a
/// row separator (`|-`) nor a table close (`|}`), and the previous logical
/// line is not itself structural. Continuations are appended to the previous
/// logical line with [`JOINER`] replacing the newline.
///
/// Logical lines partition the document: joining every `source` with `"\n"`
/// reproduces the input exactly.
pub fn normalize_to_logical_lines(document: &str) -> Vec<LogicalLine<'_>> {
    let comments: Vec<Range<usize>> = COMMENT.find_iter(document).map(|m| m.range()).collect();
    let masked = blank_comments(document, &comments);

    let mut lines: Vec<LogicalLine<'_>> = Vec::new();
    let mut ends: Vec<usize> = Vec::new();
    let mut last_kind: Option<LineKind> = None;
    let mut offset = 0;

    for physical in masked.split('\n') {
        let end = offset + physical.len();
        let visible = strip_comments(document, &comments, offset..end);
        let absorbs = last_kind.is_some_and(|kind| !kind.is_structural());

        if absorbs && is_continuation(&visible) {
            if let (Some(prev), Some(prev_end)) = (lines.last_mut(), ends.last_mut()) {
                prev.text.push(JOINER);
                prev.text.push_str(physical);
                *prev_end = end;
            }
        } else {
            lines.push(LogicalLine {
                index: lines.len(),
                offset,
                source: "",
                text: physical.to_string(),
                visible_offset: 0,
                comments: Vec::new(),
            });
            ends.push(end);
            last_kind = Some(LineKind::classify(&visible));
        }
        offset = end + 1;
    }

    let mut counter = StrippedCounter::default();
    for (line, end) in lines.iter_mut().zip(ends) {
        line.source = &document[line.offset..end];
        line.visible_offset = counter.advance(document, &comments, line.offset);
        line.comments = comments
            .iter()
            .filter(|c| c.start < end && c.end > line.offset)
            .map(|c| c.start.max(line.offset) - line.offset..c.end.min(end) - line.offset)
            .collect();
    }

    lines
}

fn is_continuation(physical: &str) -> bool {
    physical.starts_with(JOINER) && !physical.starts_with("|-") && !physical.starts_with("|}")
}

/// Comment-free text of `range`. Comments never straddle a physical line.
fn strip_comments(document: &str, comments: &[Range<usize>], range: Range<usize>) -> String {
    let mut out = String::with_capacity(range.len());
    let mut pos = range.start;
    for comment in comments
        .iter()
        .filter(|c| c.end > range.start && c.start < range.end)
    {
        if comment.start > pos {
            out.push_str(&document[pos..comment.start]);
        }
        pos = pos.max(comment.end);
    }
    if pos < range.end {
        out.push_str(&document[pos..range.end]);
    }
    out
}

/// Replace every comment character, newlines included, with same-width spaces.
fn blank_comments(document: &str, comments: &[Range<usize>]) -> String {
    if comments.is_empty() {
        return document.to_string();
    }
    let mut out = String::with_capacity(document.len());
    let mut next = 0;
    for (pos, ch) in document.char_indices() {
        while next < comments.len() && comments[next].end <= pos {
            next += 1;
        }
        let in_comment = comments.get(next).is_some_and(|c| c.start <= pos);
        if in_comment {
            out.extend(std::iter::repeat_n(' ', ch.len_utf8()));
        } else {
            out.push(ch);
        }
    }
    out
}

/// Walks the document forward counting characters that survive comment removal.
#[derive(Default)]
struct StrippedCounter {
    pos: usize,
    count: usize,
    next: usize,
}

impl StrippedCounter {
    fn advance(&mut self, document: &str, comments: &[Range<usize>], target: usize) -> usize {
        while self.pos < target {
            match comments.get(self.next) {
                Some(c) if c.end <= self.pos => self.next += 1,
                Some(c) if c.start <= self.pos => self.pos = c.end.min(target),
                Some(c) => {
                    let stop = c.start.min(target);
                    self.count += document[self.pos..stop].chars().count();
                    self.pos = stop;
                }
                None => {
                    self.count += document[self.pos..target].chars().count();
                    self.pos = target;
                }
            }
        }
        self.count
    }
}
