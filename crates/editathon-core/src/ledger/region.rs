//! Inside/outside table-region tracking.
//!
//! Annotation scanning only happens inside `{| ... |}`. The opening and
//! closing lines themselves are never scanned. Nesting is not tracked: the
//! first `|}` after any `{|` leaves the region.

use super::normalize::{LineKind, LogicalLine};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableRegion {
    #[default]
    Outside,
    Inside,
}

impl TableRegion {
    /// Consume one line. Returns the state after the line and whether the line
    /// itself should be scanned for annotations.
    pub fn step(self, kind: LineKind) -> (Self, bool) {
        match kind {
            LineKind::TableOpen => (TableRegion::Inside, false),
            LineKind::TableClose => (TableRegion::Outside, false),
            LineKind::RowSeparator | LineKind::Content => (self, self == TableRegion::Inside),
        }
    }
}

/// Lines that sit inside a table region, in document order.
pub fn table_lines<'l, 'a>(
    lines: &'l [LogicalLine<'a>],
) -> impl Iterator<Item = &'l LogicalLine<'a>> {
    lines
        .iter()
        .scan(TableRegion::Outside, |region, line| {
            let (next, scan) = region.step(line.kind());
            *region = next;
            Some(scan.then_some(line))
        })
        .flatten()
}
