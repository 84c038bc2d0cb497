//! Small in-place edits on contribution pages outside the ledger table.

use std::sync::LazyLock;

use regex::{Captures, Regex};

const END_NOINCLUDE: &str = "</noinclude>";
const START_NOINCLUDE: &str = "<noinclude>";

static HEADER_COUNTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\{\{mbox\|type=policy\|text=\{\{center\|已提交条目数：''')(\d+)('''\s*目前得分：''')([\d.]+)('''\}\}\}\})",
    )
    .expect("invalid header counts pattern")
});

/// Rewrite the submitted-count and score figures in the page's policy box:
///
/// ```text
/// {{mbox|type=policy|text={{center|已提交条目数：'''0'''目前得分：'''0'''}}}}
/// ```
///
/// Returns the page unchanged when the box is not present.
pub fn update_header_counts(document: &str, entry_count: usize, total_score: f64) -> String {
    HEADER_COUNTS
        .replace(document, |caps: &Captures<'_>| {
            format!(
                "{}{entry_count}{}{total_score}{}",
                &caps[1], &caps[3], &caps[5]
            )
        })
        .into_owned()
}

/// Read the figures back out of the policy box.
#[cfg(test)]
pub(crate) fn header_counts(document: &str) -> Option<(usize, f64)> {
    let caps = HEADER_COUNTS.captures(document)?;
    let count = caps[2].parse().ok()?;
    let score = caps[4].parse().ok()?;
    Some((count, score))
}

/// Append `fragment` to the insertion zone: the text between the first
/// `</noinclude>` and the next `<noinclude>`.
///
/// The zone is terminated with a newline before the fragment is added, and the
/// fragment is followed by one. Returns the page unchanged when either marker
/// is missing.
pub fn append_to_insertion_zone(document: &str, fragment: &str) -> String {
    let Some(end_marker) = document.find(END_NOINCLUDE) else {
        return document.to_string();
    };
    let zone_start = end_marker + END_NOINCLUDE.len();
    let Some(zone_len) = document[zone_start..].find(START_NOINCLUDE) else {
        return document.to_string();
    };
    let zone_end = zone_start + zone_len;

    let mut zone = document[zone_start..zone_end].to_string();
    if !zone.is_empty() && !zone.ends_with('\n') {
        zone.push('\n');
    }
    zone.push_str(fragment);
    zone.push('\n');

    [&document[..zone_start], &zone, &document[zone_end..]].concat()
}
