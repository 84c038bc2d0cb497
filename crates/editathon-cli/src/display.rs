//! Plain-text rendering of a parsed ledger.

use editathon_core::ParseOutcome;
use editathon_core::ledger::format_score;

const MAX_CELL_CHARS: usize = 40;

/// Print one page's annotations as a table, one row per annotation.
pub fn print_ledger(title: &str, outcome: &ParseOutcome) {
    println!("=== {title} ===");
    println!(
        "entries: {}  score: {}",
        outcome.entry_count,
        format_score(outcome.total_score)
    );
    println!();

    if outcome.items.is_empty() {
        println!("(no annotations)");
        return;
    }

    println!(
        "{:>5} {:>3}  {:<10} {:>7}  {:<24}  remark",
        "line", "occ", "status", "score", "entry"
    );
    for record in &outcome.items {
        println!(
            "{:>5} {:>3}  {:<10} {:>7}  {:<24}  {}",
            record.line_index,
            record.occurrence_index,
            truncate(&record.status),
            record.score.as_deref().unwrap_or("-"),
            truncate(&record.entry_name),
            record.remark.as_deref().map(truncate).unwrap_or_default(),
        );
    }
}

fn truncate(s: &str) -> String {
    if s.chars().count() <= MAX_CELL_CHARS {
        return s.to_string();
    }
    let mut out: String = s.chars().take(MAX_CELL_CHARS - 1).collect();
    out.push('…');
    out
}
