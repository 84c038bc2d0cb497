//! Review commands: queue extraction, applying decisions, header upkeep and
//! submissions.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use editathon_core::review::{ReviewBatch, ReviewItem};
use editathon_core::{append_to_insertion_zone, apply_review, collect_pending};
use editathon_store::PageStore;

use crate::Session;
use crate::display;

const RECOUNT_SUMMARY: &str = "更新统计（2026年春节编辑松小工具）";
const SUBMIT_SUMMARY: &str = "提交条目（2026年春节编辑松小工具）";

/// Pending review items across every contribution page.
pub fn pending_items(session: &Session) -> Result<(Vec<ReviewItem>, usize)> {
    let titles = session
        .store
        .list(&session.config.page_prefix)
        .context("failed to list contribution pages")?;

    let mut items = Vec::new();
    let mut failures = 0;
    for title in &titles {
        let Some(user) = session.config.username_from_title(title) else {
            continue;
        };
        let text = match session.store.read(title) {
            Ok(text) => text,
            Err(e) => {
                warn!(title = %title, error = %e, "skipping unreadable page");
                failures += 1;
                continue;
            }
        };
        let outcome = session.syntax.parse(&text);
        let pending = collect_pending(title, user, &outcome);
        if !pending.is_empty() {
            info!(title = %title, pending = pending.len(), "found pending items");
        }
        items.extend(pending);
    }
    Ok((items, failures))
}

pub fn scan(session: &Session, out: Option<&Path>) -> Result<()> {
    let (items, failures) = pending_items(session)?;
    let json = serde_json::to_string_pretty(&items)?;
    match out {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }
    info!(pending = items.len(), failures, "scan complete");
    Ok(())
}

pub fn show(session: &Session, title: &str) -> Result<()> {
    let text = session
        .store
        .read(title)
        .with_context(|| format!("failed to read {title}"))?;
    let outcome = session.syntax.parse(&text);
    display::print_ledger(title, &outcome);
    Ok(())
}

pub fn apply(session: &Session, batch_path: &Path) -> Result<()> {
    let raw = fs::read_to_string(batch_path)
        .with_context(|| format!("failed to read {}", batch_path.display()))?;
    let batches: Vec<ReviewBatch> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid review batch file {}", batch_path.display()))?;

    let mut saved = 0;
    let mut failures = 0;
    for batch in &batches {
        match apply_batch(session, batch) {
            Ok(true) => saved += 1,
            Ok(false) => info!(title = %batch.title, "no changes"),
            Err(e) => {
                warn!(title = %batch.title, error = %e, "failed to apply review");
                failures += 1;
            }
        }
    }
    info!(batches = batches.len(), saved, failures, "review applied");
    Ok(())
}

fn apply_batch(session: &Session, batch: &ReviewBatch) -> Result<bool> {
    let original = session.store.read(&batch.title)?;
    let reviewed = apply_review(&session.syntax, &original, &batch.items);
    if !reviewed.changed(&original) {
        return Ok(false);
    }
    let summary = batch.summary_or(&session.config.review_summary);
    session.store.write(&batch.title, &reviewed.text, summary)?;
    info!(
        title = %batch.title,
        items = batch.items.len(),
        entries = reviewed.entry_count,
        score = reviewed.total_score,
        "saved review"
    );
    Ok(true)
}

pub fn recount(session: &Session, title: &str) -> Result<()> {
    let original = session
        .store
        .read(title)
        .with_context(|| format!("failed to read {title}"))?;
    save_recounted(session, title, &original, &original, RECOUNT_SUMMARY)
}

/// Append `fragment` to the page's insertion zone and refresh its counters.
pub fn submit(session: &Session, title: &str, fragment: &str) -> Result<()> {
    let original = session
        .store
        .read(title)
        .with_context(|| format!("failed to read {title}"))?;
    let appended = append_to_insertion_zone(&original, fragment);
    if appended == original {
        warn!(title, "page has no insertion zone; nothing submitted");
        return Ok(());
    }
    save_recounted(session, title, &original, &appended, SUBMIT_SUMMARY)
}

fn save_recounted(
    session: &Session,
    title: &str,
    original: &str,
    text: &str,
    summary: &str,
) -> Result<()> {
    let page = editathon_core::recount(&session.syntax, text);
    if !page.changed(original) {
        info!(title, "page already up to date");
        return Ok(());
    }
    session
        .store
        .write(title, &page.text, summary)
        .with_context(|| format!("failed to save {title}"))?;
    info!(
        title,
        entries = page.entry_count,
        score = page.total_score,
        "updated page"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use editathon_core::{EventConfig, UpdateInstruction};
    use editathon_store::DirPageStore;

    const PAGE: &str = "\
<noinclude>{{mbox|type=policy|text={{center|已提交条目数：'''0'''目前得分：'''0'''}}}}
{| class=\"wikitable\"
! 条目 !! 状态
</noinclude>
|-
| [[甲]] || {{2026SFEditasonStatus|pending}}
|-
| [[乙]] || {{2026SFEditasonStatus|pass|2}}
<noinclude>
|}</noinclude>";

    fn session(dir: &Path) -> Session {
        let config = EventConfig::default();
        Session {
            store: DirPageStore::open(dir).unwrap(),
            syntax: editathon_core::AnnotationSyntax::new(&config.template).unwrap(),
            config,
        }
    }

    #[test]
    fn scan_collects_from_contribution_pages_only() {
        let tmp = tempfile::tempdir().unwrap();
        let s = session(tmp.path());
        let title = s.config.contribution_title("用户甲");
        s.store.write(&title, PAGE, "").unwrap();
        s.store.write(&s.config.leaderboard_title, PAGE, "").unwrap();

        let (items, failures) = pending_items(&s).unwrap();
        assert_eq!(failures, 0);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].user, "用户甲");
        assert_eq!(items[0].page, title);
        assert_eq!(items[0].record.entry_name, "[[甲]]");
    }

    #[test]
    fn apply_writes_reviewed_page() {
        let tmp = tempfile::tempdir().unwrap();
        let s = session(tmp.path());
        let title = s.config.contribution_title("用户甲");
        s.store.write(&title, PAGE, "").unwrap();

        let (items, _) = pending_items(&s).unwrap();
        let batch = ReviewBatch {
            title: title.clone(),
            items: vec![UpdateInstruction::for_record(&items[0].record)
                .with_status("pass")
                .with_score("3.5")],
            summary: None,
        };
        let path = tmp.path().join("batch.json");
        fs::write(&path, serde_json::to_string(&vec![batch]).unwrap()).unwrap();
        apply(&s, &path).unwrap();

        let text = s.store.read(&title).unwrap();
        assert!(text.contains("{{2026SFEditasonStatus|pass|3.5}}"));
        assert!(text.contains("已提交条目数：'''2'''目前得分：'''5.5'''"));
        assert!(pending_items(&s).unwrap().0.is_empty());
    }

    #[test]
    fn apply_survives_missing_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let s = session(tmp.path());
        let path = tmp.path().join("batch.json");
        fs::write(&path, r#"[{"title":"不存在","items":[]}]"#).unwrap();
        assert!(apply(&s, &path).is_ok());
    }

    #[test]
    fn submit_appends_and_recounts() {
        let tmp = tempfile::tempdir().unwrap();
        let s = session(tmp.path());
        let title = s.config.contribution_title("用户甲");
        s.store.write(&title, PAGE, "").unwrap();

        submit(&s, &title, "|-\n| [[丙]] || {{2026SFEditasonStatus|pass|1}}").unwrap();
        let text = s.store.read(&title).unwrap();
        assert!(text.contains("[[丙]] || {{2026SFEditasonStatus|pass|1}}\n<noinclude>\n|}"));
        assert!(text.contains("已提交条目数：'''3'''目前得分：'''3'''"));
    }
}
