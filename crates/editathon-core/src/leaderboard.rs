//! Leaderboard page maintenance: ranking, row rendering, the update
//! timestamp and table-body replacement.

use std::cmp::Ordering;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use crate::roster::Participant;

pub const SECTION_OVERALL: &str = "编者总榜";
pub const SECTION_VETERANS: &str = "熟练编者排行榜";
pub const SECTION_NEWCOMERS: &str = "新星编者排行榜";

const TIMESTAMP_ANCHOR: &str = "{{center|（以下排行约每小时更新一次）}}";
/// Existing timestamps further than this from the anchor line are ignored.
const TIMESTAMP_SEARCH_CHARS: usize = 100;
const HEADER_ANCHOR: &str = "贡献详情页";
const EMPTY_ROWS: &str = "|- \n| colspan=\"5\" style=\"text-align: center;\" | 暂无数据\n";
const NEWCOMER_MARK: &str = "🌱 ";

static TIMESTAMP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{center\|（最近更新：.*?）\}\}").expect("invalid timestamp pattern")
});

// ── Ranking ──

/// Higher score first, then more entries.
fn by_standing(a: &Participant, b: &Participant) -> Ordering {
    b.total_score
        .total_cmp(&a.total_score)
        .then_with(|| b.entry_count.cmp(&a.entry_count))
}

/// Sort participants into leaderboard order. Ties keep their input order.
pub fn rank<'a, I>(participants: I) -> Vec<&'a Participant>
where
    I: IntoIterator<Item = &'a Participant>,
{
    let mut ranked: Vec<&Participant> = participants.into_iter().collect();
    ranked.sort_by(|a, b| by_standing(a, b));
    ranked
}

/// Render ranked participants as table rows. With `mark_newcomers`,
/// non-veterans get a seedling prefix.
pub fn render_rows(ranked: &[&Participant], mark_newcomers: bool) -> String {
    if ranked.is_empty() {
        return EMPTY_ROWS.to_string();
    }
    ranked
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let mark = if mark_newcomers && !p.is_veteran { NEWCOMER_MARK } else { "" };
            format!(
                "|-\n| {} || {mark}[[User:{user}|{user}]] || {} || {} || [[{}|查看页面]]",
                i + 1,
                p.entry_count,
                p.total_score,
                p.page_title,
                user = p.username,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Page edits ──

/// Format `now` in China Standard Time, e.g. `2026年02月17日 08:05:09 UTC+8`.
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    let local = now.naive_utc() + Duration::hours(8);
    format!("{} UTC+8", local.format("%Y年%m月%d日 %H:%M:%S"))
}

/// Put a `{{center|（最近更新：…）}}` line right after the update-frequency
/// notice, replacing a nearby existing one. No-op without the notice.
pub fn refresh_timestamp(content: &str, now: DateTime<Utc>) -> String {
    let Some(anchor) = content.find(TIMESTAMP_ANCHOR) else {
        return content.to_string();
    };
    let line = format!("{{{{center|（最近更新：{}）}}}}", format_timestamp(now));
    let after_anchor = anchor + TIMESTAMP_ANCHOR.len();

    let Some(newline) = content[after_anchor..].find('\n') else {
        // Notice is the last line.
        return format!("{content}\n{line}");
    };
    let next_line = after_anchor + newline + 1;
    let rest = &content[next_line..];

    if let Some(existing) = TIMESTAMP_LINE.find(rest)
        && rest[..existing.start()].chars().count() < TIMESTAMP_SEARCH_CHARS
    {
        let start = next_line + existing.start();
        let end = next_line + existing.end();
        return [&content[..start], &line, &content[end..]].concat();
    }
    [&content[..next_line], &line, "\n", rest].concat()
}

/// Replace the body rows of the table that follows `section`, keeping its
/// header up to the first `|-` after the `贡献详情页` column.
///
/// No-op when the section, the table, its close or the header anchor is missing.
pub fn replace_table_section(content: &str, section: &str, rows: &str) -> String {
    let Some(body) = table_body(content, section) else {
        return content.to_string();
    };
    [&content[..body.start], rows, "\n", &content[body.end..]].concat()
}

fn table_body(content: &str, section: &str) -> Option<std::ops::Range<usize>> {
    let section_at = content.find(section)?;
    let table_start = section_at + content[section_at..].find("{|")?;
    let table_end = table_start + content[table_start..].find("|}")?;
    let table = &content[table_start..table_end];
    let header = table.find(HEADER_ANCHOR)?;
    let split = header + table[header..].find("|-")?;
    Some(table_start + split..table_end)
}

/// Rebuild the overall, veteran and newcomer boards and refresh the timestamp.
pub fn render_leaderboard(content: &str, participants: &[Participant], now: DateTime<Utc>) -> String {
    let overall = rank(participants);
    let veterans = rank(participants.iter().filter(|p| p.is_veteran));
    let newcomers = rank(participants.iter().filter(|p| !p.is_veteran));

    let content = refresh_timestamp(content, now);
    let content = replace_table_section(&content, SECTION_OVERALL, &render_rows(&overall, true));
    let content = replace_table_section(&content, SECTION_VETERANS, &render_rows(&veterans, false));
    replace_table_section(&content, SECTION_NEWCOMERS, &render_rows(&newcomers, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn participant(name: &str, entries: usize, score: f64, veteran: bool) -> Participant {
        Participant {
            username: name.into(),
            edit_count: 0,
            registration: None,
            groups: Vec::new(),
            entry_count: entries,
            total_score: score,
            is_veteran: veteran,
            page_title: format!("P/{name}"),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 16, 20, 5, 9).single().unwrap()
    }

    const BOARD: &str = "\
{{center|（以下排行约每小时更新一次）}}
{{FakeH3|编者总榜}}
{| class=\"sf-table\"
! 排名 !! 贡献者 !! 已提交条数 !! 目前得分
! style=\"width: 20%; text-align:center\" | 贡献详情页
|-
| 1 || old || 0 || 0 || x
|}
{{FakeH3|熟练编者排行榜}}
{| class=\"sf-table\"
! style=\"width: 20%; text-align:center\" | 贡献详情页
|-
|}
{{FakeH3|新星编者排行榜}}
{| class=\"sf-table\"
! style=\"width: 20%; text-align:center\" | 贡献详情页
|-
| stale
|}";

    #[test]
    fn ranking_by_score_then_entries() {
        let people = vec![
            participant("a", 1, 5.0, true),
            participant("b", 3, 7.5, false),
            participant("c", 2, 5.0, false),
            participant("d", 1, 5.0, true),
        ];
        let names: Vec<&str> = rank(&people).iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn rows_with_newcomer_mark() {
        let people = vec![participant("a", 2, 16.3, true), participant("b", 1, 5.0, false)];
        let ranked = rank(&people);
        assert_eq!(
            render_rows(&ranked, true),
            "|-\n| 1 || [[User:a|a]] || 2 || 16.3 || [[P/a|查看页面]]\n\
             |-\n| 2 || 🌱 [[User:b|b]] || 1 || 5 || [[P/b|查看页面]]"
        );
        assert!(!render_rows(&ranked, false).contains(NEWCOMER_MARK));
    }

    #[test]
    fn empty_board_placeholder() {
        assert_eq!(render_rows(&[], true), EMPTY_ROWS);
    }

    #[test]
    fn timestamp_in_utc_plus_eight() {
        assert_eq!(format_timestamp(now()), "2026年02月17日 04:05:09 UTC+8");
    }

    #[test]
    fn timestamp_inserted_then_replaced() {
        let doc = "head\n{{center|（以下排行约每小时更新一次）}}\nbody";
        let once = refresh_timestamp(doc, now());
        assert_eq!(
            once,
            "head\n{{center|（以下排行约每小时更新一次）}}\n{{center|（最近更新：2026年02月17日 04:05:09 UTC+8）}}\nbody"
        );
        let later = now() + Duration::hours(1);
        let twice = refresh_timestamp(&once, later);
        assert_eq!(twice.matches("最近更新").count(), 1);
        assert!(twice.contains("05:05:09 UTC+8"));
    }

    #[test]
    fn distant_timestamp_is_not_reused() {
        let filler = "x".repeat(120);
        let doc = format!(
            "{{{{center|（以下排行约每小时更新一次）}}}}\n{filler}\n{{{{center|（最近更新：旧）}}}}"
        );
        let out = refresh_timestamp(&doc, now());
        assert_eq!(out.matches("最近更新").count(), 2);
        assert!(out.contains("旧"));
    }

    #[test]
    fn timestamp_anchor_on_last_line() {
        let out = refresh_timestamp("{{center|（以下排行约每小时更新一次）}}", now());
        assert!(out.ends_with("}}\n{{center|（最近更新：2026年02月17日 04:05:09 UTC+8）}}"));
        assert_eq!(refresh_timestamp("no anchor", now()), "no anchor");
    }

    #[test]
    fn section_body_is_replaced() {
        let out = replace_table_section(BOARD, SECTION_VETERANS, "|-\n| new");
        assert!(out.contains("贡献详情页\n|-\n| new\n|}\n{{FakeH3|新星编者排行榜}}"));
        assert!(out.contains("| 1 || old"));
        assert!(out.contains("| stale"));
    }

    #[test]
    fn missing_anchors_are_no_ops() {
        assert_eq!(replace_table_section(BOARD, "不存在", "x"), BOARD);
        let no_header = "编者总榜\n{|\n! 排名\n|-\n|}";
        assert_eq!(replace_table_section(no_header, SECTION_OVERALL, "x"), no_header);
    }

    #[test]
    fn full_board_refresh() {
        let people = vec![
            participant("老手", 2, 10.0, true),
            participant("新人", 3, 12.5, false),
        ];
        let out = render_leaderboard(BOARD, &people, now());
        assert!(out.contains("（最近更新：2026年02月17日 04:05:09 UTC+8）"));
        assert!(!out.contains("| 1 || old"));
        assert!(!out.contains("| stale"));
        assert!(out.contains("| 1 || 🌱 [[User:新人|新人]] || 3 || 12.5"));
        assert!(out.contains("| 2 || [[User:老手|老手]] || 2 || 10 ||"));
        assert!(out.contains("贡献详情页\n|-\n| 1 || [[User:老手|老手]]"));
        assert!(out.contains("贡献详情页\n|-\n| 1 || [[User:新人|新人]]"));
    }
}
