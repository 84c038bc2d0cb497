//! Participants: sign-up extraction, veteran classification, and the summary report.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::EventConfig;
use crate::ledger::ParseOutcome;

static USER_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\[\[(?:User|U|User talk|UT|特殊:用户贡献|特殊:用户页|User_talk|用户):([^\]|#<]+)(?:[^\[\]]*?)\]\]",
    )
    .expect("invalid user link pattern")
});

/// User groups reported in the summary, with their display names.
pub const KNOWN_GROUPS: &[(&str, &str)] = &[
    ("confirmed", "确认用户"),
    ("autoconfirmed", "自动确认用户"),
    ("transwiki", "导入者"),
    ("autoreviewer", "巡查豁免者"),
    ("templateeditor", "模板编辑员"),
    ("patroller", "巡查员"),
    ("interface-admin", "界面管理员"),
    ("sysop", "管理员"),
    ("senioreditor", "资深编者"),
    ("suppress", "监督员"),
    ("steward", "裁决委员"),
];

/// Edit-count buckets as `(label, lower bound)`; each runs up to the next bound.
pub const EDIT_COUNT_BUCKETS: &[(&str, u64)] = &[
    ("0-99", 0),
    ("100-499", 100),
    ("500-999", 500),
    ("1000-4999", 1000),
    ("5000-9999", 5000),
    ("10000+", 10_000),
];

/// Registration years reported individually; older ones are grouped.
const REGISTRATION_YEARS: i32 = 4;

/// Account metadata from the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    #[serde(default)]
    pub edit_count: u64,
    #[serde(default)]
    pub registration: Option<DateTime<Utc>>,
    #[serde(default)]
    pub groups: Vec<String>,
    /// Edits made before the veteran cutoff, if known.
    #[serde(default)]
    pub edits_before_cutoff: Option<u64>,
    /// Instant `edits_before_cutoff` was counted up to. `None` means the
    /// configured cutoff.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counted_until: Option<DateTime<Utc>>,
}

impl UserInfo {
    /// A user with no known history.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            edit_count: 0,
            registration: None,
            groups: Vec::new(),
            edits_before_cutoff: None,
            counted_until: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub username: String,
    pub edit_count: u64,
    pub registration: Option<DateTime<Utc>>,
    pub groups: Vec<String>,
    pub entry_count: usize,
    pub total_score: f64,
    pub is_veteran: bool,
    pub page_title: String,
}

impl Participant {
    /// Build a participant from directory metadata. Ledger figures start at
    /// zero until [`with_ledger`](Self::with_ledger) is applied.
    pub fn from_user(info: &UserInfo, config: &EventConfig) -> Self {
        Self {
            username: info.name.clone(),
            edit_count: info.edit_count,
            registration: info.registration,
            groups: info.groups.clone(),
            entry_count: 0,
            total_score: 0.0,
            is_veteran: is_veteran(info, config),
            page_title: config.contribution_title(&info.name),
        }
    }

    pub fn with_ledger(mut self, outcome: &ParseOutcome) -> Self {
        self.entry_count = outcome.entry_count;
        self.total_score = crate::ledger::format_score(outcome.total_score);
        self
    }

    pub fn registration_year(&self) -> Option<i32> {
        self.registration.map(|r| r.year())
    }
}

/// Veterans made at least `veteran_min_edits` edits before the cutoff. Users
/// whose history is unknown count as newcomers.
///
/// A count taken up to an earlier instant is a lower bound and still
/// qualifies; one taken past the cutoff may include later edits and does not.
pub fn is_veteran(info: &UserInfo, config: &EventConfig) -> bool {
    let counted_in_time = info
        .counted_until
        .is_none_or(|until| until <= config.veteran_cutoff);
    counted_in_time
        && info
            .edits_before_cutoff
            .is_some_and(|n| n >= config.veteran_min_edits)
}

/// User names linked from a sign-up page, de-duplicated and sorted.
pub fn extract_usernames(wikitext: &str) -> Vec<String> {
    USER_LINK
        .captures_iter(wikitext)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Aggregate statistics over all participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterStats {
    pub total: usize,
    /// `(display name, members)` for known groups with at least one member.
    pub groups: Vec<(&'static str, usize)>,
    pub edit_counts: Vec<(&'static str, usize)>,
    /// `(year, registrations)` for the most recent years, newest first.
    pub registration_years: Vec<(i32, usize)>,
    /// Registrations in or before `oldest_reported_year - 1`.
    pub registered_earlier: usize,
    pub veterans: usize,
    pub newcomers: usize,
}

impl RosterStats {
    pub fn collect(participants: &[Participant], current_year: i32) -> Self {
        let groups = KNOWN_GROUPS
            .iter()
            .map(|(key, label)| {
                let members = participants
                    .iter()
                    .filter(|p| p.groups.iter().any(|g| g == key))
                    .count();
                (*label, members)
            })
            .filter(|(_, members)| *members > 0)
            .collect();

        let edit_counts = EDIT_COUNT_BUCKETS
            .iter()
            .map(|(label, _)| {
                let members = participants
                    .iter()
                    .filter(|p| edit_bucket(p.edit_count) == *label)
                    .count();
                (*label, members)
            })
            .collect();

        let oldest = current_year - (REGISTRATION_YEARS - 1);
        let registration_years = (oldest..=current_year)
            .rev()
            .map(|year| {
                let members = participants
                    .iter()
                    .filter(|p| p.registration_year() == Some(year))
                    .count();
                (year, members)
            })
            .collect();
        let registered_earlier = participants
            .iter()
            .filter(|p| p.registration_year().is_some_and(|y| y < oldest))
            .count();

        let veterans = participants.iter().filter(|p| p.is_veteran).count();

        Self {
            total: participants.len(),
            groups,
            edit_counts,
            registration_years,
            registered_earlier,
            veterans,
            newcomers: participants.len() - veterans,
        }
    }

    /// Render the participant report as Markdown.
    pub fn to_markdown(&self, title: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {title} - 参与者统计报告");
        let _ = writeln!(out, "总参与者数：{} 人", self.total);

        out.push_str("\n按用户组统计：\n| 用户组 | 成员数 |\n| --- | --- |\n");
        for (label, members) in &self.groups {
            let _ = writeln!(out, "| {label} | {members} |");
        }

        out.push_str("\n按编辑次数统计：\n| 编辑次数区间 | 人数 |\n| --- | --- |\n");
        for (label, members) in &self.edit_counts {
            let _ = writeln!(out, "| {label} | {members} |");
        }

        out.push_str("\n按注册时间统计：\n| 注册时间 | 人数 |\n| --- | --- |\n");
        for (year, members) in &self.registration_years {
            let _ = writeln!(out, "| {year}年注册 | {members} |");
        }
        if let Some((oldest, _)) = self.registration_years.last() {
            let _ = writeln!(
                out,
                "| {}年及以前注册 | {} |",
                oldest - 1,
                self.registered_earlier
            );
        }

        out.push_str("\n按资历分类：\n| 类别 | 人数 |\n| --- | --- |\n");
        let _ = writeln!(out, "| 熟练编者 | {} |", self.veterans);
        let _ = writeln!(out, "| 新星编者 | {} |", self.newcomers);
        out
    }
}

fn edit_bucket(edit_count: u64) -> &'static str {
    EDIT_COUNT_BUCKETS
        .iter()
        .rev()
        .find(|(_, lower)| edit_count >= *lower)
        .map_or("0-99", |(label, _)| label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(name: &str, edits: u64, year: i32, groups: &[&str], before: Option<u64>) -> UserInfo {
        UserInfo {
            name: name.into(),
            edit_count: edits,
            registration: Utc.with_ymd_and_hms(year, 3, 1, 0, 0, 0).single(),
            groups: groups.iter().map(|g| g.to_string()).collect(),
            edits_before_cutoff: before,
            counted_until: None,
        }
    }

    fn participants() -> Vec<Participant> {
        let config = EventConfig::default();
        [
            user("甲", 42, 2026, &["autoconfirmed"], Some(3)),
            user("乙", 650, 2024, &["autoconfirmed", "confirmed", "patroller"], Some(55)),
            user("丙", 12_000, 2019, &["sysop", "autoconfirmed"], Some(50)),
            user("丁", 100, 2023, &[], None),
        ]
        .iter()
        .map(|u| Participant::from_user(u, &config))
        .collect()
    }

    #[test]
    fn extracts_linked_usernames() {
        let text = "\
# [[User:LH44|LH44]]（签名）
# [[用户:冬梦雨]] [[User talk:冬梦雨|讨论]]
# [[u:Nice Nature]] [[特殊:用户贡献/ignored]]
# [[User_talk: Yui ]]
# [[Help:Not a user]]";
        assert_eq!(
            extract_usernames(text),
            vec!["LH44", "Nice Nature", "Yui", "冬梦雨"]
        );
    }

    #[test]
    fn unknown_user_is_a_newcomer() {
        let info = UserInfo::unknown("无名");
        assert_eq!(info.edit_count, 0);
        assert!(!is_veteran(&info, &EventConfig::default()));
    }

    #[test]
    fn veteran_needs_threshold_before_cutoff() {
        let config = EventConfig::default();
        assert!(is_veteran(&user("a", 10, 2020, &[], Some(50)), &config));
        assert!(!is_veteran(&user("b", 900, 2020, &[], Some(49)), &config));
        assert!(!is_veteran(&user("c", 900, 2020, &[], None), &config));
    }

    #[test]
    fn counts_past_the_cutoff_do_not_qualify() {
        let config = EventConfig::default();
        let at = |y, m, d| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single();
        let counted = |until| UserInfo {
            counted_until: until,
            ..user("a", 900, 2020, &[], Some(80))
        };
        assert!(is_veteran(&counted(at(2026, 2, 1)), &config));
        assert!(is_veteran(&counted(at(2025, 12, 31)), &config));
        assert!(!is_veteran(&counted(at(2026, 3, 1)), &config));

        let later = EventConfig {
            veteran_cutoff: at(2026, 4, 1).unwrap(),
            ..EventConfig::default()
        };
        assert!(is_veteran(&counted(at(2026, 3, 1)), &later));
    }

    #[test]
    fn participant_page_title_and_ledger() {
        let config = EventConfig::default();
        let outcome = ParseOutcome {
            entry_count: 2,
            total_score: 16.300000000000001,
            items: Vec::new(),
        };
        let p = Participant::from_user(&user("甲", 1, 2026, &[], None), &config)
            .with_ledger(&outcome);
        assert_eq!(p.page_title, "Qiuwen:2026年春节编辑松/提交/甲的贡献");
        assert_eq!(p.entry_count, 2);
        assert_eq!(p.total_score, 16.3);
    }

    #[test]
    fn stats_buckets() {
        let stats = RosterStats::collect(&participants(), 2026);
        assert_eq!(stats.total, 4);
        assert_eq!(
            stats.groups,
            vec![("确认用户", 1), ("自动确认用户", 3), ("巡查员", 1), ("管理员", 1)]
        );
        assert_eq!(
            stats.edit_counts,
            vec![
                ("0-99", 1),
                ("100-499", 1),
                ("500-999", 1),
                ("1000-4999", 0),
                ("5000-9999", 0),
                ("10000+", 1)
            ]
        );
        assert_eq!(
            stats.registration_years,
            vec![(2026, 1), (2025, 0), (2024, 1), (2023, 1)]
        );
        assert_eq!(stats.registered_earlier, 1);
        assert_eq!((stats.veterans, stats.newcomers), (2, 2));
    }

    #[test]
    fn markdown_report_sections() {
        let md = RosterStats::collect(&participants(), 2026).to_markdown("2026年春节编辑松");
        assert!(md.starts_with("# 2026年春节编辑松 - 参与者统计报告\n总参与者数：4 人\n"));
        assert!(md.contains("| 管理员 | 1 |"));
        assert!(md.contains("| 10000+ | 1 |"));
        assert!(md.contains("| 2022年及以前注册 | 1 |"));
        assert!(md.contains("| 熟练编者 | 2 |\n| 新星编者 | 2 |\n"));
    }
}
