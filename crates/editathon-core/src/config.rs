//! Event configuration shared by the store and the CLI.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::DEFAULT_TEMPLATE;

pub const DEFAULT_EVENT_NAME: &str = "2026年春节编辑松";
pub const DEFAULT_PAGE_PREFIX: &str = "Qiuwen:2026年春节编辑松/提交/";
pub const DEFAULT_PAGE_SUFFIX: &str = "的贡献";
pub const DEFAULT_LEADERBOARD_TITLE: &str = "Qiuwen:2026年春节编辑松/提交";
pub const DEFAULT_SIGNUP_TITLE: &str = "Qiuwen:2026年春节编辑松/报名/名单";
pub const DEFAULT_REVIEW_SUMMARY: &str = "快速审核（2026年春节编辑松小工具）";
pub const DEFAULT_LEADERBOARD_SUMMARY: &str = "更新排行榜";

/// Edits needed before the cutoff to count as a veteran editor.
pub const VETERAN_MIN_EDITS: u64 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub event_name: String,
    /// Status template name inside annotation tokens.
    pub template: String,
    /// Contribution pages are titled `<page_prefix><user><page_suffix>`.
    pub page_prefix: String,
    pub page_suffix: String,
    pub leaderboard_title: String,
    pub signup_title: String,
    pub review_summary: String,
    pub veteran_min_edits: u64,
    /// Only edits made before this instant count towards veteran status.
    pub veteran_cutoff: DateTime<Utc>,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            event_name: DEFAULT_EVENT_NAME.to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            page_prefix: DEFAULT_PAGE_PREFIX.to_string(),
            page_suffix: DEFAULT_PAGE_SUFFIX.to_string(),
            leaderboard_title: DEFAULT_LEADERBOARD_TITLE.to_string(),
            signup_title: DEFAULT_SIGNUP_TITLE.to_string(),
            review_summary: DEFAULT_REVIEW_SUMMARY.to_string(),
            veteran_min_edits: VETERAN_MIN_EDITS,
            veteran_cutoff: Utc
                .with_ymd_and_hms(2026, 2, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
        }
    }
}

impl EventConfig {
    /// Title of `user`'s contribution page.
    pub fn contribution_title(&self, user: &str) -> String {
        format!("{}{user}{}", self.page_prefix, self.page_suffix)
    }

    /// Recover the user name from a contribution page title.
    pub fn username_from_title<'t>(&self, title: &'t str) -> Option<&'t str> {
        title
            .strip_prefix(self.page_prefix.as_str())?
            .strip_suffix(self.page_suffix.as_str())
            .filter(|user| !user.is_empty())
    }
}
