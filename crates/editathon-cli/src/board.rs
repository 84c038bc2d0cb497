//! Leaderboard and participant report commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use tracing::{debug, info, warn};

use editathon_core::config::DEFAULT_LEADERBOARD_SUMMARY;
use editathon_core::{Participant, RosterStats, extract_usernames, render_leaderboard};
use editathon_store::{JsonUserDirectory, PageStore, StoreError, UserDirectory};

use crate::Session;

/// Build participants for `names`, reading each one's contribution page.
/// A missing page means no entries yet.
fn participants(
    session: &Session,
    users: &impl UserDirectory,
    names: &[String],
) -> Result<Vec<Participant>> {
    let infos = users.lookup(names)?;
    let mut out = Vec::with_capacity(infos.len());
    for info in &infos {
        let participant = Participant::from_user(info, &session.config);
        let participant = match session.store.read(&participant.page_title) {
            Ok(text) => {
                let outcome = session.syntax.parse(&text);
                participant.with_ledger(&outcome)
            }
            Err(StoreError::PageNotFound(title)) => {
                debug!(title = %title, "no contribution page yet");
                participant
            }
            Err(e) => {
                warn!(user = %info.name, error = %e, "failed to read contribution page");
                participant
            }
        };
        out.push(participant);
    }
    Ok(out)
}

/// Users who own a contribution page.
fn page_owners(session: &Session) -> Result<Vec<String>> {
    let titles = session
        .store
        .list(&session.config.page_prefix)
        .context("failed to list contribution pages")?;
    Ok(titles
        .iter()
        .filter_map(|t| session.config.username_from_title(t))
        .map(str::to_string)
        .collect())
}

pub fn leaderboard(session: &Session, users_path: &Path) -> Result<()> {
    let users = JsonUserDirectory::from_path(users_path)
        .with_context(|| format!("failed to load users from {}", users_path.display()))?;
    let names = page_owners(session)?;
    let participants = participants(session, &users, &names)?;

    let title = &session.config.leaderboard_title;
    let content = session
        .store
        .read(title)
        .with_context(|| format!("failed to read {title}"))?;
    let updated = render_leaderboard(&content, &participants, Utc::now());
    if updated == content {
        info!(title = %title, "leaderboard unchanged");
        return Ok(());
    }
    session
        .store
        .write(title, &updated, DEFAULT_LEADERBOARD_SUMMARY)
        .with_context(|| format!("failed to save {title}"))?;

    let veterans = participants.iter().filter(|p| p.is_veteran).count();
    info!(
        participants = participants.len(),
        veterans,
        newcomers = participants.len() - veterans,
        "leaderboard updated"
    );
    Ok(())
}

pub fn report(
    session: &Session,
    users_path: &Path,
    signup: Option<&str>,
    out: &Path,
) -> Result<()> {
    let users = JsonUserDirectory::from_path(users_path)
        .with_context(|| format!("failed to load users from {}", users_path.display()))?;
    let signup = signup.unwrap_or(session.config.signup_title.as_str());
    let text = session
        .store
        .read(signup)
        .with_context(|| format!("failed to read sign-up page {signup}"))?;
    let names = extract_usernames(&text);
    info!(signup, users = names.len(), "found participants");

    let participants = participants(session, &users, &names)?;
    let stats = RosterStats::collect(&participants, Utc::now().year());
    fs::write(out, stats.to_markdown(&session.config.event_name))
        .with_context(|| format!("failed to write {}", out.display()))?;
    info!(path = %out.display(), "report saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use editathon_core::{EventConfig, UserInfo};
    use editathon_store::DirPageStore;

    const BOARD: &str = "\
{{center|（以下排行约每小时更新一次）}}
{{FakeH3|编者总榜}}
{| class=\"sf-table\"
! style=\"width: 20%; text-align:center\" | 贡献详情页
|-
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
|}";

    fn ledger(scores: &[&str]) -> String {
        let rows: String = scores
            .iter()
            .map(|s| format!("|-\n| [[条目]] || {{{{2026SFEditasonStatus|pass|{s}}}}}\n"))
            .collect();
        format!("{{| class=\"wikitable\"\n{rows}|}}")
    }

    fn setup(dir: &Path) -> (Session, std::path::PathBuf) {
        let config = EventConfig::default();
        let session = Session {
            store: DirPageStore::open(dir.join("pages")).unwrap(),
            syntax: editathon_core::AnnotationSyntax::new(&config.template).unwrap(),
            config,
        };
        let users = vec![
            UserInfo {
                edits_before_cutoff: Some(400),
                edit_count: 2000,
                ..UserInfo::unknown("老手")
            },
            UserInfo {
                edit_count: 30,
                ..UserInfo::unknown("新人")
            },
        ];
        let users_path = dir.join("users.json");
        fs::write(&users_path, serde_json::to_string(&users).unwrap()).unwrap();
        (session, users_path)
    }

    #[test]
    fn leaderboard_ranks_page_owners() {
        let tmp = tempfile::tempdir().unwrap();
        let (s, users) = setup(tmp.path());
        s.store.write(&s.config.leaderboard_title, BOARD, "").unwrap();
        s.store
            .write(&s.config.contribution_title("老手"), &ledger(&["2", "3"]), "")
            .unwrap();
        s.store
            .write(&s.config.contribution_title("新人"), &ledger(&["8"]), "")
            .unwrap();
        s.store
            .write(&s.config.contribution_title("路人"), &ledger(&[]), "")
            .unwrap();

        leaderboard(&s, &users).unwrap();
        let board = s.store.read(&s.config.leaderboard_title).unwrap();
        assert!(board.contains("最近更新："));
        assert!(board.contains("| 1 || 🌱 [[User:新人|新人]] || 1 || 8 ||"));
        assert!(board.contains("| 2 || [[User:老手|老手]] || 2 || 5 ||"));
        assert!(board.contains("| 3 || 🌱 [[User:路人|路人]] || 0 || 0 ||"));
    }

    #[test]
    fn report_counts_signed_up_users() {
        let tmp = tempfile::tempdir().unwrap();
        let (s, users) = setup(tmp.path());
        s.store
            .write(
                &s.config.signup_title,
                "# [[User:老手|老手]]\n# [[用户:新人]]\n# [[User:老手]]",
                "",
            )
            .unwrap();
        let out = tmp.path().join("summary.md");

        report(&s, &users, None, &out).unwrap();
        let md = fs::read_to_string(&out).unwrap();
        assert!(md.starts_with("# 2026年春节编辑松 - 参与者统计报告\n总参与者数：2 人"));
        assert!(md.contains("| 熟练编者 | 1 |\n| 新星编者 | 1 |"));
        assert!(md.contains("| 1000-4999 | 1 |"));
    }
}
