pub mod config;
pub mod leaderboard;
pub mod ledger;
pub mod page;
pub mod review;
pub mod roster;

pub use config::EventConfig;
pub use leaderboard::{refresh_timestamp, render_leaderboard, replace_table_section};
pub use ledger::{
    AnnotationRecord, AnnotationSyntax, ParseOutcome, SyntaxError, UpdateInstruction, parse,
    rewrite,
};
pub use page::{append_to_insertion_zone, update_header_counts};
pub use review::{ReviewBatch, ReviewItem, ReviewedPage, apply_review, collect_pending, recount};
pub use roster::{Participant, RosterStats, UserInfo, extract_usernames};
