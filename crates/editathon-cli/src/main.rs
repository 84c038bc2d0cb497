use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use editathon_core::config::{
    DEFAULT_LEADERBOARD_TITLE, DEFAULT_PAGE_PREFIX, DEFAULT_PAGE_SUFFIX, EventConfig,
};
use editathon_core::ledger::DEFAULT_TEMPLATE;
use editathon_core::AnnotationSyntax;
use editathon_store::DirPageStore;

mod board;
mod display;
mod review;

#[derive(Parser)]
#[command(name = "editathon", version, about = "Review and scoring tools for editathon contribution pages")]
struct Cli {
    /// Directory holding the wiki pages.
    #[arg(long, global = true, env = "EDITATHON_PAGES_DIR", default_value = "pages")]
    pages_dir: PathBuf,

    /// Status template name used in annotations.
    #[arg(long, global = true, env = "EDITATHON_TEMPLATE", default_value = DEFAULT_TEMPLATE)]
    template: String,

    /// Title prefix of contribution pages.
    #[arg(long, global = true, default_value = DEFAULT_PAGE_PREFIX)]
    page_prefix: String,

    /// Title suffix of contribution pages.
    #[arg(long, global = true, default_value = DEFAULT_PAGE_SUFFIX)]
    page_suffix: String,

    /// Title of the leaderboard page.
    #[arg(long, global = true, default_value = DEFAULT_LEADERBOARD_TITLE)]
    leaderboard: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect annotations awaiting review from every contribution page.
    Scan {
        /// Write the queue here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the parsed ledger of one page.
    Show {
        title: String,
    },
    /// Apply a JSON file of review batches.
    Apply {
        batch: PathBuf,
    },
    /// Refresh the header counters of one page from its ledger.
    Recount {
        title: String,
    },
    /// Append a wikitext fragment to a page's insertion zone.
    Submit {
        title: String,
        fragment: String,
    },
    /// Rebuild the leaderboard tables.
    Leaderboard {
        /// JSON array of user metadata.
        #[arg(long)]
        users: PathBuf,
    },
    /// Write the participant statistics report.
    Report {
        /// JSON array of user metadata.
        #[arg(long)]
        users: PathBuf,
        /// Sign-up page listing the participants.
        #[arg(long)]
        signup: Option<String>,
        /// Markdown output file.
        #[arg(long, env = "GITHUB_STEP_SUMMARY", default_value = "summary.md")]
        out: PathBuf,
    },
}

/// Everything a command needs: the page store and the event settings.
pub struct Session {
    pub store: DirPageStore,
    pub config: EventConfig,
    pub syntax: AnnotationSyntax,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self> {
        let config = EventConfig {
            template: cli.template.clone(),
            page_prefix: cli.page_prefix.clone(),
            page_suffix: cli.page_suffix.clone(),
            leaderboard_title: cli.leaderboard.clone(),
            ..EventConfig::default()
        };
        let syntax = AnnotationSyntax::new(&config.template)
            .with_context(|| format!("invalid template name {:?}", config.template))?;
        let store = DirPageStore::open(&cli.pages_dir)
            .with_context(|| format!("failed to open page store at {}", cli.pages_dir.display()))?;
        Ok(Self {
            store,
            config,
            syntax,
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("editathon v{}", env!("CARGO_PKG_VERSION"));
    let session = Session::open(&cli)?;

    match cli.command {
        Commands::Scan { out } => review::scan(&session, out.as_deref()),
        Commands::Show { title } => review::show(&session, &title),
        Commands::Apply { batch } => review::apply(&session, &batch),
        Commands::Recount { title } => review::recount(&session, &title),
        Commands::Submit { title, fragment } => review::submit(&session, &title, &fragment),
        Commands::Leaderboard { users } => board::leaderboard(&session, &users),
        Commands::Report {
            users,
            signup,
            out,
        } => board::report(&session, &users, signup.as_deref(), &out),
    }
}
