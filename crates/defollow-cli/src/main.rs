mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "defollow",
    about = "Rate-limited unfollow automation driven by a CSV ledger and a WebDriver browser",
    version,
    propagate_version = true
)]
struct Cli {
    /// Data root (default: auto-detect from .defollow/ or .git/)
    #[arg(long, global = true, env = "DEFOLLOW_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the .defollow data directory with a default config
    Init,

    /// Open a browser to log into the platform and save the session cookies
    Login,

    /// Import a data-download JSON export into the ledger
    Import {
        /// Path to the following.json export
        following_json: PathBuf,
        /// Optional followers export, enables the follow-back comparison
        followers_json: Option<PathBuf>,
    },

    /// Unfollow accounts per the ledger, within the daily budget
    Unfollow {
        /// Preview the work queue without touching the browser or the ledger
        #[arg(long)]
        dry_run: bool,
        /// Only accounts that do not follow you back
        #[arg(long)]
        non_followers: bool,
        /// Only mutual follows not marked 'keep'
        #[arg(long)]
        mutual_not_keep: bool,
    },

    /// Show ledger statistics without opening a browser
    Status,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Login => cmd::login::run(&root),
        Commands::Import {
            following_json,
            followers_json,
        } => cmd::import::run(&root, &following_json, followers_json.as_deref(), cli.json),
        Commands::Unfollow {
            dry_run,
            non_followers,
            mutual_not_keep,
        } => cmd::unfollow::run(&root, dry_run, non_followers, mutual_not_keep, cli.json),
        Commands::Status => cmd::status::run(&root, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
