use crate::output::print_json;
use anyhow::Context;
use defollow_core::{import::import_data_download, io::ensure_dir, paths};
use std::path::Path;

pub fn run(
    root: &Path,
    following_json: &Path,
    followers_json: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    ensure_dir(&paths::defollow_dir(root)).context("failed to create the data directory")?;
    let ledger_path = paths::ledger_path(root);

    let summary = import_data_download(&ledger_path, following_json, followers_json)
        .with_context(|| format!("failed to import {}", following_json.display()))?;

    if json {
        print_json(&summary)?;
        return Ok(());
    }

    println!("Imported {} accounts you follow.", summary.following);
    if let Some(followers) = summary.followers {
        println!(
            "  Followers: {followers}  Mutual: {}  Don't follow back: {}",
            summary.mutual, summary.non_followers
        );
    }
    let counts = &summary.counts;
    println!("Ledger written to {}", ledger_path.display());
    println!(
        "  keep={}  unfollow={}  unfollowed={}  unmarked={}",
        counts.keep, counts.unfollow, counts.unfollowed, counts.unmarked
    );
    println!();
    println!("Next steps:");
    println!("  1. Open the ledger in a spreadsheet or text editor");
    println!("  2. Set status to 'keep' for accounts you want to keep following");
    println!("  3. Leave status blank (or set 'unfollow') for accounts to remove");
    println!("  4. defollow unfollow --dry-run   (preview)");
    println!("  5. defollow unfollow             (execute)");
    Ok(())
}
