use crate::output::print_json;
use anyhow::Context;
use defollow_core::{ledger::Ledger, paths};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let ledger_path = paths::ledger_path(root);
    let ledger = Ledger::load(&ledger_path).context("failed to load ledger")?;
    let counts = ledger.status_counts();

    if json {
        print_json(&counts)?;
        return Ok(());
    }

    println!("Ledger: {}", ledger_path.display());
    println!("  Total rows:  {}", counts.total);
    println!("  keep:        {}", counts.keep);
    println!("  unfollow:    {}", counts.unfollow);
    println!("  unfollowed:  {}", counts.unfollowed);
    println!("  skipped:     {}", counts.skipped);
    println!("  unmarked:    {}", counts.unmarked);
    if counts.unfollowed > 0 || counts.skipped > 0 {
        println!("  still following: {}", counts.still_following());
    }
    Ok(())
}
