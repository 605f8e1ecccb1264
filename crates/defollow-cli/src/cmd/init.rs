use crate::output::print_json;
use anyhow::Context;
use defollow_core::{config::Config, io::ensure_dir, paths};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    ensure_dir(&paths::defollow_dir(root)).context("failed to create the data directory")?;
    let config_created = Config::write_default(root).context("failed to write config")?;

    if json {
        print_json(&serde_json::json!({
            "root": root.display().to_string(),
            "config_created": config_created,
        }))?;
        return Ok(());
    }

    println!("Initialized {}", paths::defollow_dir(root).display());
    if config_created {
        println!("Wrote default config: {}", paths::config_path(root).display());
    } else {
        println!("Config already exists: {}", paths::config_path(root).display());
    }
    println!("Next: defollow import <following.json> [followers.json]");
    Ok(())
}
