use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const DEFOLLOW_DIR: &str = ".defollow";
pub const LEDGER_FILE: &str = ".defollow/ledger.csv";
pub const CONFIG_FILE: &str = ".defollow/config.yaml";
pub const COOKIES_FILE: &str = ".defollow/cookies.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn defollow_dir(root: &Path) -> PathBuf {
    root.join(DEFOLLOW_DIR)
}

pub fn ledger_path(root: &Path) -> PathBuf {
    root.join(LEDGER_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn cookies_path(root: &Path) -> PathBuf {
    root.join(COOKIES_FILE)
}
