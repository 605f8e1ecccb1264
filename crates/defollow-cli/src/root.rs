use std::path::{Path, PathBuf};

/// Resolve the data root directory: the explicit `--root` flag or
/// `DEFOLLOW_ROOT` env var wins, otherwise walk upward from the working
/// directory for a `.defollow/` marker, then a `.git/` marker, then fall
/// back to the working directory itself.
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    ancestor_with(&cwd, ".defollow")
        .or_else(|| ancestor_with(&cwd, ".git"))
        .unwrap_or(cwd)
}

fn ancestor_with(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_root(Some(dir.path())), dir.path());
    }

    #[test]
    fn ancestor_walk_finds_the_marker_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".defollow")).unwrap();
        let deep = dir.path().join("a/b");
        std::fs::create_dir_all(&deep).unwrap();
        assert_eq!(ancestor_with(&deep, ".defollow"), Some(dir.path().to_path_buf()));
        assert_eq!(ancestor_with(&deep, ".nothere"), None);
    }
}
