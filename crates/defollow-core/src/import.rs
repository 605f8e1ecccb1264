use crate::error::{DefollowError, Result};
use crate::ledger::{Ledger, LedgerRow, StatusCounts};
use crate::types::{FollowsYou, Status};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;

// ---------------------------------------------------------------------------
// ImportSummary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub following: usize,
    pub followers: Option<usize>,
    pub mutual: usize,
    pub non_followers: usize,
    pub counts: StatusCounts,
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Import the platform's data-download JSON into the ledger.
///
/// Re-imports merge: rows already in the ledger keep their status and date
/// (manual `keep`/`unfollow` marks survive), only `follows_you` is refreshed.
/// Rows already marked `unfollowed` are retained even when the account no
/// longer appears in the export.
pub fn import_data_download(
    ledger_path: &Path,
    following_json: &Path,
    followers_json: Option<&Path>,
) -> Result<ImportSummary> {
    let following = read_username_list(following_json, "relationships_following")?;
    if following.is_empty() {
        return Err(DefollowError::ImportFormat(format!(
            "no usernames found in {}",
            following_json.display()
        )));
    }

    let followers = match followers_json {
        Some(path) if path.exists() => {
            Some(read_username_list(path, "relationships_followers")?)
        }
        Some(path) => {
            tracing::warn!(path = %path.display(),
                "followers file not found, continuing without follow-back comparison");
            None
        }
        None => None,
    };

    // The export may omit followers entirely; an empty set carries no signal
    // either way, so follow-back state stays unknown. Usernames compare
    // case-insensitively.
    let compare: Option<HashSet<String>> = followers
        .as_ref()
        .filter(|set| !set.is_empty())
        .map(|set| set.iter().map(|u| u.to_lowercase()).collect());
    let compare = compare.as_ref();

    let mut existing: HashMap<String, LedgerRow> = match Ledger::load(ledger_path) {
        Ok(ledger) => ledger
            .rows
            .into_iter()
            .map(|row| (row.username.to_lowercase(), row))
            .collect(),
        Err(DefollowError::NotImported) => HashMap::new(),
        Err(err) => return Err(err),
    };

    let mut rows = Vec::with_capacity(following.len());
    for username in &following {
        let follows_you = match compare {
            Some(followers) => {
                if followers.contains(&username.to_lowercase()) {
                    FollowsYou::Yes
                } else {
                    FollowsYou::No
                }
            }
            None => FollowsYou::Unknown,
        };
        match existing.remove(&username.to_lowercase()) {
            Some(mut row) => {
                row.follows_you = follows_you;
                rows.push(row);
            }
            None => {
                let mut row = LedgerRow::new(username.clone());
                row.follows_you = follows_you;
                rows.push(row);
            }
        }
    }

    // Accounts already unfollowed drop out of the export; keep their history.
    for (_, row) in existing {
        if row.status == Status::Unfollowed {
            rows.push(row);
        }
    }

    rows.sort_by_key(|row| row.username.to_lowercase());

    let ledger = Ledger::new(rows);
    ledger.validate()?;
    ledger.save(ledger_path)?;

    let (mutual, non_followers) = match compare {
        Some(followers) => {
            let mutual = following
                .iter()
                .filter(|u| followers.contains(&u.to_lowercase()))
                .count();
            (mutual, following.len() - mutual)
        }
        None => (0, 0),
    };

    Ok(ImportSummary {
        following: following.len(),
        followers: followers.as_ref().map(|set| set.len()),
        mutual,
        non_followers,
        counts: ledger.status_counts(),
    })
}

// ---------------------------------------------------------------------------
// JSON extraction
// ---------------------------------------------------------------------------

/// Read an export file and collect the usernames it lists. The export ships
/// in a few shapes depending on version: an object keyed by `list_key`, a
/// bare array, or an object whose first array-valued key holds the entries.
fn read_username_list(path: &Path, list_key: &str) -> Result<HashSet<String>> {
    let data = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&data)?;

    let entries = match &value {
        Value::Array(entries) => entries.as_slice(),
        Value::Object(map) => match map.get(list_key).and_then(Value::as_array) {
            Some(entries) => entries.as_slice(),
            None => map
                .values()
                .find_map(Value::as_array)
                .map(|entries| entries.as_slice())
                .ok_or_else(|| {
                    DefollowError::ImportFormat(format!(
                        "expected '{list_key}' or a list in {}, found keys: {:?}",
                        path.display(),
                        map.keys().collect::<Vec<_>>()
                    ))
                })?,
        },
        _ => {
            return Err(DefollowError::ImportFormat(format!(
                "expected an object or a list in {}",
                path.display()
            )))
        }
    };

    Ok(entries.iter().filter_map(extract_username).collect())
}

/// Pull a username out of one export entry. Entries vary: following lists
/// put it in `title`, follower lists in `string_list_data[0].value`, and as
/// a last resort it is the tail of the profile `href`.
fn extract_username(entry: &Value) -> Option<String> {
    if let Some(title) = entry.get("title").and_then(Value::as_str) {
        let title = title.trim();
        if !title.is_empty() {
            return Some(title.to_string());
        }
    }
    let first = entry.get("string_list_data")?.get(0)?;
    if let Some(value) = first.get("value").and_then(Value::as_str) {
        return Some(value.to_string());
    }
    let href = first.get("href")?.as_str()?;
    let tail = href.trim_end_matches('/').rsplit('/').next()?;
    if tail.is_empty() {
        None
    } else {
        Some(tail.to_string())
    }
}
