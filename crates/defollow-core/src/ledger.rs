use crate::error::{DefollowError, Result};
use crate::io::atomic_write;
use crate::types::{FollowsYou, Outcome, Status};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ---------------------------------------------------------------------------
// LedgerRow
// ---------------------------------------------------------------------------

/// One tracked account. Field order matches the CSV column order:
/// `username,user_id,full_name,follows_you,status,date_unfollowed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRow {
    pub username: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub follows_you: FollowsYou,
    #[serde(default)]
    pub status: Status,
    #[serde(default, with = "naive_date_time_opt")]
    pub date_unfollowed: Option<NaiveDateTime>,
}

impl LedgerRow {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            user_id: String::new(),
            full_name: String::new(),
            follows_you: FollowsYou::Unknown,
            status: Status::Unmarked,
            date_unfollowed: None,
        }
    }
}

mod naive_date_time_opt {
    use super::DATE_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format(DATE_FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Ok(None);
        }
        NaiveDateTime::parse_from_str(&s, DATE_FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// StatusCounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub keep: usize,
    pub unfollow: usize,
    pub unfollowed: usize,
    pub skipped: usize,
    pub unmarked: usize,
}

impl StatusCounts {
    /// Accounts the operator is still following, once anything has been
    /// processed at all.
    pub fn still_following(&self) -> usize {
        self.total - self.unfollowed - self.skipped
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The full in-memory ledger. Owned by the run controller for the duration
/// of a run; persisted in full after every row mutation.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub rows: Vec<LedgerRow>,
}

impl Ledger {
    pub fn new(rows: Vec<LedgerRow>) -> Self {
        Self { rows }
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn load(path: &Path) -> Result<Ledger> {
        if !path.exists() {
            return Err(DefollowError::NotImported);
        }
        let mut reader = csv::Reader::from_path(path)?;
        let mut rows = Vec::new();
        for record in reader.deserialize() {
            let row: LedgerRow = record?;
            rows.push(row);
        }
        let ledger = Ledger { rows };
        ledger.validate()?;
        Ok(ledger)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &self.rows {
            writer.serialize(row)?;
        }
        let data = writer
            .into_inner()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        atomic_write(path, &data)
    }

    /// Usernames must be non-empty and unique (case-insensitive, matching the
    /// platform's username semantics).
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (i, row) in self.rows.iter().enumerate() {
            if row.username.is_empty() {
                return Err(DefollowError::EmptyUsername(i + 1));
            }
            if !seen.insert(row.username.to_lowercase()) {
                return Err(DefollowError::DuplicateUsername(row.username.clone()));
            }
            if matches!(row.status, Status::Unfollowed | Status::Skipped)
                && row.date_unfollowed.is_none()
            {
                tracing::warn!(username = %row.username, status = %row.status,
                    "processed row is missing date_unfollowed");
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------

    /// Unfollows already performed on `today` — the consumed part of the
    /// daily budget. Only `unfollowed` rows count; skips do not burn budget.
    pub fn count_unfollowed_today(&self, today: NaiveDate) -> usize {
        self.rows
            .iter()
            .filter(|r| r.status == Status::Unfollowed)
            .filter(|r| r.date_unfollowed.map(|d| d.date()) == Some(today))
            .count()
    }

    /// Rows still awaiting processing (blank or explicitly marked unfollow).
    pub fn pending_count(&self) -> usize {
        self.rows.iter().filter(|r| r.status.is_pending()).count()
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts {
            total: self.rows.len(),
            ..StatusCounts::default()
        };
        for row in &self.rows {
            match row.status {
                Status::Keep => counts.keep += 1,
                Status::Unfollow => counts.unfollow += 1,
                Status::Unfollowed => counts.unfollowed += 1,
                Status::Skipped => counts.skipped += 1,
                Status::Unmarked => counts.unmarked += 1,
            }
        }
        counts
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    /// Apply an actuation outcome to the row at `idx`.
    ///
    /// Success and already-unfollowed both land on `unfollowed` (the account
    /// ends in the desired state either way); not-found and dialog failures
    /// land on `skipped`. `date_unfollowed` is stamped in every case.
    pub fn apply_outcome(&mut self, idx: usize, outcome: Outcome, now: NaiveDateTime) {
        let row = &mut self.rows[idx];
        row.status = match outcome {
            Outcome::Success | Outcome::AlreadyUnfollowed => Status::Unfollowed,
            Outcome::NotFound | Outcome::DialogFailed => Status::Skipped,
        };
        row.date_unfollowed = Some(now);
    }

    /// Mark a row skipped after an unexpected per-target error.
    pub fn mark_skipped(&mut self, idx: usize, now: NaiveDateTime) {
        let row = &mut self.rows[idx];
        row.status = Status::Skipped;
        row.date_unfollowed = Some(now);
    }
}
