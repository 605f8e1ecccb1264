use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Per-row processing status. Stored in the ledger as a plain string; the
/// blank string means the operator has not marked the row yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Unmarked,
    Keep,
    Unfollow,
    Unfollowed,
    Skipped,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Unmarked => "",
            Status::Keep => "keep",
            Status::Unfollow => "unfollow",
            Status::Unfollowed => "unfollowed",
            Status::Skipped => "skipped",
        }
    }

    /// Rows that are still candidates for processing.
    pub fn is_pending(self) -> bool {
        matches!(self, Status::Unmarked | Status::Unfollow)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = crate::error::DefollowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Status::Unmarked),
            "keep" => Ok(Status::Keep),
            "unfollow" => Ok(Status::Unfollow),
            "unfollowed" => Ok(Status::Unfollowed),
            "skipped" => Ok(Status::Skipped),
            _ => Err(crate::error::DefollowError::InvalidStatus(s.to_string())),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// FollowsYou
// ---------------------------------------------------------------------------

/// Whether the tracked account follows the operator back. Imports that ran
/// without a followers file leave this unknown (blank in the ledger), and any
/// unrecognized value is treated the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FollowsYou {
    Yes,
    No,
    #[default]
    Unknown,
}

impl FollowsYou {
    pub fn as_str(self) -> &'static str {
        match self {
            FollowsYou::Yes => "yes",
            FollowsYou::No => "no",
            FollowsYou::Unknown => "",
        }
    }

    pub fn parse(s: &str) -> FollowsYou {
        match s {
            "yes" => FollowsYou::Yes,
            "no" => FollowsYou::No,
            _ => FollowsYou::Unknown,
        }
    }
}

impl fmt::Display for FollowsYou {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FollowsYou {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FollowsYou {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(FollowsYou::parse(&s))
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Which slice of the pending rows a run should process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Everything pending: non-followers first, then mutuals, then unknown.
    #[default]
    All,
    /// Only accounts that do not follow back.
    NonFollowersOnly,
    /// Only mutual follows not marked 'keep'.
    MutualsNotKeep,
}

impl Mode {
    /// Human-readable label used in run headers and summaries.
    pub fn label(self) -> &'static str {
        match self {
            Mode::All => "all (non-followers first)",
            Mode::NonFollowersOnly => "non-followers only",
            Mode::MutualsNotKeep => "mutual follows (not keep) only",
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Classified result of one per-account actuation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The unfollow control was activated (confirmation may be unverified).
    Success,
    /// The profile already showed a "Follow" control; nothing to do.
    AlreadyUnfollowed,
    /// Neither a following nor a follow control was found; the account was
    /// likely deleted or renamed.
    NotFound,
    /// The confirmation dialog never yielded a workable unfollow control.
    DialogFailed,
}
