use thiserror::Error;

#[derive(Debug, Error)]
pub enum DefollowError {
    #[error("no ledger found: run 'defollow import' first")]
    NotImported,

    #[error("ledger row {0} has an empty username")]
    EmptyUsername(usize),

    #[error("duplicate username in ledger: {0}")]
    DuplicateUsername(String),

    #[error("invalid status '{0}': expected keep, unfollow, unfollowed, skipped, or blank")]
    InvalidStatus(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unexpected import format: {0}")]
    ImportFormat(String),

    #[error(transparent)]
    Driver(#[from] crate::driver::DriverError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DefollowError>;
