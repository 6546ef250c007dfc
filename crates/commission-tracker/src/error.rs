//! Error types for validation, store access, and rename cascades

/// Input rejected locally, before anything is sent to the store
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("staff member '{0}' already exists")]
    DuplicateStaff(String),

    #[error("staff member '{0}' does not exist")]
    UnknownStaff(String),

    #[error("sales amount must be a finite, non-negative number, got {0}")]
    InvalidAmount(f64),

    #[error("commission rate must be in (0, 1], got {0}")]
    InvalidRate(f64),

    #[error("row is missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' has an unexpected value: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// The backing store rejected or failed a read or write
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Malformed(String),
}

/// Outcome of a failed session operation
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The staff row was renamed but its entries still carry the old name
    #[error(
        "renamed staff '{old}' to '{new}' but reassigning their entries failed: {source}"
    )]
    PartialCascade {
        old: String,
        new: String,
        #[source]
        source: StoreError,
    },
}

impl LedgerError {
    /// True when the store was left half-updated and needs manual repair
    pub fn is_partial(&self) -> bool {
        matches!(self, LedgerError::PartialCascade { .. })
    }
}
