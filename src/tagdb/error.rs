use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TagdbError {
    /// The database file a registry entry points at is gone.
    #[error("Database file does not exist: {}", .0.display())]
    DatabaseMissing(PathBuf),

    #[error("The database {0} is not registered")]
    NotRegistered(String),

    #[error("The file {} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("A database named {0} is already registered")]
    AlreadyRegistered(String),

    #[error("Corrupt database at {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Tags not in the allowed set: {}", .0.join(", "))]
    TagsNotAllowed(Vec<String>),

    #[error("Index {0} does not exist")]
    IndexOutOfRange(i64),

    #[error("Index {0} is not a valid integer")]
    InvalidIndex(String),

    #[error("Invalid attribute '{0}' (should be of format KEY:VALUE)")]
    InvalidAttribute(String),

    #[error("{0} and {1} are mutually exclusive")]
    MutuallyExclusive(&'static str, &'static str),

    #[error("Nothing found matching '{0}'")]
    NoMatch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TagdbError>;
