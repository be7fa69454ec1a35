// Q9 Lookup Type Definitions
// Errors, commands and result types shared by the service and the session

use thiserror::Error;

/// Names of the tables every dataset must provide
pub const REQUIRED_TABLES: &[&str] = &[
    "mapped_table",
    "related_candidates_table",
    "word_meta",
    "ts_chinese_table",
];

/// Errors raised while opening or querying the dataset
///
/// "Not found" is never an error: lookups report it as `None` or an empty
/// vector so it stays distinguishable from a failed query.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("dataset query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("dataset is missing required table '{table}'")]
    MissingTable { table: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed configuration file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dataset connection lock poisoned")]
    Poisoned,

    #[error("dataset connection already closed")]
    Closed,
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, LookupError>;

/// Non-digit keys understood by the input session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Q9Command {
    /// Drop the current input and candidates
    Cancel,
    /// Show words related to the last committed character
    Relate,
    /// Toggle homophone mode: the next selection lists its homophones
    Homophone,
    /// Quick selection lists (code 1000, or 1000 + first digit)
    Shortcut,
    /// Bracket pairs
    OpenClose,
    NextPage,
    PrevPage,
}

impl std::fmt::Display for Q9Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Q9Command::Cancel => write!(f, "Cancel"),
            Q9Command::Relate => write!(f, "Relate"),
            Q9Command::Homophone => write!(f, "Homophone"),
            Q9Command::Shortcut => write!(f, "Shortcut"),
            Q9Command::OpenClose => write!(f, "OpenClose"),
            Q9Command::NextPage => write!(f, "NextPage"),
            Q9Command::PrevPage => write!(f, "PrevPage"),
        }
    }
}

/// Phonetic metadata of one `word_meta` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneticEntry {
    /// The character
    pub character: String,

    /// Secondary (tone/variant) key; may be NULL in the dataset
    pub ping2: Option<String>,
}

impl PhoneticEntry {
    pub fn new(character: impl Into<String>, ping2: Option<&str>) -> Self {
        Self {
            character: character.into(),
            ping2: ping2.map(str::to_string),
        }
    }
}
