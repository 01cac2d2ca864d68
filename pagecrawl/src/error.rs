use thiserror::Error;

/// Failures of the record store behind `_TABLE:` lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
    #[error("Unsupported filter `{expr}`: {reason}")]
    UnsupportedFilter { expr: String, reason: String },
    #[error("Joined tables are not supported: {0}")]
    UnsupportedJoin(String),
    #[error("Store error: {0}")]
    Backend(String),
}

/// Reasons a `_TABLE:` directive cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("Missing `:` in directive part `{0}`")]
    MissingSeparator(String),
    #[error("Directive has no _TABLE")]
    MissingTable,
    #[error("Invalid number for {key}: `{value}`")]
    InvalidNumber { key: String, value: String },
}
