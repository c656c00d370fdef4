use std::fmt;

/// Machine-readable error codes surfaced by the store and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    StoreNotInitialized,
    ConfigParseError,
    SliderNotFound,
    InvalidDesiredState,
    InvalidName,
    StorageFailure,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::StoreNotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::SliderNotFound => "E2001",
            Self::InvalidDesiredState => "E2002",
            Self::InvalidName => "E2003",
            Self::StorageFailure => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::StoreNotInitialized => "Slider store not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::SliderNotFound => "Slider not found",
            Self::InvalidDesiredState => "Invalid banner assignment",
            Self::InvalidName => "Invalid slider name",
            Self::StorageFailure => "Storage operation failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::StoreNotInitialized => Some("Run `slider init` to create the store."),
            Self::ConfigParseError => Some("Fix syntax in slider.toml and retry."),
            Self::SliderNotFound => None,
            Self::InvalidDesiredState => {
                Some("Pass banners as a JSON object keyed by banner id, or as BANNER:POSITION.")
            }
            Self::InvalidName => Some("Slider names need at least one non-space character."),
            Self::StorageFailure => {
                Some("The save was rolled back. Retry once the database is writable.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised by relation synchronization and the slider repository.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Any failure reported by SQLite (connection loss, constraint violation).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An update targeted a slider row that does not exist.
    #[error("slider not found: {0}")]
    SliderNotFound(i64),

    /// The desired banner set could not be read at all.
    #[error("invalid banner assignment: {0}")]
    InvalidDesiredState(String),
}

impl StorageError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Sqlite(_) => ErrorCode::StorageFailure,
            Self::SliderNotFound(_) => ErrorCode::SliderNotFound,
            Self::InvalidDesiredState(_) => ErrorCode::InvalidDesiredState,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}
