//! Shared error types for the application

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for phpinspect operations
#[derive(Debug, Error)]
pub enum Error {
    /// File system related errors
    #[error("File system error: {message}")]
    FileSystem {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Parsing errors
    #[error("Parse error in {file}:{line}:{column}: {message}")]
    Parse {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// Parser setup errors
    #[error("Parser error: {0}")]
    Parser(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed fixture markers
    #[error("Fixture error: {0}")]
    Fixture(String),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Pattern errors
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Directory walking errors
    #[error(transparent)]
    Walk(#[from] ignore::Error),
}

impl Error {
    /// Create a file system error with path context
    pub fn file_system(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::FileSystem {
            message: message.into(),
            path: Some(path.into()),
            source: None,
        }
    }

    /// Create a file system error wrapping the underlying I/O error
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        Self::FileSystem {
            message: format!("{}: {}", path.display(), source),
            path: Some(path),
            source: Some(source),
        }
    }

    /// Create a parse error
    pub fn parse(
        file: impl Into<PathBuf>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Whether the user can fix this error by editing input or configuration
    pub fn is_user_fixable(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. }
                | Self::Configuration(_)
                | Self::Validation(_)
                | Self::Fixture(_)
                | Self::Pattern(_)
        )
    }
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;
