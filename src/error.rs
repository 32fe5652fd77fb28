use thiserror::Error;
use tracing::{error, warn};

use crate::host::ElementId;

/// How loudly a failure should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Expected race or no-op, logged at debug/warn
    Info,
    /// Recoverable, the expansion degraded or was skipped
    Warning,
    /// The operation failed outright
    Error,
}

/// Errors raised by the mapping store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O failed for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid keyword '{keyword}': {reason}")]
    InvalidKeyword { keyword: String, reason: &'static str },

    #[error("phrase for '{0}' is empty")]
    EmptyPhrase(String),
}

/// Errors raised by the field adapter while splicing text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The token is nowhere in the flattened text
    #[error("token '{0}' not found in field text")]
    TokenNotFound(String),

    /// The host has no editing commands for this field
    #[error("editing commands unavailable")]
    EditCommandsUnavailable,

    /// No selection inside the element
    #[error("field has no caret")]
    NoCaret,
}

/// Domain errors for text expansion
#[derive(Error, Debug)]
pub enum ExpandError {
    #[error("mapping store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("field {0:?} is no longer attached")]
    DetachedField(ElementId),

    #[error("could not edit field structure: {0}")]
    UnsupportedEditStructure(#[from] FieldError),

    #[error("no phrase stored for keyword '{0}'")]
    UnknownKeyword(String),

    #[error("trigger '{raw_token}' at {start_offset} no longer matches the field")]
    StaleTrigger { raw_token: String, start_offset: usize },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ExpandError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::StoreUnavailable(_) => ErrorSeverity::Error,
            Self::DetachedField(_) => ErrorSeverity::Info,
            Self::UnsupportedEditStructure(_) => ErrorSeverity::Warning,
            Self::UnknownKeyword(_) => ErrorSeverity::Warning,
            Self::StaleTrigger { .. } => ErrorSeverity::Info,
            Self::Config(_) => ErrorSeverity::Warning,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExpandError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the host page must not see it.
///
/// # Examples
///
/// ```ignore
/// use slashkey::error::ResultExt;
///
/// let table = store.get_all().log_err().unwrap_or_default();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}
