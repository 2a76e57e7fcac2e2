use std::time::Duration;
use thiserror::Error;

/// A specialized `Result` type for adb wrapper operations.
pub type AdbResult<T> = Result<T, AdbError>;

/// The error type for all adb wrapper operations.
#[derive(Debug, Error)]
pub enum AdbError {
    #[error("Failed to launch '{command}': {source}")]
    SpawnFailed {
        command: String,
        source: std::io::Error,
    },

    #[error("'{command}' did not finish within {duration:?}")]
    Timeout { command: String, duration: Duration },

    #[error("'{command}' failed with exit code {exit_code:?}: {output}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("Unparseable device line '{line}': {reason}")]
    MalformedLine { line: String, reason: String },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidConfig {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to determine home directory while expanding '~'")]
    HomeDirectoryNotFound,

    #[error("Failed to decode screenshot: {source}")]
    ImageDecode {
        #[from]
        source: image::ImageError,
    },
}

impl AdbError {
    /// True when the per-call deadline elapsed before adb exited.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AdbError::Timeout { .. })
    }

    pub fn is_malformed_line(&self) -> bool {
        matches!(self, AdbError::MalformedLine { .. })
    }

    pub(crate) fn malformed(line: &str, reason: impl Into<String>) -> Self {
        AdbError::MalformedLine {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}
