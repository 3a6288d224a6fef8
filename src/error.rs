use std::path::PathBuf;

/// Errors raised while turning hit files into overlap edges.
#[derive(thiserror::Error, Debug)]
pub enum OverlapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("IO error on {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed hit record ({reason}): {line:?}")]
    MalformedHitRecord { line: String, reason: String },
    #[error("Index consistency error: {0}")]
    IndexConsistency(String),
    #[error("Invalid overlap geometry ({reason}): {overlap}")]
    InvalidOverlapGeometry { overlap: String, reason: &'static str },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to parse reads from {}: {reason}", path.display())]
    Reads { path: PathBuf, reason: String },
}

impl OverlapError {
    pub(crate) fn malformed(line: &str, reason: impl Into<String>) -> Self {
        Self::MalformedHitRecord {
            line: line.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Whether the run can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidOverlapGeometry { .. })
    }
}

pub type Result<T> = std::result::Result<T, OverlapError>;
