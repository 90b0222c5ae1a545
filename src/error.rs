use std::path::PathBuf;
use thiserror::Error;

pub type StageResult<T> = Result<T, StageError>;

/// Errors raised while loading a manifest or staging files.
///
/// Only [`StageError::DestinationCreateFailure`] and the configuration errors
/// abort a run. The other kinds are recorded in the
/// [`StageReport`](crate::executor::StageReport) and staging carries on.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("rule {rule}: source directory does not exist: {}", .path.display())]
    MissingSourceDirectory { rule: usize, path: PathBuf },

    #[error("rule {rule}: destination '{subpath}' escapes the output root")]
    InvalidDestination { rule: usize, subpath: String },

    #[error("rule {rule}: failed to create destination {}", .path.display())]
    DestinationCreateFailure {
        rule: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rule {rule}: failed to copy {} to {}", .from.display(), .to.display())]
    CopyFailure {
        rule: usize,
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("engine directory does not exist: {}", .path.display())]
    EngineDirMissing { path: PathBuf },

    #[error("unknown target platform: {0}")]
    UnknownPlatform(String),

    #[error("failed to read manifest at {}", .path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest at {}", .path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StageError {
    /// Whether this error stops the remaining rules from running.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::MissingSourceDirectory { .. }
                | Self::InvalidDestination { .. }
                | Self::CopyFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality_classification() {
        let missing = StageError::MissingSourceDirectory {
            rule: 1,
            path: PathBuf::from("/src/docs"),
        };
        assert!(!missing.is_fatal());

        let create = StageError::DestinationCreateFailure {
            rule: 2,
            path: PathBuf::from("/out/Public"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(create.is_fatal());
        assert!(create.to_string().contains("rule 2"));
        assert!(create.to_string().contains("/out/Public"));
    }
}
