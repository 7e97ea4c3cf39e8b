use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure of a single repository call.
///
/// The `Display` form is what the dashboard shows in its status line, so it
/// always leads with the operation label.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("{op} failed: could not run git: {source}")]
    Spawn {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{op} failed: {stderr}")]
    Failed { op: &'static str, stderr: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),
}

impl GitError {
    pub fn failed<S: Into<String>>(op: &'static str, stderr: S) -> Self {
        let stderr = stderr.into();
        let stderr = if stderr.trim().is_empty() {
            "unknown error".to_string()
        } else {
            stderr.trim().to_string()
        };
        GitError::Failed { op, stderr }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_message_leads_with_operation() {
        let err = GitError::failed("push", "  rejected: non-fast-forward\n");
        assert_eq!(err.to_string(), "push failed: rejected: non-fast-forward");
    }

    #[test]
    fn failed_with_blank_stderr_still_reads() {
        let err = GitError::failed("commit", "   ");
        assert_eq!(err.to_string(), "commit failed: unknown error");
    }
}
