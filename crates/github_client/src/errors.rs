//! Error types for GitHub client operations.
//!
//! Per-item failures in the productionalization flow are reported to users as
//! the remote failure's own message, so [`Error::Api`] carries the textual
//! message from the GitHub error body rather than an opaque marker.

use tracing::error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur during GitHub client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The GitHub API rejected a request.
    ///
    /// The message is the `message` field of the GitHub error body when one
    /// was returned, otherwise the transport error's own description.
    #[error("{message}")]
    Api { message: String },

    /// The requested resource does not exist (HTTP 404).
    #[error("resource not found")]
    NotFound,

    /// The resource being created already exists (HTTP 409, or a 422 whose
    /// message says so). Used by callers to fall back from create to update.
    #[error("resource already exists")]
    AlreadyExists,

    /// Authentication or GitHub client initialization failure.
    #[error("failed to authenticate or initialize GitHub client: {0}")]
    Auth(String),
}

impl Error {
    /// Converts an octocrab error into an [`Error`], preserving the GitHub
    /// error body's message and classifying not-found and already-exists
    /// responses.
    pub(crate) fn from_octocrab(route: &str, e: octocrab::Error) -> Self {
        match e {
            octocrab::Error::GitHub { source, .. } => {
                error!(
                    route = route,
                    status = source.status_code.as_u16(),
                    message = source.message,
                    "GitHub API request failed"
                );
                match source.status_code.as_u16() {
                    404 => Error::NotFound,
                    409 => Error::AlreadyExists,
                    422 if source.message.to_ascii_lowercase().contains("already exists") => {
                        Error::AlreadyExists
                    }
                    _ => Error::Api {
                        message: source.message,
                    },
                }
            }
            other => {
                error!(route = route, error = %other, "GitHub API request failed");
                Error::Api {
                    message: other.to_string(),
                }
            }
        }
    }
}
