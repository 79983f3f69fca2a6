//! Fatal errors for repository provisioning.
//!
//! Only the creation-time path aborts the run; productionalization failures
//! are recorded inside the result object instead and never surface here.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that abort a provisioning run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A template reference that does not split into `owner/repo`.
    #[error("invalid template `{value}`: expected `owner/repo`")]
    InvalidTemplateFormat { value: String },

    /// Repository creation failed.
    #[error("failed to create repository: {source}")]
    CreateRepository {
        #[source]
        source: github_client::Error,
    },

    /// The created repository's full name did not split into owner and name.
    #[error("repository full name `{full_name}` is not of the `owner/name` form")]
    MalformedFullName { full_name: String },

    /// Fetching the repository to learn its default branch failed.
    #[error("failed to look up repository `{full_name}`: {source}")]
    LookupRepository {
        full_name: String,
        #[source]
        source: github_client::Error,
    },

    /// Renaming the default branch failed.
    #[error("failed to rename branch `{branch}` to `{new_name}`: {source}")]
    RenameBranch {
        branch: String,
        new_name: String,
        #[source]
        source: github_client::Error,
    },
}
