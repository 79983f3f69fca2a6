//! Error types for configuration parsing.
//!
//! Every variant names the configuration section it came from and, where it
//! applies, the element position and the offending value, so users can fix
//! their input without reading code.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors produced while validating raw productionalization inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The raw input could not be decoded as JSON.
    #[error("failed to parse {section}: {reason}")]
    Malformed { section: &'static str, reason: String },

    /// The decoded input was not the expected JSON array.
    #[error("{section} must be a JSON array")]
    NotAnArray { section: &'static str },

    /// An array element was not an object.
    #[error("{section}: element at index {index} must be an object")]
    NotAnObject { section: &'static str, index: usize },

    /// A required field was absent (or null).
    #[error("{section}: element at index {index} is missing required field `{field}`")]
    MissingField {
        section: &'static str,
        index: usize,
        field: String,
    },

    /// A field was present but had the wrong JSON type.
    #[error("{section}: element at index {index} field `{field}` has the wrong type")]
    InvalidFieldType {
        section: &'static str,
        index: usize,
        field: String,
    },

    /// A team permission outside the allowed set.
    #[error(
        "invalid permission `{value}` for team `{team_slug}`: must be one of \
         pull, triage, push, maintain, admin"
    )]
    InvalidPermission { team_slug: String, value: String },

    /// A reviewer type other than `User` or `Team`.
    #[error(
        "invalid reviewer type `{value}` for environment `{environment}`: \
         must be `User` or `Team`"
    )]
    InvalidReviewerType { environment: String, value: String },

    /// A wait timer that is not an integer in 0..=43200.
    #[error(
        "invalid wait timer {value} for environment `{environment}`: \
         must be an integer between 0 and 43200"
    )]
    InvalidWaitTimer { environment: String, value: String },

    /// A `preventSelfReview` value that is not a boolean.
    #[error("preventSelfReview for environment `{environment}` must be a boolean")]
    InvalidPreventSelfReview { environment: String },

    /// The same environment name configured twice.
    #[error("environment `{environment}` appears more than once")]
    DuplicateEnvironment { environment: String },

    /// An environment variable block with an empty variable list.
    #[error("environment variables for `{environment}` must contain at least one variable")]
    EmptyVariables { environment: String },

    /// A branch protection preset outside the allowed set.
    #[error("invalid branch protection preset `{value}`: must be one of strict, moderate, minimal")]
    InvalidPreset { value: String },

    /// A string flag that is neither `true` nor `false`.
    #[error("invalid boolean `{value}` for `{flag}`: must be `true` or `false`")]
    InvalidFlag { flag: String, value: String },
}
