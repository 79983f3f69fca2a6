//! Repository ruleset domain types.
//!
//! This module contains types representing GitHub repository rulesets and the
//! rules the branch protection presets use. Rulesets provide a way to enforce
//! repository governance policies on branches and tags.
//!
//! See: https://docs.github.com/en/rest/repos/rules

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "ruleset_tests.rs"]
mod tests;

/// Represents a repository ruleset.
///
/// Rulesets define governance rules that apply to branches or tags in a
/// repository.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryRuleset {
    /// Ruleset name
    pub name: String,

    /// Target type (branch or tag)
    pub target: RulesetTarget,

    /// Enforcement level
    pub enforcement: RulesetEnforcement,

    /// Conditions for when this ruleset applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<RulesetConditions>,

    /// Rules in this ruleset
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// Target type for a ruleset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RulesetTarget {
    /// Ruleset applies to branches
    Branch,
    /// Ruleset applies to tags
    Tag,
}

/// Enforcement level for a ruleset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RulesetEnforcement {
    /// Ruleset is disabled
    Disabled,
    /// Ruleset is active and enforced
    Active,
    /// Ruleset is in evaluation mode (logs only, doesn't block)
    Evaluate,
}

/// Conditions for when a ruleset applies.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RulesetConditions {
    /// Reference name patterns
    pub ref_name: RefNameCondition,
}

/// Reference name condition.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefNameCondition {
    /// Patterns to include (fully-qualified refs or `~DEFAULT_BRANCH`)
    pub include: Vec<String>,

    /// Patterns to exclude
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// A rule within a ruleset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    /// Pull request requirements
    PullRequest {
        /// Pull request parameters
        parameters: PullRequestParameters,
    },

    /// Prevent non-fast-forward (force) pushes
    NonFastForward,
}

/// Parameters for pull request rules.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequestParameters {
    /// Dismiss stale reviews when new commits are pushed
    pub dismiss_stale_reviews_on_push: bool,

    /// Require approval of the most recent reviewable push
    pub require_last_push_approval: bool,

    /// Required approving review count
    pub required_approving_review_count: u32,

    /// Require all review threads to be resolved before merging
    pub required_review_thread_resolution: bool,
}
