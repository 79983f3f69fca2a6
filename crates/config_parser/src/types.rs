//! Typed configuration structures for the productionalization pass.
//!
//! These are produced by the functions in [`crate::parsers`] and consumed by
//! the orchestration layer. All collections are in input order; an empty
//! collection (or `None`) means "skip that sub-operation entirely", never
//! "apply defaults".

use secrecy::SecretString;

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;

/// Repository permission level grantable to a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamPermission {
    Pull,
    Triage,
    Push,
    Maintain,
    Admin,
}

impl TeamPermission {
    /// All accepted permission names, in the order GitHub documents them.
    pub const ALLOWED: [&'static str; 5] = ["pull", "triage", "push", "maintain", "admin"];

    /// Parses a GitHub role name. Case-sensitive, matching the REST API.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pull" => Some(Self::Pull),
            "triage" => Some(Self::Triage),
            "push" => Some(Self::Push),
            "maintain" => Some(Self::Maintain),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// The GitHub role name for this permission.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Triage => "triage",
            Self::Push => "push",
            Self::Maintain => "maintain",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for TeamPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A team and the permission it should receive on the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamPermissionConfig {
    /// Slug of the team within the owning organization
    pub team_slug: String,
    /// Permission to grant
    pub permission: TeamPermission,
}

/// Kind of actor configured as a deployment reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewerType {
    User,
    Team,
}

/// A deployment reviewer, still by slug; resolved to a numeric id at
/// orchestration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerConfig {
    pub reviewer_type: ReviewerType,
    /// Username for `User` reviewers, team slug for `Team` reviewers
    pub slug: String,
}

/// A deployment environment to create on the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    /// Environment name, unique within one configuration
    pub name: String,
    /// Minutes to wait before deployments may proceed (0..=43200)
    pub wait_timer: Option<u32>,
    /// Required reviewers, in input order
    pub reviewers: Vec<ReviewerConfig>,
    /// Whether deployers may approve their own deployments
    pub prevent_self_review: Option<bool>,
}

/// A single environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableConfig {
    pub name: String,
    pub value: String,
}

/// Variables destined for one environment.
///
/// `environment_name` is expected to reference an [`EnvironmentConfig`] from
/// the same run, but that is not validated locally; the remote platform is
/// the authority on whether the environment exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentVariables {
    pub environment_name: String,
    /// Non-empty, in input order
    pub variables: Vec<VariableConfig>,
}

/// A repository secret. The plaintext value is wrapped so it can neither be
/// logged nor serialized; it is exposed only at the sealing call.
#[derive(Debug)]
pub struct RepositorySecret {
    pub name: String,
    pub value: SecretString,
}

/// Named branch protection preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchProtectionPreset {
    Strict,
    Moderate,
    Minimal,
}

impl BranchProtectionPreset {
    /// All accepted preset names.
    pub const ALLOWED: [&'static str; 3] = ["strict", "moderate", "minimal"];

    /// Parses a preset name, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "moderate" => Some(Self::Moderate),
            "minimal" => Some(Self::Minimal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Moderate => "moderate",
            Self::Minimal => "minimal",
        }
    }
}

impl std::fmt::Display for BranchProtectionPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate of all productionalization inputs for one run.
///
/// Every field is optional in the sense that an empty collection or `None`
/// skips the corresponding sub-operation.
#[derive(Debug, Default)]
pub struct ProductionalizationConfig {
    pub team_permissions: Vec<TeamPermissionConfig>,
    pub topics: Vec<String>,
    pub environments: Vec<EnvironmentConfig>,
    pub environment_variables: Vec<EnvironmentVariables>,
    pub branch_protection_preset: Option<BranchProtectionPreset>,
    pub branch_protection_target_branch: Option<String>,
    pub secrets: Vec<RepositorySecret>,
}

impl ProductionalizationConfig {
    /// Returns true when no sub-operation is configured.
    pub fn is_empty(&self) -> bool {
        self.team_permissions.is_empty()
            && self.topics.is_empty()
            && self.environments.is_empty()
            && self.environment_variables.is_empty()
            && self.branch_protection_preset.is_none()
            && self.secrets.is_empty()
    }
}
