//! # Models
//!
//! Data models for the GitHub API surface used by repository provisioning and
//! productionalization. Request payloads serialize only the fields the caller
//! set; response models keep just the fields the rest of the system reads.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// Represents a GitHub repository as returned by the creation and lookup
/// routes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Repository {
    /// The unique numeric id of the repository
    pub id: u64,
    /// The full name of the repository (owner/name)
    pub full_name: String,
    /// The web URL of the repository
    pub html_url: String,
    /// The default branch, when the route returns it
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl Repository {
    /// Splits the full name into its `(owner, name)` parts.
    ///
    /// Returns `None` if the full name is not of the `owner/name` form.
    pub fn owner_and_name(&self) -> Option<(&str, &str)> {
        let (owner, name) = self.full_name.split_once('/')?;
        if owner.is_empty() || name.is_empty() {
            return None;
        }
        Some((owner, name))
    }
}

/// The public key a repository exposes for sealing Actions secrets.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryPublicKey {
    /// Identifier of the key, echoed back when uploading a sealed secret
    pub key_id: String,
    /// The key itself, base64 encoded
    pub key: String,
}

/// Represents the payload for creating a new repository via the REST API.
///
/// Use `Default::default()` and modify fields as needed; unset optional
/// fields are omitted from the request body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepositoryCreatePayload {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_init: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gitignore_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_template: Option<String>,
}

/// Payload for creating a repository from a template repository.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateRepositoryPayload {
    /// Owner of the new repository; defaults to the authenticated user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
}

/// Payload for creating or updating a deployment environment.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct EnvironmentPayload {
    /// Minutes to wait before allowing a deployment (0..=43200)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_timer: Option<u32>,

    /// Required reviewers, already resolved to numeric ids
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewers: Option<Vec<DeploymentReviewer>>,

    /// Whether the deployer may approve their own deployment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prevent_self_review: Option<bool>,
}

/// A required reviewer on a deployment environment.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeploymentReviewer {
    /// Whether the id refers to a user or a team
    #[serde(rename = "type")]
    pub kind: ReviewerKind,
    /// Numeric id of the user or team
    pub id: u64,
}

/// Kind of actor that can review deployments into an environment.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ReviewerKind {
    User,
    Team,
}
