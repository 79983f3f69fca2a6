//! Productionalization orchestration.
//!
//! Applies organizational policy to an already-created repository in six
//! fixed stages: team permissions, topics, deployment environments,
//! environment variables, branch protection, and secrets. Stages run
//! sequentially and items within a stage run in input order, one remote call
//! at a time. A failing item never aborts the run; it is recorded in the
//! result and execution continues, so the caller always receives one fully
//! populated [`ProductionalizationResult`] describing partial success in
//! detail.

use std::collections::HashSet;
use std::time::Duration;

use config_parser::{
    EnvironmentConfig, ProductionalizationConfig, ReviewerType, TeamPermissionConfig,
};
use github_client::{
    DeploymentReviewer, EnvironmentPayload, Error as ClientError, ProductionClient, ReviewerKind,
};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::naming::to_upper_snake_case;
use crate::presets;
use crate::sealing;

#[cfg(test)]
#[path = "productionalize_tests.rs"]
mod tests;

/// Pause between consecutive remote calls within a stage. Courtesy towards
/// the platform's secondary rate limits, not a correctness requirement.
const INTER_CALL_DELAY: Duration = Duration::from_millis(250);

/// Branch protected when no target branch is configured.
const DEFAULT_TARGET_BRANCH: &str = "main";

/// Outcome of one team permission grant, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPermissionOutcome {
    pub team_slug: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A failed environment creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentError {
    pub environment: String,
    pub success: bool,
    pub error: String,
}

/// A failed variable creation, tagged with the normalized variable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableError {
    pub environment: String,
    pub variable: String,
    pub success: bool,
    pub error: String,
}

/// A failed secret upload. Carries only the secret's name, never its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretError {
    pub secret: String,
    pub success: bool,
    pub error: String,
}

/// Aggregated outcome of one productionalization run.
///
/// Every field is populated on every run; an unconfigured stage leaves its
/// slots at their defaults (empty, zero, `false`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionalizationResult {
    pub team_permissions: Vec<TeamPermissionOutcome>,
    pub topics_added: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics_error: Option<String>,
    pub environments_created: Vec<String>,
    pub environment_errors: Vec<EnvironmentError>,
    pub variables_created: u32,
    pub variable_errors: Vec<VariableError>,
    pub branch_protection_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_protection_error: Option<String>,
    pub secrets_created: u32,
    pub secret_errors: Vec<SecretError>,
}

/// Runs the productionalization stages against one repository.
///
/// Holds the remote capability behind a reference so tests can drive the
/// orchestration with a fake client.
pub struct Productionalizer<'a> {
    client: &'a dyn ProductionClient,
}

impl<'a> Productionalizer<'a> {
    pub fn new(client: &'a dyn ProductionClient) -> Self {
        Self { client }
    }

    /// Applies `config` to the repository `owner/repo`.
    ///
    /// Always resolves to a result; per-item remote failures are data inside
    /// it, not errors. An empty config yields a fully populated, fully empty
    /// result without touching the remote.
    pub async fn productionalize(
        &self,
        owner: &str,
        repo: &str,
        config: &ProductionalizationConfig,
    ) -> ProductionalizationResult {
        let mut result = ProductionalizationResult::default();
        if config.is_empty() {
            debug!(owner, repo, "Nothing to productionalize");
            return result;
        }
        info!(owner, repo, "Starting productionalization");

        self.apply_team_permissions(owner, repo, &config.team_permissions, &mut result)
            .await;
        self.apply_topics(owner, repo, &config.topics, &mut result)
            .await;
        self.apply_environments(owner, repo, &config.environments, &mut result)
            .await;
        self.apply_variables(owner, repo, config, &mut result).await;
        self.apply_branch_protection(owner, repo, config, &mut result)
            .await;
        self.apply_secrets(owner, repo, config, &mut result).await;

        info!(
            owner,
            repo,
            teams = result.team_permissions.len(),
            environments = result.environments_created.len(),
            variables = result.variables_created,
            secrets = result.secrets_created,
            "Productionalization finished"
        );
        result
    }

    async fn apply_team_permissions(
        &self,
        owner: &str,
        repo: &str,
        teams: &[TeamPermissionConfig],
        result: &mut ProductionalizationResult,
    ) {
        for team in teams {
            let outcome = match self
                .client
                .add_team_permission(owner, &team.team_slug, owner, repo, team.permission.as_str())
                .await
            {
                Ok(()) => {
                    info!(
                        team = team.team_slug,
                        permission = %team.permission,
                        "Granted team permission"
                    );
                    TeamPermissionOutcome {
                        team_slug: team.team_slug.clone(),
                        success: true,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(team = team.team_slug, error = %e, "Team permission failed");
                    TeamPermissionOutcome {
                        team_slug: team.team_slug.clone(),
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            result.team_permissions.push(outcome);
            tokio::time::sleep(INTER_CALL_DELAY).await;
        }
    }

    /// Merges configured topics into the existing set and replaces the whole
    /// set remotely. Existing topics come first; configured topics keep their
    /// input order, duplicates collapse.
    async fn apply_topics(
        &self,
        owner: &str,
        repo: &str,
        topics: &[String],
        result: &mut ProductionalizationResult,
    ) {
        if topics.is_empty() {
            return;
        }

        let existing = match self.client.get_all_topics(owner, repo).await {
            Ok(existing) => existing,
            Err(e) => {
                warn!(error = %e, "Fetching existing topics failed");
                result.topics_error = Some(e.to_string());
                return;
            }
        };

        let mut seen: HashSet<&str> = existing.iter().map(String::as_str).collect();
        let mut merged = existing.clone();
        for topic in topics {
            if seen.insert(topic) {
                merged.push(topic.clone());
            }
        }

        match self.client.replace_all_topics(owner, repo, &merged).await {
            Ok(()) => {
                info!(count = merged.len(), "Replaced repository topics");
                result.topics_added = true;
            }
            Err(e) => {
                warn!(error = %e, "Replacing topics failed");
                result.topics_error = Some(e.to_string());
            }
        }
    }

    /// Resolves a reviewer slug to the numeric id the environment route
    /// expects. Lookups are intentionally not cached; repeating an identical
    /// lookup within one run is acceptable.
    async fn resolve_reviewer(
        &self,
        owner: &str,
        reviewer_type: ReviewerType,
        slug: &str,
    ) -> Result<DeploymentReviewer, ClientError> {
        match reviewer_type {
            ReviewerType::Team => {
                let id = self.client.get_team_id(owner, slug).await?;
                Ok(DeploymentReviewer {
                    kind: ReviewerKind::Team,
                    id,
                })
            }
            ReviewerType::User => {
                let id = self.client.get_user_id(slug).await?;
                Ok(DeploymentReviewer {
                    kind: ReviewerKind::User,
                    id,
                })
            }
        }
    }

    async fn apply_environments(
        &self,
        owner: &str,
        repo: &str,
        environments: &[EnvironmentConfig],
        result: &mut ProductionalizationResult,
    ) {
        'environments: for environment in environments {
            let mut reviewers = Vec::with_capacity(environment.reviewers.len());
            for reviewer in &environment.reviewers {
                match self
                    .resolve_reviewer(owner, reviewer.reviewer_type, &reviewer.slug)
                    .await
                {
                    Ok(resolved) => reviewers.push(resolved),
                    Err(e) => {
                        // A reviewer that cannot be resolved fails the whole
                        // environment; it is never created half-configured.
                        warn!(
                            environment = environment.name,
                            reviewer = reviewer.slug,
                            error = %e,
                            "Reviewer resolution failed"
                        );
                        result.environment_errors.push(EnvironmentError {
                            environment: environment.name.clone(),
                            success: false,
                            error: e.to_string(),
                        });
                        continue 'environments;
                    }
                }
            }

            let payload = EnvironmentPayload {
                wait_timer: environment.wait_timer,
                reviewers: (!reviewers.is_empty()).then_some(reviewers),
                prevent_self_review: environment.prevent_self_review,
            };
            match self
                .client
                .create_or_update_environment(owner, repo, &environment.name, &payload)
                .await
            {
                Ok(()) => {
                    info!(environment = environment.name, "Created environment");
                    result.environments_created.push(environment.name.clone());
                }
                Err(e) => {
                    warn!(environment = environment.name, error = %e, "Environment creation failed");
                    result.environment_errors.push(EnvironmentError {
                        environment: environment.name.clone(),
                        success: false,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    /// Creates environment variables, normalizing each name to
    /// `UPPER_SNAKE_CASE` and falling back to an update call when the
    /// variable already exists.
    ///
    /// A block naming an environment whose creation failed in this run is
    /// skipped, since the environment never reliably exists. A block naming
    /// an environment that was not configured in this run is still attempted;
    /// the remote platform is the authority on whether it exists.
    async fn apply_variables(
        &self,
        owner: &str,
        repo: &str,
        config: &ProductionalizationConfig,
        result: &mut ProductionalizationResult,
    ) {
        let configured: HashSet<&str> = config
            .environments
            .iter()
            .map(|environment| environment.name.as_str())
            .collect();
        let failed: HashSet<&str> = result
            .environment_errors
            .iter()
            .map(|error| error.environment.as_str())
            .collect();

        for block in &config.environment_variables {
            let environment = block.environment_name.as_str();
            if configured.contains(environment) && failed.contains(environment) {
                warn!(
                    environment,
                    count = block.variables.len(),
                    "Skipping variables for environment that failed to create"
                );
                continue;
            }

            for variable in &block.variables {
                let name = to_upper_snake_case(&variable.name);
                match self
                    .create_or_update_variable(owner, repo, environment, &name, &variable.value)
                    .await
                {
                    Ok(()) => {
                        info!(environment, variable = name, "Set environment variable");
                        result.variables_created += 1;
                    }
                    Err(e) => {
                        warn!(environment, variable = name, error = %e, "Variable creation failed");
                        result.variable_errors.push(VariableError {
                            environment: environment.to_string(),
                            variable: name,
                            success: false,
                            error: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    async fn create_or_update_variable(
        &self,
        owner: &str,
        repo: &str,
        environment: &str,
        name: &str,
        value: &str,
    ) -> Result<(), ClientError> {
        match self
            .client
            .create_environment_variable(owner, repo, environment, name, value)
            .await
        {
            Err(ClientError::AlreadyExists) => {
                debug!(environment, variable = name, "Variable exists, updating");
                self.client
                    .update_environment_variable(owner, repo, environment, name, value)
                    .await
            }
            other => other,
        }
    }

    async fn apply_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        config: &ProductionalizationConfig,
        result: &mut ProductionalizationResult,
    ) {
        let Some(preset) = config.branch_protection_preset else {
            return;
        };
        let target_branch = config
            .branch_protection_target_branch
            .as_deref()
            .unwrap_or(DEFAULT_TARGET_BRANCH);
        let ruleset = presets::resolve(preset, target_branch);

        match self.client.create_repo_ruleset(owner, repo, &ruleset).await {
            Ok(()) => {
                info!(preset = %preset, branch = target_branch, "Created branch protection ruleset");
                result.branch_protection_created = true;
            }
            Err(e) => {
                warn!(preset = %preset, error = %e, "Branch protection failed");
                result.branch_protection_error = Some(e.to_string());
            }
        }
    }

    /// Uploads secrets, sealing each value against the repository public key.
    ///
    /// The key is fetched once; if that fetch fails the whole stage is
    /// abandoned, since no secret can be sealed without it. That failure is
    /// visible only in the logs and through `secrets_created` staying at
    /// zero, never through `secret_errors`.
    async fn apply_secrets(
        &self,
        owner: &str,
        repo: &str,
        config: &ProductionalizationConfig,
        result: &mut ProductionalizationResult,
    ) {
        if config.secrets.is_empty() {
            return;
        }

        let public_key = match self.client.get_repo_public_key(owner, repo).await {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Fetching repository public key failed, skipping all secrets");
                return;
            }
        };

        for secret in &config.secrets {
            let sealed = match sealing::seal(&public_key.key, secret.value.expose_secret()).await {
                Ok(sealed) => sealed,
                Err(e) => {
                    warn!(secret = secret.name, error = %e, "Sealing secret failed");
                    result.secret_errors.push(SecretError {
                        secret: secret.name.clone(),
                        success: false,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            match self
                .client
                .put_repo_secret(owner, repo, &secret.name, &sealed, &public_key.key_id)
                .await
            {
                Ok(()) => {
                    info!(secret = secret.name, "Created repository secret");
                    result.secrets_created += 1;
                }
                Err(e) => {
                    warn!(secret = secret.name, error = %e, "Secret upload failed");
                    result.secret_errors.push(SecretError {
                        secret: secret.name.clone(),
                        success: false,
                        error: e.to_string(),
                    });
                }
            }
            tokio::time::sleep(INTER_CALL_DELAY).await;
        }
    }
}
