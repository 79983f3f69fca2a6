//! Crate for interacting with the GitHub REST API.
//!
//! This crate provides a client for making authenticated requests to GitHub
//! using a personal access token, together with the [`ProductionClient`] trait
//! that describes every remote operation the provisioning and
//! productionalization flows need. Keeping the surface behind a trait lets the
//! orchestration layer run against a fake client in tests.

use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Deserialize;
use tracing::{debug, info, instrument};

pub mod errors;
pub use errors::Error;

pub mod models;
pub use models::{
    DeploymentReviewer, EnvironmentPayload, Repository, RepositoryCreatePayload,
    RepositoryPublicKey, ReviewerKind, TemplateRepositoryPayload,
};

pub mod ruleset;
pub use ruleset::{
    PullRequestParameters, RefNameCondition, RepositoryRuleset, Rule, RulesetConditions,
    RulesetEnforcement, RulesetTarget,
};

// Reference the tests module in the separate file
#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Numeric-id-only response shape shared by the team and user lookup routes.
#[derive(Debug, Deserialize)]
struct ObjectId {
    id: u64,
}

/// Wire shape of the repository topics routes (`GET`/`PUT .../topics`).
#[derive(Debug, serde::Serialize, Deserialize)]
struct TopicsPayload {
    names: Vec<String>,
}

#[derive(Debug, serde::Serialize)]
struct RenameBranchBody<'a> {
    new_name: &'a str,
}

#[derive(Debug, serde::Serialize)]
struct TeamPermissionBody<'a> {
    permission: &'a str,
}

#[derive(Debug, serde::Serialize)]
struct VariableBody<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Debug, serde::Serialize)]
struct SecretBody<'a> {
    encrypted_value: &'a str,
    key_id: &'a str,
}

/// A client for interacting with the GitHub API.
#[derive(Debug)]
pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    /// Creates a new `GitHubClient` wrapping an already-authenticated
    /// `Octocrab` instance.
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Issues a request whose response body is not used, mapping GitHub error
    /// responses into [`Error`].
    ///
    /// Several of the routes used here answer `201`/`204` with an empty or
    /// irrelevant body, so the typed octocrab helpers (which always
    /// deserialize the response) cannot be used for them.
    async fn send_ignoring_body<B: serde::Serialize + ?Sized>(
        &self,
        method: &str,
        route: String,
        body: Option<&B>,
    ) -> Result<(), Error> {
        let response = match method {
            "PUT" => self.client._put(route.clone(), body).await,
            "POST" => self.client._post(route.clone(), body).await,
            "PATCH" => self.client._patch(route.clone(), body).await,
            other => unreachable!("unsupported method {other}"),
        }
        .map_err(|e| Error::from_octocrab(&route, e))?;

        octocrab::map_github_error(response)
            .await
            .map_err(|e| Error::from_octocrab(&route, e))?;
        Ok(())
    }
}

/// Trait describing the remote operations used by repository provisioning and
/// productionalization.
///
/// Implementations must be `Send + Sync` so the orchestrator can hold them
/// behind a shared reference across await points.
#[async_trait]
pub trait ProductionClient: Send + Sync {
    /// Creates a new repository from a template repository.
    async fn create_repository_from_template(
        &self,
        template_owner: &str,
        template_repo: &str,
        payload: &TemplateRepositoryPayload,
    ) -> Result<Repository, Error>;

    /// Creates a new repository within an organization.
    async fn create_org_repository(
        &self,
        org: &str,
        payload: &RepositoryCreatePayload,
    ) -> Result<Repository, Error>;

    /// Creates a new repository for the authenticated user.
    async fn create_user_repository(
        &self,
        payload: &RepositoryCreatePayload,
    ) -> Result<Repository, Error>;

    /// Fetches details for a repository.
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, Error>;

    /// Renames a branch.
    async fn rename_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        new_name: &str,
    ) -> Result<(), Error>;

    /// Grants or updates a team's permission on a repository.
    ///
    /// `permission` must be one of the GitHub role names (`pull`, `triage`,
    /// `push`, `maintain`, `admin`).
    async fn add_team_permission(
        &self,
        org: &str,
        team_slug: &str,
        owner: &str,
        repo: &str,
        permission: &str,
    ) -> Result<(), Error>;

    /// Returns all topics currently set on a repository.
    async fn get_all_topics(&self, owner: &str, repo: &str) -> Result<Vec<String>, Error>;

    /// Replaces the full topic set of a repository.
    async fn replace_all_topics(
        &self,
        owner: &str,
        repo: &str,
        names: &[String],
    ) -> Result<(), Error>;

    /// Resolves a team slug to its numeric id.
    async fn get_team_id(&self, org: &str, team_slug: &str) -> Result<u64, Error>;

    /// Resolves a username to its numeric id.
    async fn get_user_id(&self, username: &str) -> Result<u64, Error>;

    /// Creates or updates a deployment environment.
    async fn create_or_update_environment(
        &self,
        owner: &str,
        repo: &str,
        environment_name: &str,
        payload: &EnvironmentPayload,
    ) -> Result<(), Error>;

    /// Creates a variable in a deployment environment.
    ///
    /// Fails with [`Error::AlreadyExists`] if a variable of that name is
    /// already defined; callers fall back to
    /// [`update_environment_variable`](Self::update_environment_variable).
    async fn create_environment_variable(
        &self,
        owner: &str,
        repo: &str,
        environment_name: &str,
        name: &str,
        value: &str,
    ) -> Result<(), Error>;

    /// Updates an existing variable in a deployment environment.
    async fn update_environment_variable(
        &self,
        owner: &str,
        repo: &str,
        environment_name: &str,
        name: &str,
        value: &str,
    ) -> Result<(), Error>;

    /// Fetches the repository public key used to seal Actions secrets.
    async fn get_repo_public_key(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<RepositoryPublicKey, Error>;

    /// Creates or updates a repository secret from an already-sealed value.
    async fn put_repo_secret(
        &self,
        owner: &str,
        repo: &str,
        secret_name: &str,
        encrypted_value: &str,
        key_id: &str,
    ) -> Result<(), Error>;

    /// Creates a repository ruleset.
    async fn create_repo_ruleset(
        &self,
        owner: &str,
        repo: &str,
        ruleset: &RepositoryRuleset,
    ) -> Result<(), Error>;
}

#[async_trait]
impl ProductionClient for GitHubClient {
    #[instrument(skip(self, payload))]
    async fn create_repository_from_template(
        &self,
        template_owner: &str,
        template_repo: &str,
        payload: &TemplateRepositoryPayload,
    ) -> Result<Repository, Error> {
        let route = format!("/repos/{template_owner}/{template_repo}/generate");
        let repository: Repository = self
            .client
            .post(&route, Some(payload))
            .await
            .map_err(|e| Error::from_octocrab(&route, e))?;
        info!(
            full_name = repository.full_name,
            "Created repository from template"
        );
        Ok(repository)
    }

    async fn create_org_repository(
        &self,
        org: &str,
        payload: &RepositoryCreatePayload,
    ) -> Result<Repository, Error> {
        let route = format!("/orgs/{org}/repos");
        let repository: Repository = self
            .client
            .post(&route, Some(payload))
            .await
            .map_err(|e| Error::from_octocrab(&route, e))?;
        info!(
            full_name = repository.full_name,
            "Created organization repository"
        );
        Ok(repository)
    }

    async fn create_user_repository(
        &self,
        payload: &RepositoryCreatePayload,
    ) -> Result<Repository, Error> {
        let route = "/user/repos";
        let repository: Repository = self
            .client
            .post(route, Some(payload))
            .await
            .map_err(|e| Error::from_octocrab(route, e))?;
        info!(full_name = repository.full_name, "Created user repository");
        Ok(repository)
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, Error> {
        let route = format!("/repos/{owner}/{repo}");
        self.client
            .get(&route, None::<&()>)
            .await
            .map_err(|e| Error::from_octocrab(&route, e))
    }

    async fn rename_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        new_name: &str,
    ) -> Result<(), Error> {
        let route = format!("/repos/{owner}/{repo}/branches/{branch}/rename");
        self.send_ignoring_body("POST", route, Some(&RenameBranchBody { new_name }))
            .await
    }

    async fn add_team_permission(
        &self,
        org: &str,
        team_slug: &str,
        owner: &str,
        repo: &str,
        permission: &str,
    ) -> Result<(), Error> {
        let route = format!("/orgs/{org}/teams/{team_slug}/repos/{owner}/{repo}");
        self.send_ignoring_body("PUT", route, Some(&TeamPermissionBody { permission }))
            .await
    }

    async fn get_all_topics(&self, owner: &str, repo: &str) -> Result<Vec<String>, Error> {
        let route = format!("/repos/{owner}/{repo}/topics");
        let payload: TopicsPayload = self
            .client
            .get(&route, None::<&()>)
            .await
            .map_err(|e| Error::from_octocrab(&route, e))?;
        Ok(payload.names)
    }

    async fn replace_all_topics(
        &self,
        owner: &str,
        repo: &str,
        names: &[String],
    ) -> Result<(), Error> {
        let route = format!("/repos/{owner}/{repo}/topics");
        let body = TopicsPayload {
            names: names.to_vec(),
        };
        let _: TopicsPayload = self
            .client
            .put(&route, Some(&body))
            .await
            .map_err(|e| Error::from_octocrab(&route, e))?;
        Ok(())
    }

    async fn get_team_id(&self, org: &str, team_slug: &str) -> Result<u64, Error> {
        let route = format!("/orgs/{org}/teams/{team_slug}");
        let team: ObjectId = self
            .client
            .get(&route, None::<&()>)
            .await
            .map_err(|e| Error::from_octocrab(&route, e))?;
        debug!(org = org, team_slug = team_slug, id = team.id, "Resolved team id");
        Ok(team.id)
    }

    async fn get_user_id(&self, username: &str) -> Result<u64, Error> {
        let route = format!("/users/{username}");
        let user: ObjectId = self
            .client
            .get(&route, None::<&()>)
            .await
            .map_err(|e| Error::from_octocrab(&route, e))?;
        debug!(username = username, id = user.id, "Resolved user id");
        Ok(user.id)
    }

    async fn create_or_update_environment(
        &self,
        owner: &str,
        repo: &str,
        environment_name: &str,
        payload: &EnvironmentPayload,
    ) -> Result<(), Error> {
        let route = format!("/repos/{owner}/{repo}/environments/{environment_name}");
        self.send_ignoring_body("PUT", route, Some(payload)).await
    }

    async fn create_environment_variable(
        &self,
        owner: &str,
        repo: &str,
        environment_name: &str,
        name: &str,
        value: &str,
    ) -> Result<(), Error> {
        let route = format!("/repos/{owner}/{repo}/environments/{environment_name}/variables");
        self.send_ignoring_body("POST", route, Some(&VariableBody { name, value }))
            .await
    }

    async fn update_environment_variable(
        &self,
        owner: &str,
        repo: &str,
        environment_name: &str,
        name: &str,
        value: &str,
    ) -> Result<(), Error> {
        let route =
            format!("/repos/{owner}/{repo}/environments/{environment_name}/variables/{name}");
        self.send_ignoring_body("PATCH", route, Some(&VariableBody { name, value }))
            .await
    }

    async fn get_repo_public_key(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<RepositoryPublicKey, Error> {
        let route = format!("/repos/{owner}/{repo}/actions/secrets/public-key");
        self.client
            .get(&route, None::<&()>)
            .await
            .map_err(|e| Error::from_octocrab(&route, e))
    }

    async fn put_repo_secret(
        &self,
        owner: &str,
        repo: &str,
        secret_name: &str,
        encrypted_value: &str,
        key_id: &str,
    ) -> Result<(), Error> {
        let route = format!("/repos/{owner}/{repo}/actions/secrets/{secret_name}");
        self.send_ignoring_body(
            "PUT",
            route,
            Some(&SecretBody {
                encrypted_value,
                key_id,
            }),
        )
        .await
    }

    async fn create_repo_ruleset(
        &self,
        owner: &str,
        repo: &str,
        ruleset: &RepositoryRuleset,
    ) -> Result<(), Error> {
        let route = format!("/repos/{owner}/{repo}/rulesets");
        self.send_ignoring_body("POST", route, Some(ruleset)).await
    }
}

/// Creates an `Octocrab` client authenticated with a personal access token.
///
/// # Errors
///
/// Returns [`Error::Auth`] if the client cannot be built.
pub fn create_token_client(token: &str) -> Result<Octocrab, Error> {
    Octocrab::builder()
        .personal_token(token.to_string())
        .build()
        .map_err(|e| Error::Auth(format!("failed to build GitHub client: {e}")))
}
