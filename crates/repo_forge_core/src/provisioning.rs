//! Repository creation and default-branch setup.

use github_client::{
    ProductionClient, Repository, RepositoryCreatePayload, TemplateRepositoryPayload,
};
use tracing::{debug, info};

use crate::errors::Error;

#[cfg(test)]
#[path = "provisioning_tests.rs"]
mod tests;

/// Validated input for creating one repository.
///
/// When `template` is set the repository is generated from that template and
/// the `auto_init`/`gitignore_template`/`license_template` fields are ignored
/// (the template's content wins). Otherwise the repository is created fresh,
/// inside `organization` when set or under the authenticated user.
#[derive(Debug, Clone, Default)]
pub struct RepositoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub private: Option<bool>,
    /// Template reference as `owner/repo`
    pub template: Option<String>,
    pub organization: Option<String>,
    pub auto_init: Option<bool>,
    pub gitignore_template: Option<String>,
    pub license_template: Option<String>,
    /// Desired default branch; triggers a rename when it differs from the
    /// branch the platform assigned
    pub default_branch: Option<String>,
}

/// Creates the repository described by `request` and, when asked, renames its
/// default branch.
///
/// # Errors
///
/// Any remote failure on this path is fatal and aborts the run; see [`Error`].
pub async fn create_repository(
    client: &dyn ProductionClient,
    request: &RepositoryRequest,
) -> Result<Repository, Error> {
    let repository = if let Some(template) = &request.template {
        create_from_template(client, request, template).await?
    } else {
        create_fresh(client, request).await?
    };
    info!(
        full_name = repository.full_name,
        id = repository.id,
        "Repository created"
    );

    if let Some(desired) = &request.default_branch {
        ensure_default_branch(client, &repository, desired).await?;
    }
    Ok(repository)
}

async fn create_from_template(
    client: &dyn ProductionClient,
    request: &RepositoryRequest,
    template: &str,
) -> Result<Repository, Error> {
    let (template_owner, template_repo) = template
        .split_once('/')
        .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty())
        .ok_or_else(|| Error::InvalidTemplateFormat {
            value: template.to_string(),
        })?;

    let payload = TemplateRepositoryPayload {
        owner: request.organization.clone(),
        name: request.name.clone(),
        description: request.description.clone(),
        private: request.private,
    };
    client
        .create_repository_from_template(template_owner, template_repo, &payload)
        .await
        .map_err(|source| Error::CreateRepository { source })
}

async fn create_fresh(
    client: &dyn ProductionClient,
    request: &RepositoryRequest,
) -> Result<Repository, Error> {
    let payload = RepositoryCreatePayload {
        name: request.name.clone(),
        description: request.description.clone(),
        private: request.private,
        auto_init: request.auto_init,
        gitignore_template: request.gitignore_template.clone(),
        license_template: request.license_template.clone(),
    };
    let result = match &request.organization {
        Some(org) => client.create_org_repository(org, &payload).await,
        None => client.create_user_repository(&payload).await,
    };
    result.map_err(|source| Error::CreateRepository { source })
}

/// Renames the platform-assigned default branch to `desired` when they
/// differ. The creation response does not always carry the default branch, so
/// it is fetched on demand.
async fn ensure_default_branch(
    client: &dyn ProductionClient,
    repository: &Repository,
    desired: &str,
) -> Result<(), Error> {
    let (owner, repo) = repository
        .owner_and_name()
        .ok_or_else(|| Error::MalformedFullName {
            full_name: repository.full_name.clone(),
        })?;

    let current = match &repository.default_branch {
        Some(branch) => branch.clone(),
        None => client
            .get_repository(owner, repo)
            .await
            .map_err(|source| Error::LookupRepository {
                full_name: repository.full_name.clone(),
                source,
            })?
            .default_branch
            .unwrap_or_default(),
    };

    if current.is_empty() || current == desired {
        debug!(branch = desired, "Default branch already in place");
        return Ok(());
    }

    client
        .rename_branch(owner, repo, &current, desired)
        .await
        .map_err(|source| Error::RenameBranch {
            branch: current.clone(),
            new_name: desired.to_string(),
            source,
        })?;
    info!(from = current, to = desired, "Renamed default branch");
    Ok(())
}
