//! Core logic for provisioning and productionalizing repositories.
//!
//! A run has two phases. Provisioning ([`provisioning::create_repository`])
//! creates the repository and sets its default branch; any failure there is
//! fatal. Productionalization ([`Productionalizer`]) then applies teams,
//! topics, environments, variables, branch protection, and secrets, absorbing
//! per-item failures into a structured [`ProductionalizationResult`].
//! [`run`] wires the two together.

use github_client::ProductionClient;
use tracing::debug;

pub mod errors;
pub use errors::Error;

pub mod naming;
pub mod presets;

pub mod productionalize;
pub use productionalize::{
    EnvironmentError, Productionalizer, ProductionalizationResult, SecretError,
    TeamPermissionOutcome, VariableError,
};

pub mod provisioning;
pub use provisioning::RepositoryRequest;

pub mod sealing;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Outcome of a full run: the created repository, plus the
/// productionalization result when that phase ran.
#[derive(Debug)]
pub struct RunOutcome {
    pub repository: github_client::Repository,
    pub productionalization: Option<ProductionalizationResult>,
}

/// Creates a repository and, when a configuration is supplied, runs the
/// productionalization pass against it.
///
/// # Errors
///
/// Fails only on the provisioning phase (or on a created repository whose
/// full name cannot be split into owner and name); productionalization
/// failures are recorded inside the returned result.
pub async fn run(
    client: &dyn ProductionClient,
    request: &RepositoryRequest,
    config: Option<&config_parser::ProductionalizationConfig>,
) -> Result<RunOutcome, Error> {
    let repository = provisioning::create_repository(client, request).await?;

    let Some(config) = config else {
        debug!(
            full_name = repository.full_name,
            "Productionalization not requested"
        );
        return Ok(RunOutcome {
            repository,
            productionalization: None,
        });
    };

    let (owner, repo) = repository
        .owner_and_name()
        .ok_or_else(|| Error::MalformedFullName {
            full_name: repository.full_name.clone(),
        })?;
    let result = Productionalizer::new(client)
        .productionalize(owner, repo, config)
        .await;

    Ok(RunOutcome {
        repository,
        productionalization: Some(result),
    })
}
