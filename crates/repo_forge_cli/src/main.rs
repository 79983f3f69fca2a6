//! repo-forge CLI: create a repository and apply productionalization policy.
//!
//! All configuration sections arrive as raw strings (boolean flags included,
//! as `"true"`/`"false"`), matching the shapes accepted by other invocation
//! surfaces such as workflow inputs. Parsing happens up front; no remote call
//! is made for malformed input.

use anyhow::Context;
use clap::{Parser, Subcommand};
use config_parser::{ParseError, ProductionalizationConfig};
use github_client::GitHubClient;
use repo_forge_core::{RepositoryRequest, RunOutcome};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

/// repo-forge CLI: provision and productionalize GitHub repositories
#[derive(Parser)]
#[command(name = "repo-forge")]
#[command(about = "Provision and productionalize GitHub repositories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new repository and optionally productionalize it
    Create(CreateArgs),

    /// Show the CLI version
    Version,
}

#[derive(Debug, Default, clap::Args)]
struct CreateArgs {
    /// Name of the repository to create
    #[arg(long)]
    name: String,

    /// Repository description
    #[arg(long, default_value = "")]
    description: String,

    /// Whether the repository is private ("true"/"false")
    #[arg(long, default_value = "")]
    private: String,

    /// Template repository to generate from, as owner/repo
    #[arg(long, default_value = "")]
    template: String,

    /// Organization to create the repository in; defaults to the
    /// authenticated user
    #[arg(long, default_value = "")]
    organization: String,

    /// Initialize with an empty commit ("true"/"false"); ignored with a
    /// template
    #[arg(long, default_value = "")]
    auto_init: String,

    /// Gitignore template name; ignored with a template
    #[arg(long, default_value = "")]
    gitignore_template: String,

    /// License template name; ignored with a template
    #[arg(long, default_value = "")]
    license_template: String,

    /// Default branch; renamed after creation when it differs
    #[arg(long, default_value = "")]
    default_branch: String,

    /// Run the productionalization pass ("true"/"false")
    #[arg(long, default_value = "")]
    productionalize: String,

    /// Team permissions as a JSON array of {teamSlug, permission}
    #[arg(long, default_value = "")]
    team_permissions: String,

    /// Topics as a comma-separated list or JSON array of strings
    #[arg(long, default_value = "")]
    topics: String,

    /// Deployment environments as a JSON array
    #[arg(long, default_value = "")]
    environments: String,

    /// Environment variables as a JSON array of {environmentName, variables}
    #[arg(long, default_value = "")]
    environment_variables: String,

    /// Branch protection preset: strict, moderate, or minimal
    #[arg(long, default_value = "")]
    branch_protection_preset: String,

    /// Branch the protection ruleset targets; defaults to main
    #[arg(long, default_value = "")]
    branch_protection_target_branch: String,

    /// Repository secrets as a JSON array of {name, value}
    #[arg(long, default_value = "")]
    secrets: String,

    /// Personal access token used to authenticate
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,
}

fn optional(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Builds the creation request from raw flags. Fails fast on malformed
/// boolean strings.
fn build_request(args: &CreateArgs) -> Result<RepositoryRequest, ParseError> {
    Ok(RepositoryRequest {
        name: args.name.clone(),
        description: optional(&args.description),
        private: config_parser::parse_flag("private", &args.private)?,
        template: optional(&args.template),
        organization: optional(&args.organization),
        auto_init: config_parser::parse_flag("autoInit", &args.auto_init)?,
        gitignore_template: optional(&args.gitignore_template),
        license_template: optional(&args.license_template),
        default_branch: optional(&args.default_branch),
    })
}

/// Builds the productionalization config, or `None` when the gating flag is
/// absent or false.
fn build_config(args: &CreateArgs) -> Result<Option<ProductionalizationConfig>, ParseError> {
    if config_parser::parse_flag("productionalize", &args.productionalize)? != Some(true) {
        return Ok(None);
    }
    Ok(Some(ProductionalizationConfig {
        team_permissions: config_parser::parse_team_permissions(&args.team_permissions)?,
        topics: config_parser::parse_topics(&args.topics)?,
        environments: config_parser::parse_environments(&args.environments)?,
        environment_variables: config_parser::parse_environment_variables(
            &args.environment_variables,
        )?,
        branch_protection_preset: config_parser::parse_branch_protection_preset(
            &args.branch_protection_preset,
        )?,
        branch_protection_target_branch: optional(&args.branch_protection_target_branch),
        secrets: config_parser::parse_secrets(&args.secrets)?,
    }))
}

async fn execute_create(args: &CreateArgs) -> anyhow::Result<RunOutcome> {
    let request = build_request(args)?;
    let config = build_config(args)?;

    let octocrab =
        github_client::create_token_client(&args.token).context("authentication failed")?;
    let client = GitHubClient::new(octocrab);

    repo_forge_core::run(&client, &request, config.as_ref())
        .await
        .context("repository creation failed")
}

fn print_outcome(outcome: &RunOutcome) -> anyhow::Result<()> {
    println!("Repository created: {}", outcome.repository.html_url);
    println!("Full name: {}", outcome.repository.full_name);
    println!("Repository id: {}", outcome.repository.id);
    if let Some(result) = &outcome.productionalization {
        println!("{}", serde_json::to_string_pretty(result)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_env("REPO_FORGE_LOG"))
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Create(args) => {
            let result = execute_create(args)
                .await
                .and_then(|outcome| print_outcome(&outcome));
            if let Err(e) = result {
                eprintln!("Error: {e:#}");
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("repo-forge version {}", env!("CARGO_PKG_VERSION"));
        }
    }
}
