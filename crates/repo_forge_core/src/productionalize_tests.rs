//! Tests for the productionalization orchestrator, driven by a fake remote
//! client. Delays between remote calls are virtual (`start_paused`), so the
//! tests run instantly.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use config_parser::{
    BranchProtectionPreset, EnvironmentConfig, EnvironmentVariables, ProductionalizationConfig,
    RepositorySecret, ReviewerConfig, ReviewerType, TeamPermission, TeamPermissionConfig,
    VariableConfig,
};
use github_client::{
    EnvironmentPayload, Error as ClientError, ProductionClient, Repository,
    RepositoryCreatePayload, RepositoryPublicKey, RepositoryRuleset, TemplateRepositoryPayload,
};
use secrecy::SecretString;
use serde_json::json;

use super::*;

/// A 32-byte X25519 public key, base64 encoded, so the sealing path works
/// against the fake.
fn fake_public_key() -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    STANDARD.encode([7u8; 32])
}

/// Fake remote capability. Records every call in order and fails the calls
/// whose key is listed in `failing`.
#[derive(Default)]
struct FakeClient {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    existing_topics: Mutex<Vec<String>>,
    existing_variables: Mutex<HashSet<String>>,
}

impl FakeClient {
    fn new() -> Self {
        Self::default()
    }

    fn fail(self, key: &str) -> Self {
        self.failing.lock().unwrap().insert(key.to_string());
        self
    }

    fn with_topics(self, topics: &[&str]) -> Self {
        *self.existing_topics.lock().unwrap() = topics.iter().map(|t| t.to_string()).collect();
        self
    }

    fn with_existing_variable(self, name: &str) -> Self {
        self.existing_variables
            .lock()
            .unwrap()
            .insert(name.to_string());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, key: &str) -> Result<(), ClientError> {
        if self.failing.lock().unwrap().contains(key) {
            return Err(ClientError::Api {
                message: format!("injected failure for {key}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ProductionClient for FakeClient {
    async fn create_repository_from_template(
        &self,
        _template_owner: &str,
        _template_repo: &str,
        _payload: &TemplateRepositoryPayload,
    ) -> Result<Repository, ClientError> {
        unimplemented!("not used by productionalization")
    }

    async fn create_org_repository(
        &self,
        _org: &str,
        _payload: &RepositoryCreatePayload,
    ) -> Result<Repository, ClientError> {
        unimplemented!("not used by productionalization")
    }

    async fn create_user_repository(
        &self,
        _payload: &RepositoryCreatePayload,
    ) -> Result<Repository, ClientError> {
        unimplemented!("not used by productionalization")
    }

    async fn get_repository(&self, _owner: &str, _repo: &str) -> Result<Repository, ClientError> {
        unimplemented!("not used by productionalization")
    }

    async fn rename_branch(
        &self,
        _owner: &str,
        _repo: &str,
        _branch: &str,
        _new_name: &str,
    ) -> Result<(), ClientError> {
        unimplemented!("not used by productionalization")
    }

    async fn add_team_permission(
        &self,
        _org: &str,
        team_slug: &str,
        _owner: &str,
        _repo: &str,
        permission: &str,
    ) -> Result<(), ClientError> {
        self.record(format!("team:{team_slug}:{permission}"));
        self.check(&format!("team:{team_slug}"))
    }

    async fn get_all_topics(&self, _owner: &str, _repo: &str) -> Result<Vec<String>, ClientError> {
        self.record("topics:get".to_string());
        self.check("topics:get")?;
        Ok(self.existing_topics.lock().unwrap().clone())
    }

    async fn replace_all_topics(
        &self,
        _owner: &str,
        _repo: &str,
        names: &[String],
    ) -> Result<(), ClientError> {
        self.record(format!("topics:put:{}", names.join(",")));
        self.check("topics:put")
    }

    async fn get_team_id(&self, _org: &str, team_slug: &str) -> Result<u64, ClientError> {
        self.record(format!("team-id:{team_slug}"));
        self.check(&format!("team-id:{team_slug}"))?;
        Ok(700)
    }

    async fn get_user_id(&self, username: &str) -> Result<u64, ClientError> {
        self.record(format!("user-id:{username}"));
        self.check(&format!("user-id:{username}"))?;
        Ok(42)
    }

    async fn create_or_update_environment(
        &self,
        _owner: &str,
        _repo: &str,
        environment_name: &str,
        payload: &EnvironmentPayload,
    ) -> Result<(), ClientError> {
        let reviewers = payload
            .reviewers
            .as_ref()
            .map(|reviewers| {
                reviewers
                    .iter()
                    .map(|r| format!("{:?}={}", r.kind, r.id))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default();
        self.record(format!("environment:{environment_name}:[{reviewers}]"));
        self.check(&format!("environment:{environment_name}"))
    }

    async fn create_environment_variable(
        &self,
        _owner: &str,
        _repo: &str,
        environment_name: &str,
        name: &str,
        _value: &str,
    ) -> Result<(), ClientError> {
        self.record(format!("variable:create:{environment_name}:{name}"));
        if self.existing_variables.lock().unwrap().contains(name) {
            return Err(ClientError::AlreadyExists);
        }
        self.check(&format!("variable:{name}"))
    }

    async fn update_environment_variable(
        &self,
        _owner: &str,
        _repo: &str,
        environment_name: &str,
        name: &str,
        _value: &str,
    ) -> Result<(), ClientError> {
        self.record(format!("variable:update:{environment_name}:{name}"));
        self.check(&format!("variable-update:{name}"))
    }

    async fn get_repo_public_key(
        &self,
        _owner: &str,
        _repo: &str,
    ) -> Result<RepositoryPublicKey, ClientError> {
        self.record("public-key".to_string());
        self.check("public-key")?;
        Ok(RepositoryPublicKey {
            key_id: "key-1".to_string(),
            key: fake_public_key(),
        })
    }

    async fn put_repo_secret(
        &self,
        _owner: &str,
        _repo: &str,
        secret_name: &str,
        encrypted_value: &str,
        key_id: &str,
    ) -> Result<(), ClientError> {
        self.record(format!("secret:{secret_name}:{key_id}:{encrypted_value}"));
        self.check(&format!("secret:{secret_name}"))
    }

    async fn create_repo_ruleset(
        &self,
        _owner: &str,
        _repo: &str,
        ruleset: &RepositoryRuleset,
    ) -> Result<(), ClientError> {
        self.record(format!("ruleset:{}", ruleset.name));
        self.check("ruleset")
    }
}

fn team(slug: &str, permission: TeamPermission) -> TeamPermissionConfig {
    TeamPermissionConfig {
        team_slug: slug.to_string(),
        permission,
    }
}

fn environment(name: &str, reviewers: Vec<ReviewerConfig>) -> EnvironmentConfig {
    EnvironmentConfig {
        name: name.to_string(),
        wait_timer: None,
        reviewers,
        prevent_self_review: None,
    }
}

fn variables(environment: &str, names: &[&str]) -> EnvironmentVariables {
    EnvironmentVariables {
        environment_name: environment.to_string(),
        variables: names
            .iter()
            .map(|name| VariableConfig {
                name: name.to_string(),
                value: "v".to_string(),
            })
            .collect(),
    }
}

fn secret(name: &str, value: &str) -> RepositorySecret {
    RepositorySecret {
        name: name.to_string(),
        value: SecretString::from(value.to_string()),
    }
}

#[tokio::test(start_paused = true)]
async fn empty_config_yields_empty_result_without_remote_calls() {
    let client = FakeClient::new();
    let result = Productionalizer::new(&client)
        .productionalize("acme", "widget", &ProductionalizationConfig::default())
        .await;

    assert_eq!(result, ProductionalizationResult::default());
    assert!(client.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn team_outcomes_keep_input_order_and_isolate_failures() {
    let client = FakeClient::new().fail("team:qa");
    let config = ProductionalizationConfig {
        team_permissions: vec![
            team("platform", TeamPermission::Admin),
            team("qa", TeamPermission::Pull),
        ],
        ..Default::default()
    };

    let result = Productionalizer::new(&client)
        .productionalize("acme", "widget", &config)
        .await;

    assert_eq!(result.team_permissions.len(), 2);
    assert_eq!(result.team_permissions[0].team_slug, "platform");
    assert!(result.team_permissions[0].success);
    assert_eq!(result.team_permissions[0].error, None);
    assert_eq!(result.team_permissions[1].team_slug, "qa");
    assert!(!result.team_permissions[1].success);
    assert_eq!(
        result.team_permissions[1].error.as_deref(),
        Some("injected failure for team:qa")
    );
}

#[tokio::test(start_paused = true)]
async fn topics_are_unioned_with_existing_before_replacement() {
    let client = FakeClient::new().with_topics(&["rust", "cli"]);
    let config = ProductionalizationConfig {
        topics: vec!["cli".to_string(), "tooling".to_string()],
        ..Default::default()
    };

    let result = Productionalizer::new(&client)
        .productionalize("acme", "widget", &config)
        .await;

    assert!(result.topics_added);
    assert_eq!(result.topics_error, None);
    assert_eq!(
        client.calls(),
        vec!["topics:get", "topics:put:rust,cli,tooling"]
    );
}

#[tokio::test(start_paused = true)]
async fn topics_fetch_failure_is_recorded_and_skips_replacement() {
    let client = FakeClient::new().fail("topics:get");
    let config = ProductionalizationConfig {
        topics: vec!["rust".to_string()],
        ..Default::default()
    };

    let result = Productionalizer::new(&client)
        .productionalize("acme", "widget", &config)
        .await;

    assert!(!result.topics_added);
    assert_eq!(
        result.topics_error.as_deref(),
        Some("injected failure for topics:get")
    );
    assert_eq!(client.calls(), vec!["topics:get"]);
}

#[tokio::test(start_paused = true)]
async fn environment_reviewers_are_resolved_to_ids() {
    let client = FakeClient::new();
    let config = ProductionalizationConfig {
        environments: vec![environment(
            "production",
            vec![
                ReviewerConfig {
                    reviewer_type: ReviewerType::Team,
                    slug: "release-managers".to_string(),
                },
                ReviewerConfig {
                    reviewer_type: ReviewerType::User,
                    slug: "octocat".to_string(),
                },
            ],
        )],
        ..Default::default()
    };

    let result = Productionalizer::new(&client)
        .productionalize("acme", "widget", &config)
        .await;

    assert_eq!(result.environments_created, vec!["production"]);
    assert!(result.environment_errors.is_empty());
    assert_eq!(
        client.calls(),
        vec![
            "team-id:release-managers",
            "user-id:octocat",
            "environment:production:[Team=700,User=42]",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_reviewer_resolution_fails_the_environment_and_skips_its_variables() {
    let client = FakeClient::new().fail("user-id:ghost");
    let config = ProductionalizationConfig {
        environments: vec![
            environment(
                "production",
                vec![ReviewerConfig {
                    reviewer_type: ReviewerType::User,
                    slug: "ghost".to_string(),
                }],
            ),
            environment("staging", vec![]),
        ],
        environment_variables: vec![
            variables("production", &["logLevel"]),
            variables("staging", &["logLevel"]),
        ],
        ..Default::default()
    };

    let result = Productionalizer::new(&client)
        .productionalize("acme", "widget", &config)
        .await;

    assert_eq!(result.environments_created, vec!["staging"]);
    assert_eq!(result.environment_errors.len(), 1);
    assert_eq!(result.environment_errors[0].environment, "production");
    assert!(!result.environment_errors[0].success);
    assert_eq!(
        result.environment_errors[0].error,
        "injected failure for user-id:ghost"
    );

    // No create call for the failed environment, and no variable call either.
    let calls = client.calls();
    assert!(!calls.iter().any(|call| call.starts_with("environment:production")));
    assert!(!calls.iter().any(|call| call.contains(":production:LOG_LEVEL")));
    assert!(calls.contains(&"variable:create:staging:LOG_LEVEL".to_string()));
    assert_eq!(result.variables_created, 1);
    assert!(result.variable_errors.is_empty());
}

#[tokio::test(start_paused = true)]
async fn variable_names_are_normalized_and_existing_ones_are_updated() {
    let client = FakeClient::new().with_existing_variable("API_KEY");
    let config = ProductionalizationConfig {
        environments: vec![environment("production", vec![])],
        environment_variables: vec![variables("production", &["apiKey", "log-level"])],
        ..Default::default()
    };

    let result = Productionalizer::new(&client)
        .productionalize("acme", "widget", &config)
        .await;

    assert_eq!(result.variables_created, 2);
    assert!(result.variable_errors.is_empty());
    let calls = client.calls();
    assert!(calls.contains(&"variable:create:production:API_KEY".to_string()));
    assert!(calls.contains(&"variable:update:production:API_KEY".to_string()));
    assert!(calls.contains(&"variable:create:production:LOG_LEVEL".to_string()));
    assert!(!calls.iter().any(|call| call.contains("LOG_LEVEL") && call.contains("update")));
}

#[tokio::test(start_paused = true)]
async fn variable_failures_are_tagged_with_the_normalized_name() {
    let client = FakeClient::new().fail("variable:DB_PASSWORD");
    let config = ProductionalizationConfig {
        environments: vec![environment("production", vec![])],
        environment_variables: vec![variables("production", &["dbPassword", "region"])],
        ..Default::default()
    };

    let result = Productionalizer::new(&client)
        .productionalize("acme", "widget", &config)
        .await;

    assert_eq!(result.variables_created, 1);
    assert_eq!(result.variable_errors.len(), 1);
    assert_eq!(result.variable_errors[0].environment, "production");
    assert_eq!(result.variable_errors[0].variable, "DB_PASSWORD");
    assert!(!result.variable_errors[0].success);
}

#[tokio::test(start_paused = true)]
async fn variables_for_unconfigured_environments_are_still_attempted() {
    // The remote platform is the authority on whether the environment
    // exists; only locally-failed environments are skipped.
    let client = FakeClient::new();
    let config = ProductionalizationConfig {
        environment_variables: vec![variables("preexisting", &["logLevel"])],
        ..Default::default()
    };

    let result = Productionalizer::new(&client)
        .productionalize("acme", "widget", &config)
        .await;

    assert_eq!(result.variables_created, 1);
    assert_eq!(
        client.calls(),
        vec!["variable:create:preexisting:LOG_LEVEL"]
    );
}

#[tokio::test(start_paused = true)]
async fn branch_protection_uses_the_preset_and_configured_branch() {
    let client = FakeClient::new();
    let config = ProductionalizationConfig {
        branch_protection_preset: Some(BranchProtectionPreset::Strict),
        branch_protection_target_branch: Some("develop".to_string()),
        ..Default::default()
    };

    let result = Productionalizer::new(&client)
        .productionalize("acme", "widget", &config)
        .await;

    assert!(result.branch_protection_created);
    assert_eq!(result.branch_protection_error, None);
    assert_eq!(client.calls(), vec!["ruleset:strict-branch-protection"]);
}

#[tokio::test(start_paused = true)]
async fn branch_protection_failure_is_recorded() {
    let client = FakeClient::new().fail("ruleset");
    let config = ProductionalizationConfig {
        branch_protection_preset: Some(BranchProtectionPreset::Minimal),
        ..Default::default()
    };

    let result = Productionalizer::new(&client)
        .productionalize("acme", "widget", &config)
        .await;

    assert!(!result.branch_protection_created);
    assert_eq!(
        result.branch_protection_error.as_deref(),
        Some("injected failure for ruleset")
    );
}

#[tokio::test(start_paused = true)]
async fn secrets_are_sealed_before_upload() {
    let client = FakeClient::new();
    let config = ProductionalizationConfig {
        secrets: vec![secret("API_TOKEN", "hunter2"), secret("DB_PASSWORD", "s3cret")],
        ..Default::default()
    };

    let result = Productionalizer::new(&client)
        .productionalize("acme", "widget", &config)
        .await;

    assert_eq!(result.secrets_created, 2);
    assert!(result.secret_errors.is_empty());

    let calls = client.calls();
    assert_eq!(calls[0], "public-key");
    let uploads: Vec<&String> = calls.iter().filter(|c| c.starts_with("secret:")).collect();
    assert_eq!(uploads.len(), 2);
    for upload in uploads {
        assert!(upload.contains(":key-1:"));
        // The recorded payload is the sealed ciphertext, never the plaintext.
        assert!(!upload.contains("hunter2"));
        assert!(!upload.contains("s3cret"));
    }
}

#[tokio::test(start_paused = true)]
async fn public_key_fetch_failure_abandons_the_secrets_stage() {
    let client = FakeClient::new().fail("public-key");
    let config = ProductionalizationConfig {
        secrets: vec![secret("API_TOKEN", "hunter2")],
        ..Default::default()
    };

    let result = Productionalizer::new(&client)
        .productionalize("acme", "widget", &config)
        .await;

    assert_eq!(result.secrets_created, 0);
    assert!(result.secret_errors.is_empty(), "stage failure is not per-item");
    assert_eq!(client.calls(), vec!["public-key"]);
}

#[tokio::test(start_paused = true)]
async fn secret_upload_failure_is_recorded_per_secret() {
    let client = FakeClient::new().fail("secret:API_TOKEN");
    let config = ProductionalizationConfig {
        secrets: vec![secret("API_TOKEN", "hunter2"), secret("REGION", "eu")],
        ..Default::default()
    };

    let result = Productionalizer::new(&client)
        .productionalize("acme", "widget", &config)
        .await;

    assert_eq!(result.secrets_created, 1);
    assert_eq!(result.secret_errors.len(), 1);
    assert_eq!(result.secret_errors[0].secret, "API_TOKEN");
    assert!(!result.secret_errors[0].success);
    assert_eq!(
        result.secret_errors[0].error,
        "injected failure for secret:API_TOKEN"
    );
}

#[tokio::test(start_paused = true)]
async fn stages_run_in_the_fixed_order() {
    let client = FakeClient::new();
    let config = ProductionalizationConfig {
        team_permissions: vec![team("platform", TeamPermission::Push)],
        topics: vec!["rust".to_string()],
        environments: vec![environment("production", vec![])],
        environment_variables: vec![variables("production", &["logLevel"])],
        branch_protection_preset: Some(BranchProtectionPreset::Moderate),
        branch_protection_target_branch: None,
        secrets: vec![secret("API_TOKEN", "hunter2")],
    };

    let result = Productionalizer::new(&client)
        .productionalize("acme", "widget", &config)
        .await;

    assert_eq!(result.variables_created, 1);
    assert!(result.branch_protection_created);
    assert_eq!(result.secrets_created, 1);

    let stages: Vec<String> = client
        .calls()
        .iter()
        .map(|call| call.split(':').next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        stages,
        vec![
            "team",
            "topics",
            "topics",
            "environment",
            "variable",
            "ruleset",
            "public-key",
            "secret",
        ]
    );
}

#[test]
fn result_serializes_in_camel_case_with_explicit_failure_markers() {
    let result = ProductionalizationResult {
        team_permissions: vec![TeamPermissionOutcome {
            team_slug: "qa".to_string(),
            success: false,
            error: Some("boom".to_string()),
        }],
        topics_added: true,
        topics_error: None,
        environments_created: vec!["production".to_string()],
        environment_errors: vec![EnvironmentError {
            environment: "staging".to_string(),
            success: false,
            error: "boom".to_string(),
        }],
        variables_created: 3,
        variable_errors: vec![],
        branch_protection_created: false,
        branch_protection_error: Some("boom".to_string()),
        secrets_created: 1,
        secret_errors: vec![SecretError {
            secret: "API_TOKEN".to_string(),
            success: false,
            error: "boom".to_string(),
        }],
    };

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({
            "teamPermissions": [
                { "teamSlug": "qa", "success": false, "error": "boom" }
            ],
            "topicsAdded": true,
            "environmentsCreated": ["production"],
            "environmentErrors": [
                { "environment": "staging", "success": false, "error": "boom" }
            ],
            "variablesCreated": 3,
            "variableErrors": [],
            "branchProtectionCreated": false,
            "branchProtectionError": "boom",
            "secretsCreated": 1,
            "secretErrors": [
                { "secret": "API_TOKEN", "success": false, "error": "boom" }
            ]
        })
    );
}
