//! Pure parsing functions turning raw section strings into typed configs.
//!
//! Inputs arrive as strings because the outer surfaces (CLI flags, workflow
//! inputs) only carry strings. Empty or whitespace-only input means the
//! section is absent and parses to an empty collection or `None`.

use std::collections::HashSet;

use secrecy::SecretString;
use serde_json::Value;

use crate::errors::ParseError;
use crate::types::{
    BranchProtectionPreset, EnvironmentConfig, EnvironmentVariables, RepositorySecret,
    ReviewerConfig, ReviewerType, TeamPermission, TeamPermissionConfig, VariableConfig,
};

#[cfg(test)]
#[path = "parsers_tests.rs"]
mod tests;

/// Maximum deployment wait timer GitHub accepts, in minutes (30 days).
const MAX_WAIT_TIMER_MINUTES: u64 = 43_200;

/// Decodes a raw section string into a JSON array.
///
/// Returns `None` when the section is absent (empty or whitespace-only).
fn decode_array(raw: &str, section: &'static str) -> Result<Option<Vec<Value>>, ParseError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(raw).map_err(|e| ParseError::Malformed {
        section,
        reason: e.to_string(),
    })?;
    match value {
        Value::Array(items) => Ok(Some(items)),
        _ => Err(ParseError::NotAnArray { section }),
    }
}

/// Pulls a required string field out of an array element.
///
/// Absent or null fields are missing; present fields of any other type are a
/// type error. Empty strings are accepted here; callers that reject them do
/// so with their own, more specific error.
fn required_string(
    element: &serde_json::Map<String, Value>,
    section: &'static str,
    index: usize,
    field: &str,
) -> Result<String, ParseError> {
    match element.get(field) {
        None | Some(Value::Null) => Err(ParseError::MissingField {
            section,
            index,
            field: field.to_string(),
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ParseError::InvalidFieldType {
            section,
            index,
            field: field.to_string(),
        }),
    }
}

fn as_object<'a>(
    value: &'a Value,
    section: &'static str,
    index: usize,
) -> Result<&'a serde_json::Map<String, Value>, ParseError> {
    value
        .as_object()
        .ok_or(ParseError::NotAnObject { section, index })
}

/// Parses the team permission section.
///
/// Expects a JSON array of `{"teamSlug": ..., "permission": ...}` objects.
/// Permission names are case-sensitive, matching the GitHub REST API.
pub fn parse_team_permissions(raw: &str) -> Result<Vec<TeamPermissionConfig>, ParseError> {
    let section = "team-permissions";
    let Some(items) = decode_array(raw, section)? else {
        return Ok(Vec::new());
    };

    let mut permissions = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let element = as_object(item, section, index)?;
        let team_slug = required_string(element, section, index, "teamSlug")?;
        let raw_permission = required_string(element, section, index, "permission")?;
        let permission =
            TeamPermission::parse(&raw_permission).ok_or_else(|| ParseError::InvalidPermission {
                team_slug: team_slug.clone(),
                value: raw_permission,
            })?;
        permissions.push(TeamPermissionConfig {
            team_slug,
            permission,
        });
    }
    Ok(permissions)
}

/// Parses the repository topics section.
///
/// Accepts either a JSON array of strings or a comma-separated list. In the
/// JSON form, non-string elements are dropped; in the comma form, entries are
/// trimmed and empties dropped.
pub fn parse_topics(raw: &str) -> Result<Vec<String>, ParseError> {
    let section = "repository-topics";
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        let value: Value = serde_json::from_str(trimmed).map_err(|e| ParseError::Malformed {
            section,
            reason: e.to_string(),
        })?;
        let Value::Array(items) = value else {
            return Err(ParseError::NotAnArray { section });
        };
        return Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => {
                    let topic = s.trim().to_string();
                    (!topic.is_empty()).then_some(topic)
                }
                _ => None,
            })
            .collect());
    }

    Ok(trimmed
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect())
}

fn parse_reviewer(
    element: &serde_json::Map<String, Value>,
    environment: &str,
    section: &'static str,
    index: usize,
    position: usize,
) -> Result<ReviewerConfig, ParseError> {
    let type_field = format!("reviewers[{position}].type");
    let slug_field = format!("reviewers[{position}].slug");

    let raw_type = match element.get("type") {
        None | Some(Value::Null) => Err(ParseError::MissingField {
            section,
            index,
            field: type_field.clone(),
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ParseError::InvalidFieldType {
            section,
            index,
            field: type_field,
        }),
    }?;
    let reviewer_type = match raw_type.as_str() {
        "User" => ReviewerType::User,
        "Team" => ReviewerType::Team,
        _ => {
            return Err(ParseError::InvalidReviewerType {
                environment: environment.to_string(),
                value: raw_type,
            })
        }
    };

    let slug = match element.get("slug") {
        None | Some(Value::Null) => Err(ParseError::MissingField {
            section,
            index,
            field: slug_field.clone(),
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ParseError::InvalidFieldType {
            section,
            index,
            field: slug_field,
        }),
    }?;

    Ok(ReviewerConfig {
        reviewer_type,
        slug,
    })
}

/// Parses the deployment environment section.
///
/// Expects a JSON array of environment objects. Names must be unique within
/// one configuration; wait timers must be integers in `0..=43200`.
pub fn parse_environments(raw: &str) -> Result<Vec<EnvironmentConfig>, ParseError> {
    let section = "environments";
    let Some(items) = decode_array(raw, section)? else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    let mut environments = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let element = as_object(item, section, index)?;
        let name = required_string(element, section, index, "name")?;
        if !seen.insert(name.clone()) {
            return Err(ParseError::DuplicateEnvironment { environment: name });
        }

        let wait_timer = match element.get("waitTimer") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => match n.as_u64() {
                Some(minutes) if minutes <= MAX_WAIT_TIMER_MINUTES => Some(minutes as u32),
                _ => {
                    return Err(ParseError::InvalidWaitTimer {
                        environment: name,
                        value: n.to_string(),
                    })
                }
            },
            Some(other) => {
                return Err(ParseError::InvalidWaitTimer {
                    environment: name,
                    value: other.to_string(),
                })
            }
        };

        let reviewers = match element.get("reviewers") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => {
                let mut reviewers = Vec::with_capacity(entries.len());
                for (position, entry) in entries.iter().enumerate() {
                    let reviewer = as_object(entry, section, index)?;
                    reviewers.push(parse_reviewer(reviewer, &name, section, index, position)?);
                }
                reviewers
            }
            Some(_) => {
                return Err(ParseError::InvalidFieldType {
                    section,
                    index,
                    field: "reviewers".to_string(),
                })
            }
        };

        let prevent_self_review = match element.get("preventSelfReview") {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => {
                return Err(ParseError::InvalidPreventSelfReview { environment: name });
            }
        };

        environments.push(EnvironmentConfig {
            name,
            wait_timer,
            reviewers,
            prevent_self_review,
        });
    }
    Ok(environments)
}

/// Parses the environment variable section.
///
/// Expects a JSON array of `{"environmentName": ..., "variables": [...]}`
/// blocks. Each block must carry at least one variable.
pub fn parse_environment_variables(raw: &str) -> Result<Vec<EnvironmentVariables>, ParseError> {
    let section = "environment-variables";
    let Some(items) = decode_array(raw, section)? else {
        return Ok(Vec::new());
    };

    let mut blocks = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let element = as_object(item, section, index)?;
        let environment_name = required_string(element, section, index, "environmentName")?;

        let entries = match element.get("variables") {
            None | Some(Value::Null) => {
                return Err(ParseError::MissingField {
                    section,
                    index,
                    field: "variables".to_string(),
                })
            }
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(ParseError::InvalidFieldType {
                    section,
                    index,
                    field: "variables".to_string(),
                })
            }
        };
        if entries.is_empty() {
            return Err(ParseError::EmptyVariables {
                environment: environment_name,
            });
        }

        let mut variables = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            let variable = as_object(entry, section, index)?;
            let name_field = format!("variables[{position}].name");
            let value_field = format!("variables[{position}].value");
            let name = match variable.get("name") {
                None | Some(Value::Null) => Err(ParseError::MissingField {
                    section,
                    index,
                    field: name_field.clone(),
                }),
                Some(Value::String(s)) => Ok(s.clone()),
                Some(_) => Err(ParseError::InvalidFieldType {
                    section,
                    index,
                    field: name_field,
                }),
            }?;
            let value = match variable.get("value") {
                None | Some(Value::Null) => Err(ParseError::MissingField {
                    section,
                    index,
                    field: value_field.clone(),
                }),
                Some(Value::String(s)) => Ok(s.clone()),
                Some(_) => Err(ParseError::InvalidFieldType {
                    section,
                    index,
                    field: value_field,
                }),
            }?;
            variables.push(VariableConfig { name, value });
        }

        blocks.push(EnvironmentVariables {
            environment_name,
            variables,
        });
    }
    Ok(blocks)
}

/// Parses the repository secret section.
///
/// Expects a JSON array of `{"name": ..., "value": ...}` objects. Values are
/// wrapped in [`SecretString`] immediately so they never appear in debug
/// output downstream.
pub fn parse_secrets(raw: &str) -> Result<Vec<RepositorySecret>, ParseError> {
    let section = "repository-secrets";
    let Some(items) = decode_array(raw, section)? else {
        return Ok(Vec::new());
    };

    let mut secrets = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let element = as_object(item, section, index)?;
        let name = required_string(element, section, index, "name")?;
        let value = required_string(element, section, index, "value")?;
        secrets.push(RepositorySecret {
            name,
            value: SecretString::from(value),
        });
    }
    Ok(secrets)
}

/// Parses the branch protection preset name.
///
/// Empty input means no protection is requested. Matching ignores case and
/// surrounding whitespace.
pub fn parse_branch_protection_preset(
    raw: &str,
) -> Result<Option<BranchProtectionPreset>, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    BranchProtectionPreset::parse(trimmed)
        .map(Some)
        .ok_or_else(|| ParseError::InvalidPreset {
            value: trimmed.to_string(),
        })
}

/// Coerces a string flag into a boolean.
///
/// Accepts `true` and `false` in any case, trimmed. Empty input means the
/// flag was not provided.
pub fn parse_flag(name: &str, raw: &str) -> Result<Option<bool>, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        _ => Err(ParseError::InvalidFlag {
            flag: name.to_string(),
            value: trimmed.to_string(),
        }),
    }
}
