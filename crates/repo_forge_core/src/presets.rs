//! Branch protection preset catalog.
//!
//! Each preset maps to a fixed ruleset document parameterized only by the
//! target branch. Unknown preset names are rejected at parse time, so the
//! lookup here is total.

use config_parser::BranchProtectionPreset;
use github_client::{
    PullRequestParameters, RefNameCondition, RepositoryRuleset, Rule, RulesetConditions,
    RulesetEnforcement, RulesetTarget,
};

#[cfg(test)]
#[path = "presets_tests.rs"]
mod tests;

/// Builds the ruleset document for a preset, targeting a single branch.
///
/// The presets differ only in the pull-request rule: `strict` requires two
/// approving reviews with all hygiene checks on, `moderate` requires one with
/// the same checks, `minimal` requires one with all checks off. All three
/// carry a non-fast-forward rule and active enforcement.
pub fn resolve(preset: BranchProtectionPreset, target_branch: &str) -> RepositoryRuleset {
    let parameters = match preset {
        BranchProtectionPreset::Strict => PullRequestParameters {
            dismiss_stale_reviews_on_push: true,
            require_last_push_approval: true,
            required_approving_review_count: 2,
            required_review_thread_resolution: true,
        },
        BranchProtectionPreset::Moderate => PullRequestParameters {
            dismiss_stale_reviews_on_push: true,
            require_last_push_approval: true,
            required_approving_review_count: 1,
            required_review_thread_resolution: true,
        },
        BranchProtectionPreset::Minimal => PullRequestParameters {
            dismiss_stale_reviews_on_push: false,
            require_last_push_approval: false,
            required_approving_review_count: 1,
            required_review_thread_resolution: false,
        },
    };

    RepositoryRuleset {
        name: format!("{preset}-branch-protection"),
        target: RulesetTarget::Branch,
        enforcement: RulesetEnforcement::Active,
        conditions: Some(RulesetConditions {
            ref_name: RefNameCondition {
                include: vec![format!("refs/heads/{target_branch}")],
                exclude: vec![],
            },
        }),
        rules: vec![Rule::PullRequest { parameters }, Rule::NonFastForward],
    }
}
