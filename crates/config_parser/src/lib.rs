//! Validation and normalization of raw productionalization inputs.
//!
//! Each configuration section arrives as a raw string from an external
//! surface (CLI flag, workflow input) and is decoded into a typed structure
//! by one pure function in [`parsers`]. Decoding never performs I/O and fails
//! fast with an error naming the section, the element position, and the
//! offending value, so a misconfigured run is rejected before any remote call
//! is made.

pub mod errors;
pub use errors::ParseError;

pub mod parsers;
pub use parsers::{
    parse_branch_protection_preset, parse_environment_variables, parse_environments, parse_flag,
    parse_secrets, parse_team_permissions, parse_topics,
};

pub mod types;
pub use types::{
    BranchProtectionPreset, EnvironmentConfig, EnvironmentVariables, ProductionalizationConfig,
    RepositorySecret, ReviewerConfig, ReviewerType, TeamPermission, TeamPermissionConfig,
    VariableConfig,
};
