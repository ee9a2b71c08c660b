//! Validation rules for package definitions.
//!
//! Rules are checked in a fixed order and the first violation is reported, so a
//! given malformed file always produces the same message.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::definition::{Environment, PackageManifest};

/// Architectures a definition may target.
pub const ARCHITECTURES: &[&str] = &["amd64"];

/// Platforms a definition may target.
pub const PLATFORMS: &[&str] = &["darwin", "linux/ubuntu"];

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[0-9a-z\-]+$").expect("valid identifier regex");
    static ref HTTP_URL: Regex = Regex::new(r"^https?://").expect("valid url regex");
}

/// True if `name` is a valid package or dependency identifier.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LintRule {
    #[error("Package name must consist of a-z, 0-9 and -(hyphen) characters")]
    Name,
    #[error("Package url must start with http(s)://")]
    Url,
    #[error("Package description must not be empty")]
    Description,
    #[error("Package environments must not be empty")]
    Environments,
    #[error("Package architecture must be one of: {}", ARCHITECTURES.join(", "))]
    Architecture,
    #[error("Package platform must be one of: {}", PLATFORMS.join(", "))]
    Platform,
    #[error("Package dependencies must consist of a-z, 0-9 and -(hyphen) characters")]
    Dependencies,
    #[error("Package verification must not be empty")]
    Verification,
    #[error("Package script must not be empty")]
    Script,
}

/// The first rule a definition breaks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{rule}{}", environment_suffix(.environment))]
pub struct ValidationError {
    pub rule: LintRule,
    /// Zero-based index of the offending environment, for environment rules.
    pub environment: Option<usize>,
}

fn environment_suffix(environment: &Option<usize>) -> String {
    environment
        .map(|index| format!(" (environment #{})", index))
        .unwrap_or_default()
}

impl ValidationError {
    fn package(rule: LintRule) -> Self {
        Self {
            rule,
            environment: None,
        }
    }
}

pub fn validate(manifest: &PackageManifest) -> Result<(), ValidationError> {
    if !is_identifier(&manifest.name) {
        return Err(ValidationError::package(LintRule::Name));
    }
    if !HTTP_URL.is_match(&manifest.url) {
        return Err(ValidationError::package(LintRule::Url));
    }
    if manifest.description.is_empty() {
        return Err(ValidationError::package(LintRule::Description));
    }
    if manifest.environments.is_empty() {
        return Err(ValidationError::package(LintRule::Environments));
    }
    for (index, env) in manifest.environments.iter().enumerate() {
        validate_environment(env).map_err(|rule| ValidationError {
            rule,
            environment: Some(index),
        })?;
    }
    Ok(())
}

fn validate_environment(env: &Environment) -> Result<(), LintRule> {
    if !ARCHITECTURES.contains(&env.architecture.as_str()) {
        return Err(LintRule::Architecture);
    }
    if !PLATFORMS.contains(&env.platform.as_str()) {
        return Err(LintRule::Platform);
    }
    if !env.dependencies.iter().all(|dep| is_identifier(dep)) {
        return Err(LintRule::Dependencies);
    }
    if env.verification.is_empty() {
        return Err(LintRule::Verification);
    }
    if env.script.is_empty() {
        return Err(LintRule::Script);
    }
    Ok(())
}
