use thiserror::Error;

use super::definition::{Environment, SourceRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("The package does not exist: {0}")]
    PackageNotFound(String),
    #[error("Matched environment does not exist")]
    EnvironmentNotFound,
}

/// Find the environment whose `architecture@platform` equals `machine_id`.
///
/// Sources are searched in the order given and environments in declaration
/// order; the first match wins and later duplicates are ignored.
pub fn resolve<'a>(machine_id: &str, sources: &'a [SourceRecord]) -> Result<&'a Environment, ResolveError> {
    sources
        .iter()
        .flat_map(|record| record.package.environments())
        .find(|env| env.id() == machine_id)
        .ok_or(ResolveError::EnvironmentNotFound)
}
