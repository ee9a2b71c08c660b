//! Definition repositories: the list of configured URLs and their local clones.

pub mod config;
pub mod store;

use anyhow::Result;

use crate::common::{MachineContext, paths};
pub use store::{DefinitionSource, RepoStore};

/// Open the repository store configured for this machine's user.
pub fn open_store(machine: &MachineContext) -> Result<RepoStore> {
    let repositories = config::load_repositories(&paths::repositories_file(machine)?)?;
    Ok(RepoStore::new(paths::clones_dir(machine)?, repositories))
}
