use std::path::PathBuf;

use super::machine::{ConfigError, MachineContext};

/// Overrides the home directory used for the repository list and clones.
pub const HOME_ENV: &str = "MOPM_HOME";

/// Home directory of the user mopm acts for.
///
/// When running through sudo this is the invoking user's home, so that root and
/// the user share the same repository list and clones.
pub fn home_dir(machine: &MachineContext) -> Result<PathBuf, ConfigError> {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|h| !h.is_empty()) {
        return Ok(PathBuf::from(home));
    }

    if !machine.privileged {
        return dirs::home_dir()
            .ok_or_else(|| ConfigError::HomeDirectory("the current user".to_string()));
    }

    let user_name = machine
        .original_user
        .as_deref()
        .ok_or(ConfigError::RootWithoutSudoUser)?;
    let user = nix::unistd::User::from_name(user_name)
        .ok()
        .flatten()
        .ok_or_else(|| ConfigError::HomeDirectory(user_name.to_string()))?;
    Ok(user.dir)
}

/// File listing the definition repositories, one URL per line.
pub fn repositories_file(machine: &MachineContext) -> Result<PathBuf, ConfigError> {
    Ok(home_dir(machine)?.join(".mopm-repos"))
}

/// Directory holding one clone per definition repository.
pub fn clones_dir(machine: &MachineContext) -> Result<PathBuf, ConfigError> {
    Ok(home_dir(machine)?.join(".mopm"))
}
