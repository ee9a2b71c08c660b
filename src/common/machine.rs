use std::fs;
use std::path::Path;

use thiserror::Error;

const OS_RELEASE: &str = "/etc/os-release";

/// Facts about the running machine, captured once per invocation.
///
/// Resolution and privilege decisions only ever look at this value, so tests
/// can hand in whatever machine they like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineContext {
    pub architecture: String,
    pub platform: String,
    /// Whether we are running as root.
    pub privileged: bool,
    /// The user who invoked sudo, if any.
    pub original_user: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path} in spite of the machine running linux: {source}")]
    OsRelease {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Please execute with sudo if you execute mopm by root")]
    RootWithoutSudoUser,
    #[error("unable to determine the home directory of {0}")]
    HomeDirectory(String),
    #[error("package repository url is not found in the file: {0}")]
    NoRepositories(String),
}

impl MachineContext {
    /// Inspect the running process and operating system.
    pub fn detect() -> Result<Self, ConfigError> {
        let platform = detect_platform(std::env::consts::OS, Path::new(OS_RELEASE))?;
        let privileged = matches!(sudo::check(), sudo::RunningAs::Root);
        let original_user = std::env::var("SUDO_USER")
            .ok()
            .filter(|user| !user.trim().is_empty());

        Ok(Self {
            architecture: architecture_name(std::env::consts::ARCH).to_string(),
            platform,
            privileged,
            original_user,
        })
    }

    /// The `architecture@platform` identifier used to pick an environment.
    pub fn env_id(&self) -> String {
        format!("{}@{}", self.architecture, self.platform)
    }
}

/// Map Rust target architecture names to the names used in definition files.
pub fn architecture_name(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}

fn detect_platform(os: &str, os_release: &Path) -> Result<String, ConfigError> {
    match os {
        "linux" => {
            let content =
                fs::read_to_string(os_release).map_err(|source| ConfigError::OsRelease {
                    path: os_release.display().to_string(),
                    source,
                })?;
            Ok(linux_platform(&content))
        }
        "macos" => Ok("darwin".to_string()),
        other => Ok(other.to_string()),
    }
}

/// Build `linux/<distro>` from the NAME field of os-release content.
fn linux_platform(content: &str) -> String {
    let name = content
        .lines()
        .find_map(|line| line.strip_prefix("NAME="))
        .map(|value| value.trim().trim_matches(['"', '\'']).trim().to_lowercase());

    match name {
        Some(distro) if !distro.is_empty() => format!("linux/{}", distro),
        _ => "linux".to_string(),
    }
}

#[cfg(test)]
pub(crate) fn fake_machine(env_id: &str, privileged: bool, original_user: Option<&str>) -> MachineContext {
    let (architecture, platform) = env_id.split_once('@').expect("env id contains @");
    MachineContext {
        architecture: architecture.to_string(),
        platform: platform.to_string(),
        privileged,
        original_user: original_user.map(str::to_string),
    }
}
