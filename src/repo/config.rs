use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::common::ConfigError;
use crate::ui::prelude::*;

pub const DEFAULT_REPOSITORY: &str = "https://github.com/basd4g/mopm-defs.git";

/// Parse the repository list: one URL per line, blank lines and `#` comments skipped.
pub fn parse_repositories(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Load the repository list, writing the default one first if the file is missing.
pub fn load_repositories(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        emit(
            Level::Info,
            "repo.list.created",
            &format!("Create the file because it does not exist: {}", path.display()),
            Some(serde_json::json!({ "path": path.display().to_string() })),
        );
        fs::write(path, format!("{}\n", DEFAULT_REPOSITORY))
            .with_context(|| format!("writing default repository list to {}", path.display()))?;
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("reading repository list {}", path.display()))?;
    let repos = parse_repositories(&content);
    if repos.is_empty() {
        return Err(ConfigError::NoRepositories(path.display().to_string()).into());
    }
    Ok(repos)
}
