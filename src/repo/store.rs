use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::common::git;
use crate::package::SourceRecord;
use crate::ui::prelude::*;

/// Produces the definition files available for a package name.
pub trait DefinitionSource {
    /// Valid records for `name`, in repository priority order.
    fn load(&self, name: &str) -> Result<Vec<SourceRecord>>;
}

/// Directory name of a repository clone: scheme and `.git` suffix stripped.
pub fn repo_dir_name(url: &str) -> &str {
    let stripped = url.strip_prefix("http://").unwrap_or(url);
    let stripped = stripped.strip_prefix("https://").unwrap_or(stripped);
    let stripped = stripped.strip_suffix(".git").unwrap_or(stripped);
    stripped.trim_start_matches('/')
}

/// The local clones of the configured definition repositories.
#[derive(Debug, Clone)]
pub struct RepoStore {
    clones_dir: PathBuf,
    repositories: Vec<String>,
}

impl RepoStore {
    pub fn new(clones_dir: PathBuf, repositories: Vec<String>) -> Self {
        Self {
            clones_dir,
            repositories,
        }
    }

    pub fn repositories(&self) -> &[String] {
        &self.repositories
    }

    pub fn local_path(&self, url: &str) -> PathBuf {
        self.clones_dir.join(repo_dir_name(url))
    }

    pub fn definition_path(&self, url: &str, name: &str) -> PathBuf {
        self.local_path(url)
            .join("definitions")
            .join(format!("{}.yaml", name))
    }

    /// Clone missing repositories and pull existing ones, in order.
    /// The first failure stops the update.
    pub fn update(&self) -> Result<()> {
        for url in &self.repositories {
            let path = self.local_path(url);
            if path.exists() {
                emit(
                    Level::Info,
                    "repo.pull",
                    &format!("Pull {}", url),
                    Some(serde_json::json!({ "url": url, "path": path.display().to_string() })),
                );
                git::pull(&path).with_context(|| format!("updating {}", url))?;
            } else {
                emit(
                    Level::Info,
                    "repo.clone",
                    &format!("Directory does not exist: {}\nClone {}", path.display(), url),
                    Some(serde_json::json!({ "url": url, "path": path.display().to_string() })),
                );
                git::clone_repo(url, &path)?;
            }
        }
        Ok(())
    }
}

impl DefinitionSource for RepoStore {
    fn load(&self, name: &str) -> Result<Vec<SourceRecord>> {
        let mut records = Vec::new();
        for url in &self.repositories {
            let path = self.definition_path(url, name);
            if let Some(record) = read_if_valid(&path) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

/// Missing files are skipped quietly; files that fail to parse or validate are
/// skipped with a warning so that one broken repository does not hide the others.
fn read_if_valid(path: &Path) -> Option<SourceRecord> {
    if !path.is_file() {
        emit(
            Level::Debug,
            "source.missing",
            &format!("No definition at {}", path.display()),
            None,
        );
        return None;
    }

    match SourceRecord::read(path) {
        Ok(record) => Some(record),
        Err(err) => {
            emit(
                Level::Warn,
                "source.skipped",
                &format!("Skipping {}: {:#}", path.display(), err),
                Some(serde_json::json!({
                    "path": path.display().to_string(),
                    "error": format!("{:#}", err),
                })),
            );
            None
        }
    }
}
