use anyhow::Result;
use git2::{Repository, Signature};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::common::TestEnvironment;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

pub fn run_mopm_command(env: &TestEnvironment, args: &[&str]) -> Result<CommandOutput> {
    let output = Command::new(env!("CARGO_BIN_EXE_mopm"))
        .arg("--no-color")
        .args(args)
        .env("MOPM_HOME", env.home())
        .env_remove("SUDO_USER")
        .current_dir(env.path())
        .output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

/// Create a git repository holding `definitions/<name>.yaml` files and return its file:// URL
pub fn create_definition_repo(
    env: &TestEnvironment,
    name: &str,
    definitions: &[(&str, &str)], // (package name, yaml) pairs
) -> Result<String> {
    let repo_path = env.path().join(name);
    let repo = Repository::init(&repo_path)?;
    commit_definitions(&repo, definitions, "add definitions")?;
    Ok(format!("file://{}", repo_path.display()))
}

/// Commit (or overwrite) definition files in an existing repository
pub fn commit_definitions(repo: &Repository, definitions: &[(&str, &str)], message: &str) -> Result<()> {
    let workdir = repo
        .workdir()
        .ok_or_else(|| anyhow::anyhow!("bare repository"))?
        .to_path_buf();
    fs::create_dir_all(workdir.join("definitions"))?;

    let mut index = repo.index()?;
    for (package, yaml) in definitions {
        let relative = PathBuf::from("definitions").join(format!("{}.yaml", package));
        fs::write(workdir.join(&relative), yaml)?;
        index.add_path(&relative)?;
    }
    index.write()?;

    let tree = repo.find_tree(index.write_tree()?)?;
    let sig = Signature::now("mopm test", "test@example.com")?;
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
    Ok(())
}

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

pub fn definition(name: &str, platform: &str, script: &str) -> String {
    format!(
        "name: {name}\n\
         url: https://example.com/{name}\n\
         description: {name} for tests\n\
         environments:\n  \
           - architecture: amd64\n    \
             platform: {platform}\n    \
             dependencies: []\n    \
             verification: test -e /nonexistent/{name}\n    \
             privilege: false\n    \
             script: {script}\n"
    )
}
