use anyhow::{Context, Result};
use git2::{FetchOptions, Repository, build::RepoBuilder};
use std::path::Path;

/// Clone a repository into `target`, creating parent directories as needed.
pub fn clone_repo(url: &str, target: &Path) -> Result<Repository> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(git2::RemoteCallbacks::new());

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options);

    let repo = builder
        .clone(url, target)
        .with_context(|| format!("Failed to clone {}", url))?;

    Ok(repo)
}

/// Get the current checked out branch name
pub fn current_branch(repo: &Repository) -> Result<String> {
    let head = repo.head().context("Failed to get HEAD reference")?;

    let head_name = head
        .shorthand()
        .ok_or_else(|| anyhow::anyhow!("HEAD is detached"))?;

    Ok(head_name.to_string())
}

/// Fetch origin using its configured refspecs, updating remote-tracking branches
pub fn fetch_origin(repo: &Repository) -> Result<()> {
    let mut remote = repo
        .find_remote("origin")
        .context("Failed to find origin remote")?;

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(git2::RemoteCallbacks::new());

    remote
        .fetch(&[] as &[&str], Some(&mut fetch_options), None)
        .context("Failed to fetch origin")?;

    Ok(())
}

/// Bring the clone at `path` up to date with origin.
///
/// Definition clones are never edited locally, so the current branch is hard
/// reset onto its remote counterpart.
pub fn pull(path: &Path) -> Result<()> {
    let repo = Repository::open(path)
        .with_context(|| format!("Failed to open repository {}", path.display()))?;
    let branch_name = current_branch(&repo)?;

    fetch_origin(&repo)?;

    let remote_branch_name = format!("refs/remotes/origin/{branch_name}");
    let remote_commit = repo
        .find_reference(&remote_branch_name)
        .context("Failed to find remote branch reference")?
        .peel_to_commit()
        .context("Failed to peel remote branch to commit")?;

    repo.reset(remote_commit.as_object(), git2::ResetType::Hard, None)
        .context("Failed to reset to remote commit")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) {
        let workdir = repo.workdir().unwrap().to_path_buf();
        std::fs::write(workdir.join(name), content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = git2::Signature::now("mopm", "mopm@example.com").unwrap();
        let parents: Vec<git2::Commit> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap();
    }

    #[test]
    fn test_clone_then_pull_picks_up_new_commits() {
        let dir = tempfile::tempdir().unwrap();
        let upstream_path = dir.path().join("upstream");
        let upstream = Repository::init(&upstream_path).unwrap();
        commit_file(&upstream, "a.yaml", "first", "first");

        let clone_path = dir.path().join("clones/upstream");
        let url = format!("file://{}", upstream_path.display());
        clone_repo(&url, &clone_path).unwrap();
        assert_eq!(
            std::fs::read_to_string(clone_path.join("a.yaml")).unwrap(),
            "first"
        );

        commit_file(&upstream, "a.yaml", "second", "second");
        pull(&clone_path).unwrap();
        assert_eq!(
            std::fs::read_to_string(clone_path.join("a.yaml")).unwrap(),
            "second"
        );
    }

    #[test]
    fn test_pull_on_missing_repo_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(pull(&dir.path().join("missing")).is_err());
    }
}
