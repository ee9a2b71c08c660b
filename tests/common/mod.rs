use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway home directory handed to mopm through `MOPM_HOME`.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        std::fs::create_dir_all(temp_dir.path().join("home"))?;
        Ok(Self { temp_dir })
    }

    /// The home directory mopm sees
    pub fn home(&self) -> PathBuf {
        self.temp_dir.path().join("home")
    }

    /// Scratch space outside the home, for upstream repositories and lint inputs
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write the repository list file
    pub fn set_repositories(&self, urls: &[&str]) -> Result<()> {
        let mut content = String::from("# test repositories\n");
        for url in urls {
            content.push_str(url);
            content.push('\n');
        }
        std::fs::write(self.home().join(".mopm-repos"), content)?;
        Ok(())
    }
}
