//! Package definition files and the validated data model built from them.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use super::lint::{self, ValidationError};

/// One (architecture, platform) recipe inside a package definition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    pub architecture: String,
    pub platform: String,
    pub dependencies: Vec<String>,
    pub verification: String,
    pub privilege: bool,
    pub script: String,
}

impl Environment {
    /// The `architecture@platform` identifier matched against the machine.
    pub fn id(&self) -> String {
        format!("{}@{}", self.architecture, self.platform)
    }
}

/// A definition file exactly as it was deserialized.
///
/// Missing keys deserialize to their empty value so that the validator, not the
/// YAML parser, decides which rule a malformed file breaks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackageManifest {
    pub name: String,
    pub url: String,
    pub description: String,
    pub environments: Vec<Environment>,
}

impl PackageManifest {
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }
}

/// A package definition that passed validation.
///
/// The only way to obtain one is [`PackageDefinition::from_manifest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDefinition {
    name: String,
    url: String,
    description: String,
    environments: Vec<Environment>,
}

impl PackageDefinition {
    pub fn from_manifest(manifest: PackageManifest) -> Result<Self, ValidationError> {
        lint::validate(&manifest)?;
        Ok(Self {
            name: manifest.name,
            url: manifest.url,
            description: manifest.description,
            environments: manifest.environments,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Environments in declaration order.
    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }
}

/// A validated definition together with the file it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRecord {
    pub package: PackageDefinition,
    pub path: PathBuf,
}

impl SourceRecord {
    /// Read, parse and validate a definition file.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("The package does not exist: {}", path.display()))?;
        let manifest = PackageManifest::from_yaml(&content)
            .with_context(|| format!("Failed to parse yaml file: {}", path.display()))?;
        let package = PackageDefinition::from_manifest(manifest)?;
        Ok(Self {
            package,
            path: path.to_path_buf(),
        })
    }

    /// Render the record for `search`, highlighting the environment matching `machine_id`.
    pub fn display_for<'a>(&'a self, machine_id: &'a str) -> RecordDisplay<'a> {
        RecordDisplay {
            record: self,
            machine_id,
        }
    }
}

pub struct RecordDisplay<'a> {
    record: &'a SourceRecord,
    machine_id: &'a str,
}

impl fmt::Display for RecordDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pkg = &self.record.package;
        writeln!(f, "path:         {}", self.record.path.display())?;
        writeln!(f, "name:         {}", pkg.name())?;
        writeln!(f, "url:          {}", pkg.url())?;
        writeln!(f, "description:  {}", pkg.description())?;
        write!(f, "environments: ")?;
        for (i, env) in pkg.environments().iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            let mut label = env.id();
            if env.privilege {
                label.push_str("(need privilege)");
            }
            if env.id() == self.machine_id {
                write!(f, "{}", label.green())?;
            } else {
                write!(f, "{}", label)?;
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const DOCKER: &str = r#"
name: docker
url: https://www.docker.com/
description: container runtime
environments:
  - architecture: amd64
    platform: linux/ubuntu
    dependencies: [curl]
    verification: which docker
    privilege: true
    script: |
      curl -fsSL https://get.docker.com | sh
  - architecture: amd64
    platform: darwin
    verification: which docker
    script: brew install --cask docker
"#;

    #[test]
    fn test_parse_full_definition() {
        let manifest = PackageManifest::from_yaml(DOCKER).unwrap();
        let pkg = PackageDefinition::from_manifest(manifest).unwrap();
        assert_eq!(pkg.name(), "docker");
        assert_eq!(pkg.environments().len(), 2);

        let ubuntu = &pkg.environments()[0];
        assert_eq!(ubuntu.id(), "amd64@linux/ubuntu");
        assert_eq!(ubuntu.dependencies, vec!["curl".to_string()]);
        assert!(ubuntu.privilege);

        let darwin = &pkg.environments()[1];
        assert!(darwin.dependencies.is_empty());
        assert!(!darwin.privilege);
    }

    #[test]
    fn test_missing_keys_become_empty() {
        let manifest = PackageManifest::from_yaml("name: tool\n").unwrap();
        assert_eq!(manifest.name, "tool");
        assert!(manifest.url.is_empty());
        assert!(manifest.description.is_empty());
        assert!(manifest.environments.is_empty());
    }

    #[test]
    fn test_invalid_manifest_never_becomes_definition() {
        let manifest = PackageManifest::from_yaml("name: Bad_Name\n").unwrap();
        assert!(PackageDefinition::from_manifest(manifest).is_err());
    }

    #[test]
    fn test_read_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceRecord::read(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(err.to_string().contains("The package does not exist"));
    }

    #[test]
    fn test_read_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docker.yaml");
        std::fs::write(&path, DOCKER).unwrap();
        let record = SourceRecord::read(&path).unwrap();
        assert_eq!(record.path, path);
        assert_eq!(record.package.name(), "docker");
    }

    #[test]
    fn test_display_marks_privileged_environments() {
        colored::control::set_override(false);
        let mut privileged = fixtures::environment("amd64", "linux/ubuntu");
        privileged.privilege = true;
        let record = fixtures::record(
            "/defs/tool.yaml",
            vec![fixtures::environment("amd64", "darwin"), privileged],
        );
        let rendered = record.display_for("amd64@darwin").to_string();
        assert_eq!(
            rendered,
            "path:         /defs/tool.yaml\n\
             name:         tool\n\
             url:          https://example.com/tool\n\
             description:  An example tool\n\
             environments: amd64@darwin, amd64@linux/ubuntu(need privilege)"
        );
    }
}
