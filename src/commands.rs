use anyhow::{Context, Result};
use clap::{Subcommand, ValueHint};
use std::path::{Path, PathBuf};

use crate::common::MachineContext;
use crate::package::lint::is_identifier;
use crate::package::{
    BashExecutor, InstallOutcome, Orchestrator, ResolveError, ScriptExecutor,
    SourceRecord, VerifyOutcome, resolve,
};
use crate::repo::{self, DefinitionSource};
use crate::ui::prelude::*;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search package definitions in all repositories
    Search {
        /// Package name
        name: String,
    },
    /// Download the latest package definition files
    Update,
    /// Check the format of a package definition file
    Lint {
        /// Path to the definition file
        #[arg(value_hint = ValueHint::FilePath)]
        path: PathBuf,
    },
    /// Print the machine environment identifier
    #[command(visible_alias = "env")]
    Environment,
    /// Check whether a package is installed
    #[command(visible_alias = "vrf")]
    Verify {
        /// Package name
        name: String,
    },
    /// Install a package
    Install {
        /// Package name
        name: String,
    },
}

pub fn handle(command: &Commands) -> Result<()> {
    match command {
        Commands::Search { name } => search(&MachineContext::detect()?, name),
        Commands::Update => update(&MachineContext::detect()?),
        Commands::Lint { path } => lint(path),
        Commands::Environment => environment(&MachineContext::detect()?),
        Commands::Verify { name } => {
            let machine = MachineContext::detect()?;
            let store = repo::open_store(&machine)?;
            verify(&machine, &store, &BashExecutor, name)
        }
        Commands::Install { name } => {
            let machine = MachineContext::detect()?;
            let store = repo::open_store(&machine)?;
            install(&machine, &store, &BashExecutor, name)
        }
    }
}

fn load_records(source: &dyn DefinitionSource, name: &str) -> Result<Vec<SourceRecord>> {
    if !is_identifier(name) {
        anyhow::bail!("Invalid package name: {}", name);
    }
    source.load(name)
}

fn search(machine: &MachineContext, name: &str) -> Result<()> {
    let store = repo::open_store(machine)?;
    let records = load_records(&store, name)?;
    let machine_id = machine.env_id();

    if records.is_empty() {
        emit(
            Level::Info,
            "search.empty",
            &format!("No package named {} was found", name),
            None,
        );
    }
    for record in &records {
        output(
            "search.record",
            &format!("{}\n", record.display_for(&machine_id)),
            serde_json::to_value(record).ok(),
        );
    }
    Ok(())
}

fn update(machine: &MachineContext) -> Result<()> {
    let store = repo::open_store(machine)?;
    store.update()?;
    emit(
        Level::Success,
        "update.done",
        &format!("Updated {} repositories", store.repositories().len()),
        None,
    );
    Ok(())
}

fn lint(path: &Path) -> Result<()> {
    SourceRecord::read(path)?;
    emit(
        Level::Success,
        "lint.passed",
        "lint passed",
        Some(serde_json::json!({ "path": path.display().to_string() })),
    );
    Ok(())
}

fn environment(machine: &MachineContext) -> Result<()> {
    let id = machine.env_id();
    output(
        "environment",
        &id,
        Some(serde_json::json!({
            "id": id,
            "architecture": machine.architecture,
            "platform": machine.platform,
            "privileged": machine.privileged,
        })),
    );
    Ok(())
}

fn verify<E: ScriptExecutor>(
    machine: &MachineContext,
    source: &dyn DefinitionSource,
    executor: &E,
    name: &str,
) -> Result<()> {
    let records = load_records(source, name)?;
    if records.is_empty() {
        return Err(ResolveError::PackageNotFound(name.to_string()).into());
    }
    let env = resolve(&machine.env_id(), &records)?;

    let mut orchestrator = Orchestrator::new(machine, executor);
    match orchestrator.verify(env)? {
        VerifyOutcome::Verified => {
            emit(
                Level::Success,
                "verify.installed",
                "The package is installed",
                Some(serde_json::json!({ "package": name, "installed": true })),
            );
            Ok(())
        }
        VerifyOutcome::NotVerified => anyhow::bail!("The package is not installed"),
    }
}

fn install<E: ScriptExecutor>(
    machine: &MachineContext,
    source: &dyn DefinitionSource,
    executor: &E,
    name: &str,
) -> Result<()> {
    let records = load_records(source, name)?;
    if records.is_empty() {
        return Err(ResolveError::PackageNotFound(name.to_string()).into());
    }
    let env = resolve(&machine.env_id(), &records)?;

    let mut orchestrator = Orchestrator::new(machine, executor);
    let result = orchestrator.install(env);
    emit(
        Level::Debug,
        "install.history",
        &format!(
            "{:?} (final state {})",
            orchestrator.history(),
            orchestrator.state()
        ),
        None,
    );
    let outcome = result.with_context(|| format!("installing {}", name))?;

    match outcome {
        InstallOutcome::AlreadyInstalled => emit(
            Level::Info,
            "install.skipped",
            "The package is already installed",
            Some(serde_json::json!({ "package": name, "installed": true })),
        ),
        InstallOutcome::Installed => emit(
            Level::Success,
            "install.done",
            "Installed successfully.",
            Some(serde_json::json!({ "package": name, "installed": true })),
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::machine::fake_machine;
    use crate::package::definition::fixtures::{environment, record};
    use crate::package::executor::fake::ScriptedExecutor;

    struct FixedSource(Vec<SourceRecord>);

    impl DefinitionSource for FixedSource {
        fn load(&self, _name: &str) -> Result<Vec<SourceRecord>> {
            Ok(self.0.clone())
        }
    }

    fn darwin_tool() -> FixedSource {
        let mut env = environment("amd64", "darwin");
        env.verification = "fails".to_string();
        env.script = "brew install tool".to_string();
        FixedSource(vec![record("/defs/tool.yaml", vec![env])])
    }

    #[test]
    fn test_install_on_darwin_runs_script_as_current_user() {
        let machine = fake_machine("amd64@darwin", false, None);
        let exec = ScriptedExecutor::new(vec![Ok(false), Ok(true), Ok(true)]);

        install(&machine, &darwin_tool(), &exec, "tool").unwrap();
        assert_eq!(exec.scripts(), vec!["fails", "brew install tool", "fails"]);
    }

    #[test]
    fn test_install_without_matching_environment() {
        let machine = fake_machine("arm64@linux/ubuntu", false, None);
        let source = FixedSource(vec![record(
            "/defs/tool.yaml",
            vec![environment("amd64", "linux/ubuntu")],
        )]);
        let exec = ScriptedExecutor::new(Vec::new());

        let err = install(&machine, &source, &exec, "tool").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResolveError>(),
            Some(&ResolveError::EnvironmentNotFound)
        );
        assert!(exec.calls.borrow().is_empty());
    }

    #[test]
    fn test_unknown_package() {
        let machine = fake_machine("amd64@darwin", false, None);
        let exec = ScriptedExecutor::new(Vec::new());
        let err = verify(&machine, &FixedSource(Vec::new()), &exec, "tool").unwrap_err();
        assert_eq!(err.to_string(), "The package does not exist: tool");
    }

    #[test]
    fn test_invalid_package_name_rejected_before_loading() {
        let machine = fake_machine("amd64@darwin", false, None);
        let exec = ScriptedExecutor::new(Vec::new());
        let err = verify(&machine, &darwin_tool(), &exec, "../secret").unwrap_err();
        assert!(err.to_string().contains("Invalid package name"));
    }

    #[test]
    fn test_verify_reports_not_installed() {
        let machine = fake_machine("amd64@darwin", false, None);
        let exec = ScriptedExecutor::new(vec![Ok(false)]);
        let err = verify(&machine, &darwin_tool(), &exec, "tool").unwrap_err();
        assert_eq!(err.to_string(), "The package is not installed");
    }

    #[test]
    fn test_lint_reports_description_rule() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tool.yaml");
        std::fs::write(
            &path,
            "name: tool\nurl: https://example.com\nenvironments: []\n",
        )
        .unwrap();
        let err = lint(&path).unwrap_err();
        assert_eq!(err.to_string(), "Package description must not be empty");
    }
}
