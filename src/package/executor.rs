use duct::cmd;
use thiserror::Error;

/// The user a script runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Whoever mopm is running as, root included.
    Current,
    /// A named user, reached through `sudo --user`.
    User(String),
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{script} script exited with an error")]
    Exit { script: &'static str },
}

/// Runs shell scripts on behalf of the orchestrator.
pub trait ScriptExecutor {
    /// Run `script` as `identity`. `Ok(true)` means it exited successfully.
    fn run(&self, script: &str, identity: &Identity) -> Result<bool, ExecutionError>;
}

/// Pipes scripts into `bash -e`, so the first failing command fails the script.
#[derive(Debug, Default, Clone, Copy)]
pub struct BashExecutor;

impl ScriptExecutor for BashExecutor {
    fn run(&self, script: &str, identity: &Identity) -> Result<bool, ExecutionError> {
        let (program, args) = command_line(identity);
        let output = cmd(program, &args)
            .stdin_bytes(format!("{}\n", script))
            .unchecked()
            .run()
            .map_err(|source| ExecutionError::Launch {
                program: program.to_string(),
                source,
            })?;
        Ok(output.status.success())
    }
}

fn command_line(identity: &Identity) -> (&'static str, Vec<String>) {
    match identity {
        Identity::Current => ("bash", vec!["-e".to_string()]),
        Identity::User(user) => (
            "sudo",
            vec![format!("--user={}", user), "bash".to_string(), "-e".to_string()],
        ),
    }
}
