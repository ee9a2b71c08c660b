//! Verify and install state machine.
//!
//! ```text
//! Idle -> Verifying -> AlreadyInstalled
//!                   -> NotInstalled -> Installing -> Verifying -> Installed
//!                                                             -> InstallFailedVerification
//! any privilege denial, launch failure or failing install script -> InstallError
//! ```

use std::fmt;

use thiserror::Error;

use super::definition::Environment;
use super::executor::{ExecutionError, Identity, ScriptExecutor};
use super::privilege::{DenyReason, PrivilegeDecision, decide_for};
use crate::common::MachineContext;
use crate::ui::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Idle,
    Verifying,
    AlreadyInstalled,
    NotInstalled,
    Installing,
    Installed,
    InstallFailedVerification,
    InstallError,
}

impl InstallState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InstallState::AlreadyInstalled
                | InstallState::Installed
                | InstallState::InstallFailedVerification
                | InstallState::InstallError
        )
    }

    fn can_transition_to(self, next: InstallState) -> bool {
        match (self, next) {
            (_, InstallState::InstallError) => !self.is_terminal(),
            (InstallState::Idle | InstallState::Installing, InstallState::Verifying) => true,
            (
                InstallState::Verifying,
                InstallState::AlreadyInstalled
                | InstallState::NotInstalled
                | InstallState::Installed
                | InstallState::InstallFailedVerification,
            ) => true,
            (InstallState::NotInstalled, InstallState::Installing) => true,
            _ => false,
        }
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    NotVerified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Verification passed before anything ran.
    AlreadyInstalled,
    Installed,
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Check privilege to install this package: {0}")]
    PrivilegeDenied(DenyReason),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("Finished installing script but failed to verify")]
    FailedVerification,
}

/// Drives one environment through the verify/install states.
pub struct Orchestrator<'a, E: ScriptExecutor> {
    machine: &'a MachineContext,
    executor: &'a E,
    state: InstallState,
    history: Vec<InstallState>,
}

impl<'a, E: ScriptExecutor> Orchestrator<'a, E> {
    pub fn new(machine: &'a MachineContext, executor: &'a E) -> Self {
        Self {
            machine,
            executor,
            state: InstallState::Idle,
            history: vec![InstallState::Idle],
        }
    }

    pub fn state(&self) -> InstallState {
        self.state
    }

    /// Every state visited so far, starting with `Idle`.
    pub fn history(&self) -> &[InstallState] {
        &self.history
    }

    fn transition(&mut self, next: InstallState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {} -> {}",
            self.state,
            next
        );
        emit(
            Level::Debug,
            "install.state",
            &format!("{} -> {}", self.state, next),
            None,
        );
        self.state = next;
        self.history.push(next);
    }

    fn fail<T>(&mut self, err: InstallError) -> Result<T, InstallError> {
        self.transition(InstallState::InstallError);
        Err(err)
    }

    fn identity_for(&self, env: &Environment) -> Result<Identity, InstallError> {
        match decide_for(env.privilege, self.machine) {
            PrivilegeDecision::RunDirect => Ok(Identity::Current),
            PrivilegeDecision::RunAs(user) => Ok(Identity::User(user)),
            PrivilegeDecision::Deny(reason) => Err(InstallError::PrivilegeDenied(reason)),
        }
    }

    fn run_verification(&mut self, env: &Environment) -> Result<VerifyOutcome, InstallError> {
        self.transition(InstallState::Verifying);
        let identity = match self.identity_for(env) {
            Ok(identity) => identity,
            Err(err) => return self.fail(err),
        };
        match self.executor.run(&env.verification, &identity) {
            Ok(true) => Ok(VerifyOutcome::Verified),
            Ok(false) => Ok(VerifyOutcome::NotVerified),
            Err(err) => self.fail(err.into()),
        }
    }

    /// Run the environment's verification command.
    pub fn verify(&mut self, env: &Environment) -> Result<VerifyOutcome, InstallError> {
        let outcome = self.run_verification(env)?;
        self.transition(match outcome {
            VerifyOutcome::Verified => InstallState::AlreadyInstalled,
            VerifyOutcome::NotVerified => InstallState::NotInstalled,
        });
        Ok(outcome)
    }

    /// Make the environment installed. The install script never runs when
    /// verification already passes.
    pub fn install(&mut self, env: &Environment) -> Result<InstallOutcome, InstallError> {
        if self.verify(env)? == VerifyOutcome::Verified {
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        let identity = match self.identity_for(env) {
            Ok(identity) => identity,
            Err(err) => return self.fail(err),
        };

        self.transition(InstallState::Installing);
        match self.executor.run(&env.script, &identity) {
            Ok(true) => {}
            Ok(false) => return self.fail(ExecutionError::Exit { script: "install" }.into()),
            Err(err) => return self.fail(err.into()),
        }

        match self.run_verification(env)? {
            VerifyOutcome::Verified => {
                self.transition(InstallState::Installed);
                Ok(InstallOutcome::Installed)
            }
            VerifyOutcome::NotVerified => {
                self.transition(InstallState::InstallFailedVerification);
                Err(InstallError::FailedVerification)
            }
        }
    }
}
