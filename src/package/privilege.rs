use thiserror::Error;

use crate::common::MachineContext;

/// How a script may be run for a given environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivilegeDecision {
    /// Run with the identity mopm is running as.
    RunDirect,
    /// Drop root and run as this user.
    RunAs(String),
    Deny(DenyReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("this package requires root privileges")]
    NeedRoot,
    #[error("this package must not run as root and SUDO_USER is not set")]
    NoOriginalUser,
}

/// | package \ user | root  | not root |
/// | -------------- | ----- | -------- |
/// | root           | run   | deny     |
/// | not root       | (*)   | run      |
///
/// (*) run as the original user when mopm was started through sudo, deny otherwise.
pub fn decide(requires_privilege: bool, privileged: bool, original_user: Option<&str>) -> PrivilegeDecision {
    match (requires_privilege, privileged) {
        (true, true) | (false, false) => PrivilegeDecision::RunDirect,
        (true, false) => PrivilegeDecision::Deny(DenyReason::NeedRoot),
        (false, true) => match original_user {
            Some(user) => PrivilegeDecision::RunAs(user.to_string()),
            None => PrivilegeDecision::Deny(DenyReason::NoOriginalUser),
        },
    }
}

/// [`decide`] for the given machine.
pub fn decide_for(requires_privilege: bool, machine: &MachineContext) -> PrivilegeDecision {
    decide(
        requires_privilege,
        machine.privileged,
        machine.original_user.as_deref(),
    )
}
