//! Package definitions and everything needed to act on them.
//!
//! - [`definition`]: the YAML data model and its validated form
//! - [`lint`]: validation rules
//! - [`resolve`]: picking the environment for the running machine
//! - [`privilege`]: deciding who a script may run as
//! - [`executor`]: running scripts through bash
//! - [`install`]: the verify/install state machine

pub mod definition;
pub mod executor;
pub mod install;
pub mod lint;
pub mod privilege;
pub mod resolve;

pub use definition::SourceRecord;
pub use executor::{BashExecutor, ScriptExecutor};
pub use install::{InstallOutcome, Orchestrator, VerifyOutcome};
pub use resolve::{ResolveError, resolve};
