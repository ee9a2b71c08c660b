pub mod git;
pub mod machine;
pub mod paths;

pub use machine::{ConfigError, MachineContext};
