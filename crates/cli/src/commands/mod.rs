//! Subcommand implementations.

pub mod instances;
pub mod launch;
pub mod ssh;
pub mod terminate;
pub mod types;

pub use instances::ListCommand;
pub use launch::LaunchCommand;
pub use ssh::SshConfigCommand;
pub use terminate::TerminateCommand;
pub use types::TypesCommand;
