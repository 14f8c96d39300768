//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `deploy` - Build and install the kext (default, no subcommand)
//! - `preflight` - Run preflight checks
//! - `show` - Display configuration and install status

pub mod deploy;
mod preflight;
pub mod show;

pub use deploy::cmd_deploy;
pub use preflight::cmd_preflight;
pub use show::cmd_show;
