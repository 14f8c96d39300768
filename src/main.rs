//! fuse4x-deploy - builds the fuse4x kernel extension and installs it.
//!
//! Without a subcommand it runs the deploy workflow:
//! clean (optional) → xcodebuild → unload running kext → copy → chown.

use anyhow::{Context, Result};
use clap::Parser;

use fuse4x_deploy::cli::{Cli, Commands, ShowTarget};
use fuse4x_deploy::commands;
use fuse4x_deploy::config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let base_dir = std::env::current_dir().context("Cannot determine working directory")?;

    let config = Config::load(&base_dir);

    match cli.command {
        None => {
            commands::cmd_deploy(&cli.deploy, &config)?;
        }

        Some(Commands::Preflight { strict }) => {
            commands::cmd_preflight(&config, strict)?;
        }

        Some(Commands::Show { what }) => {
            let show_target = match what {
                ShowTarget::Config { json } => commands::show::ShowTarget::Config { json },
                ShowTarget::Status { json } => commands::show::ShowTarget::Status { json },
            };
            commands::cmd_show(show_target, &config)?;
        }
    }

    Ok(())
}
