//! fuse4x-deploy library exports.
//!
//! The binary is a thin clap front end; everything it runs lives here so
//! integration tests can drive the deploy workflow with a recording runner.

pub mod build;
pub mod clean;
pub mod cli;
pub mod commands;
pub mod config;
pub mod deploy;
pub mod digest;
pub mod error;
pub mod install;
pub mod kext;
pub mod options;
pub mod preflight;
pub mod process;
pub mod timing;

pub use error::{DeployError, DeployResult};
