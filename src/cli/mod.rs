//! Command-line surface.
//!
//! With no subcommand the binary runs the service body. Subcommands talk to
//! the registrar or create markers for an already-running service. Anything
//! else is accepted as an external subcommand and reported as unrecognized.

pub mod commands;
pub mod error;

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Parser, Subcommand};

pub use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "sentinel-service")]
#[command(about = "A marker-driven background service and its installer", long_about = None)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "SENTINEL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Override the directory holding service records.
    #[arg(long, global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Override the directory unit files are written to.
    #[arg(long, global = true)]
    pub unit_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Parse arguments, reporting an unknown flag as an unrecognized command
    /// rather than a usage error. Other parse errors are returned as-is.
    pub fn parse_lenient<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Err(e) if e.kind() == ErrorKind::UnknownArgument => {
                let arg = match e.get(ContextKind::InvalidArg) {
                    Some(ContextValue::String(arg)) => arg.clone(),
                    _ => String::new(),
                };
                Ok(Self {
                    config: None,
                    storage_dir: None,
                    unit_dir: None,
                    command: Some(Command::Unrecognized(vec![arg])),
                })
            }
            result => result,
        }
    }
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Register this executable as a service
    Install,
    /// Remove the service registration
    Uninstall,
    /// Print the stored service configuration
    #[command(name = "dumpconfig")]
    DumpConfig {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask the running service to stop
    Stop,
    /// Ask the running service to reload and wait until it has
    Reload {
        /// Seconds to wait for the service to pick up the request
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
    /// Show whether the service is installed and which requests are pending
    Status,
    #[command(external_subcommand)]
    Unrecognized(Vec<String>),
}
