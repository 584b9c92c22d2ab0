//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;

/// Rebuild a disposable development sandbox on a Proxmox host
#[derive(Parser)]
#[command(name = "rebox", version, propagate_version = true)]
pub struct Cli {
    /// Config file (default: ~/.rebox/config.yaml)
    #[arg(long, global = true, env = "REBOX_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub no_color: bool,

    /// Diagnostic logging to stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Destroy an existing sandbox without asking
    #[arg(
        short,
        long,
        global = true,
        env = "REBOX_YES",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub yes: bool,

    /// Defaults to `rebuild`
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Destroy (after confirmation) and rebuild the sandbox from scratch
    Rebuild,

    /// Install SSH and shell shortcuts for the sandbox on this workstation
    ClientSetup,

    /// Show sandbox status and address
    Status,

    /// Run the verification checklist against the existing sandbox
    Verify,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            config,
            json,
            quiet,
            no_color,
            verbose: _,
            yes,
            command,
        } = self;
        let app = AppContext::new(AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
            config,
        });

        match command.unwrap_or(Command::Rebuild) {
            Command::Rebuild => commands::rebuild::run(&app).await,
            Command::ClientSetup => commands::client_setup::run(&app),
            Command::Status => commands::status::run(&app).await,
            Command::Verify => commands::verify::run(&app).await,
        }
    }
}
