// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use charm_client::output::OutputMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "charm")]
#[command(about = "Manage your Charm account over SSH")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print bare values only
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines
    #[arg(long, global = true)]
    pub json: bool,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print your account ID
    Id,

    /// Show your profile
    Bio,

    /// Set your username
    Name {
        /// New username (letters and digits, at most 50)
        name: String,
    },

    /// List the keys linked to your account
    Keys {
        /// Include key IDs and dates
        #[arg(short, long)]
        metadata: bool,
    },

    /// Link a public key to your account
    Link {
        /// Path to an OpenSSH public key file
        path: PathBuf,
    },

    /// Unlink a public key from your account
    Unlink {
        /// Key in authorized-keys form (`type base64`)
        key: String,
    },

    /// Issue a JWT
    Jwt {
        /// Audiences for the token (defaults to `charm`)
        audience: Vec<String>,
    },
}
