//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands. It is also
//! compiled by the build script to render the manual page, so it depends on
//! nothing but `clap` and the standard library.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Compose build units, links and board configuration for firmware builds.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the Boardfile to use.
    #[arg(short, long, value_name = "FILE", default_value = "Boardfile")]
    pub file: PathBuf,

    /// Change to this directory before doing anything.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Enable verbose logging output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Optional subcommand to execute; defaults to `resolve` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Parse command-line arguments, providing `resolve` as the default command.
    #[must_use]
    pub fn parse_with_default() -> Self {
        Self::parse().with_default_command()
    }

    /// Parse the provided arguments, applying the default command when needed.
    ///
    /// # Errors
    ///
    /// Returns a [`clap::Error`] if the arguments are invalid.
    pub fn try_parse_from_with_default<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args).map(Self::with_default_command)
    }

    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Resolve(ResolveArgs { output: None }));
        }
        self
    }
}

/// Arguments accepted by the `resolve` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct ResolveArgs {
    /// Write the JSON composition to this path instead of stdout (`-` for
    /// stdout).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Print the composed configuration as JSON (default).
    Resolve(ResolveArgs),

    /// Write a CMake snippet declaring units, links and board variables.
    Cmake {
        /// Output path for the snippet, or `-` for stdout.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Write the merged configuration fragment.
    Sdkconfig {
        /// Output path for the merged fragment, or `-` for stdout.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Validate the Boardfile and its fragments without writing anything.
    Check,
}
