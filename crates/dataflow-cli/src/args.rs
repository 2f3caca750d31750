//! Command-line argument definitions for the Dataflow CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. A subcommand picks the kind of definition and what to
//! print for it; the global options control output, configuration file
//! selection, and logging verbosity.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for the Dataflow definition tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the output file, stdout when not given
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the app definitions of a stream
    Stream(StreamArgs),

    /// Print the graph of a composed task
    Task(TaskArgs),

    /// Parse and validate a definition
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
pub struct StreamArgs {
    /// Path to the stream definition, `-` for stdin
    pub input: String,

    /// Stream name, defaults to the file name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Print the definition rebuilt from its app definitions
    #[arg(long)]
    pub dsl: bool,

    /// Redact sensitive property values
    #[arg(long)]
    pub sanitize: bool,
}

#[derive(clap::Args, Debug)]
pub struct TaskArgs {
    /// Path to the task definition, `-` for stdin
    pub input: String,

    /// Task name, defaults to the file name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Print the compact graph rendering instead of JSON
    #[arg(long, group = "view")]
    pub graph: bool,

    /// Print the definition with apps renamed to their executable names
    #[arg(long, group = "view")]
    pub executable: bool,

    /// Print the definition rebuilt from the graph
    #[arg(long, group = "view")]
    pub dsl: bool,

    /// Redact sensitive app arguments in the rebuilt definition
    #[arg(long, requires = "dsl")]
    pub sanitize: bool,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Path to the definition, `-` for stdin
    pub input: String,

    /// Definition kind, guessed from the file extension when not given
    #[arg(short, long, value_enum)]
    pub kind: Option<DefinitionKind>,

    /// Definition name, defaults to the file name
    #[arg(short, long)]
    pub name: Option<String>,
}

/// The two definition languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DefinitionKind {
    Stream,
    Task,
}
