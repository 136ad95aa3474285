//! CLI argument definitions for `ssis-build`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;
use ssis_model::{ParameterAssignment, ProtectionLevel};
use ssis_project::DEFAULT_CONFIGURATION;

/// Environment variable holding the source password.
pub const PASSWORD_ENV: &str = "SSIS_BUILD_PASSWORD";
/// Environment variable holding the artifact password.
pub const NEW_PASSWORD_ENV: &str = "SSIS_BUILD_NEW_PASSWORD";

#[derive(Parser)]
#[command(
    name = "ssis-build",
    version,
    about = "Build SSIS projects into deployable .ispac artifacts",
    long_about = "Build SSIS projects into deployable .ispac artifacts.\n\n\
                  Reads a .dtproj source layout, resolves parameters from the\n\
                  selected build configuration and writes the artifact under the\n\
                  requested protection level."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build a project definition into an .ispac artifact.
    Build(BuildArgs),

    /// Show the resolved parameters of a project or artifact.
    Params(ParamsArgs),
}

#[derive(Parser)]
pub struct BuildArgs {
    /// Project definition (.dtproj).
    #[arg(value_name = "PROJECT")]
    pub project: PathBuf,

    /// Build configuration to apply.
    #[arg(short = 'c', long = "configuration", default_value = DEFAULT_CONFIGURATION)]
    pub configuration: String,

    /// Password protecting the project files.
    #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
    pub password: Option<String>,

    /// Password for the artifact (defaults to --password).
    #[arg(long = "new-password", env = NEW_PASSWORD_ENV, hide_env_values = true)]
    pub new_password: Option<String>,

    /// Protection level of the artifact (defaults to the project's own).
    #[arg(long = "protection-level", value_name = "LEVEL")]
    pub protection_level: Option<ProtectionLevel>,

    /// Output directory (default: bin/<CONFIGURATION> next to the project).
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Override a parameter value; may be repeated.
    #[arg(short = 'p', long = "parameter", value_name = "NAME=VALUE")]
    pub parameters: Vec<ParameterAssignment>,

    #[arg(long = "version-major", value_name = "N")]
    pub version_major: Option<u32>,

    #[arg(long = "version-minor", value_name = "N")]
    pub version_minor: Option<u32>,

    #[arg(long = "version-build", value_name = "N")]
    pub version_build: Option<u32>,

    #[arg(long = "version-comments", value_name = "TEXT")]
    pub version_comments: Option<String>,
}

#[derive(Parser)]
pub struct ParamsArgs {
    /// Project definition (.dtproj) or artifact (.ispac).
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Build configuration to apply (project definitions only).
    #[arg(short = 'c', long = "configuration", default_value = DEFAULT_CONFIGURATION)]
    pub configuration: String,

    /// Password protecting the project files.
    #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
    pub password: Option<String>,

    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
