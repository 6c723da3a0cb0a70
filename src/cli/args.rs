//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// layerpak - Buildpack dependency and layer support
///
/// Resolves, downloads and caches the dependencies declared in a
/// buildpack.toml and contributes them to layers.
#[derive(Parser, Debug)]
#[command(name = "layerpak")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Buildpack directory containing buildpack.toml
    #[arg(long, global = true, env = "CNB_BUILDPACK_DIR", default_value = ".")]
    pub buildpack: PathBuf,

    /// Layers root
    #[arg(long, global = true, env = "CNB_LAYERS_DIR", default_value = "/layers")]
    pub layers: PathBuf,

    /// Platform directory
    #[arg(long, global = true, env = "CNB_PLATFORM_DIR", default_value = "/platform")]
    pub platform: PathBuf,

    /// Target stack; when absent, entries for every stack are considered
    #[arg(long, global = true, env = "CNB_STACK_ID")]
    pub stack: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Select the dependency version to install
    Resolve(ResolveArgs),

    /// Download a dependency through the cache and print its path
    Fetch(FetchArgs),

    /// Show declared configuration and resolved values
    Config,

    /// Resolve a dependency and contribute it to a layer
    Contribute(ContributeArgs),

    /// Rewrite dependency entries in buildpack.toml
    UpdateDependency(UpdateDependencyArgs),
}

/// Dependency selection shared by several commands
#[derive(clap::Args, Debug, Clone)]
pub struct DependencyArgs {
    /// Dependency id
    pub id: String,

    /// Version constraint (e.g. "11.*", ">=1.2, <2")
    #[arg(long = "version-constraint", short = 'c', default_value = "*")]
    pub constraint: String,

    /// Architecture to match instead of the detected one
    #[arg(long, env = "BP_ARCH")]
    pub arch: Option<String>,
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub dependency: DependencyArgs,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub dependency: DependencyArgs,

    /// Directory for downloaded artifacts (defaults to a temp directory)
    #[arg(long)]
    pub download_dir: Option<PathBuf>,
}

/// Arguments for the contribute command
#[derive(Parser, Debug)]
pub struct ContributeArgs {
    #[command(flatten)]
    pub dependency: DependencyArgs,

    /// Make the layer available to later buildpacks
    #[arg(long)]
    pub build: bool,

    /// Keep the layer between builds
    #[arg(long)]
    pub cache: bool,

    /// Export the layer into the application image
    #[arg(long)]
    pub launch: bool,

    /// Also contribute the buildpack helper with these exec.d names (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub helper: Vec<String>,

    /// Directory for downloaded artifacts (defaults to a temp directory)
    #[arg(long)]
    pub download_dir: Option<PathBuf>,
}

/// Arguments for the update-dependency command
#[derive(Parser, Debug)]
pub struct UpdateDependencyArgs {
    /// Dependency id to update
    #[arg(long)]
    pub id: String,

    /// Only update entries whose current version matches
    #[arg(long, default_value = "*")]
    pub version_constraint: String,

    /// New version
    #[arg(long)]
    pub new_version: String,

    /// New download URI
    #[arg(long)]
    pub uri: Option<String>,

    /// New checksum ("sha256:<hex>" or bare hex)
    #[arg(long)]
    pub checksum: Option<String>,

    /// File to edit (defaults to <buildpack>/buildpack.toml)
    #[arg(long)]
    pub file: Option<PathBuf>,
}

/// Output format for resolve
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Version only
    Plain,
}
