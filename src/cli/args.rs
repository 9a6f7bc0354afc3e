//! CLI argument definitions using clap derive

use crate::settings::Invocation;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Prebuild - native dependency provisioning
///
/// Provisions third-party libraries into a content-addressed cache and
/// assembles Android application bundles.
#[derive(Parser, Debug)]
#[command(name = "prebuild")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PREBUILD_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision dependencies and write the build configuration
    Provision(ProvisionArgs),

    /// Print the cache key of the recipe overlay
    Key(KeyArgs),

    /// Show the cache location and whether it is up to date
    Status(StatusArgs),
}

/// Where the project and its recipes live
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Project root (defaults to current directory)
    #[arg(long)]
    pub project_root: Option<PathBuf>,

    /// Recipe overlay directory (defaults to <project root>/cmake/ports)
    #[arg(long)]
    pub ports_dir: Option<PathBuf>,
}

/// Arguments for the provision command
#[derive(Parser, Debug)]
pub struct ProvisionArgs {
    /// Directory the build configuration is written to
    #[arg(long)]
    pub build_root: PathBuf,

    /// Build for Android and bundle the named application
    #[arg(long, value_name = "APP")]
    pub android: Option<String>,

    /// Use an existing toolchain tree instead of the cache
    #[arg(long)]
    pub toolchain_root: Option<PathBuf>,

    /// Download the toolchain even when one is present
    #[arg(long)]
    pub force_bootstrap: bool,

    /// Rebuild the cache even when its tag matches
    #[arg(long)]
    pub force_build: bool,

    /// Trust the cache without comparing tags
    #[arg(long)]
    pub skip_bootstrap: bool,

    #[command(flatten)]
    pub project: ProjectArgs,
}

/// Arguments for the key command
#[derive(Parser, Debug)]
pub struct KeyArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Inspect the Android cache
    #[arg(long, value_name = "APP")]
    pub android: Option<String>,

    /// Use an existing toolchain tree instead of the cache
    #[arg(long)]
    pub toolchain_root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub project: ProjectArgs,
}

impl ProvisionArgs {
    pub fn invocation(&self) -> Invocation {
        Invocation {
            android: self.android.clone(),
            toolchain_root: self.toolchain_root.clone(),
            force_bootstrap: self.force_bootstrap,
            force_build: self.force_build,
            skip_bootstrap: self.skip_bootstrap,
            ports_dir: self.project.ports_dir.clone(),
            project_root: self.project.project_root.clone(),
            build_root: Some(self.build_root.clone()),
        }
    }
}

impl KeyArgs {
    pub fn invocation(&self) -> Invocation {
        Invocation {
            ports_dir: self.project.ports_dir.clone(),
            project_root: self.project.project_root.clone(),
            ..Default::default()
        }
    }
}

impl StatusArgs {
    pub fn invocation(&self) -> Invocation {
        Invocation {
            android: self.android.clone(),
            toolchain_root: self.toolchain_root.clone(),
            ports_dir: self.project.ports_dir.clone(),
            project_root: self.project.project_root.clone(),
            ..Default::default()
        }
    }
}
