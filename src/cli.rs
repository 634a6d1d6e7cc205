// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand, ValueEnum};
use fleetroll::deploy::ArtifactKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fleetroll")]
#[command(about = "Rolling deployments of images and app bundles onto managed fleets")]
#[command(version)]
pub struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: discover fleetroll.yml in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new fleetroll.yml configuration file
    Init {
        /// Fleet name (default: read AUTO_SCALING_GROUP_NAME at run time)
        #[arg(long)]
        fleet: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Answer a fleet-sizing custom-resource request
    ResolveSize {
        #[command(flatten)]
        resource: ResourceArgs,
    },

    /// Wait for draining instances, answering a custom-resource request
    AwaitDrain {
        #[command(flatten)]
        resource: ResourceArgs,
    },

    /// Signal the stack once a launched instance is healthy
    SignalInstance {
        /// Instance-launch event JSON
        #[arg(long)]
        event: PathBuf,

        /// World YAML the handler runs against
        #[arg(long)]
        world: PathBuf,
    },

    /// Prepare an image or app artifact for a deploy stage
    Prepare {
        #[arg(long, value_enum)]
        kind: KindArg,

        #[command(flatten)]
        job: JobArgs,
    },

    /// Delete app versions the deployed stack no longer uses
    Reap {
        #[command(flatten)]
        job: JobArgs,
    },
}

#[derive(clap::Args)]
pub struct ResourceArgs {
    /// Custom-resource request JSON
    #[arg(long)]
    pub event: PathBuf,

    /// World YAML the handler runs against
    #[arg(long)]
    pub world: PathBuf,

    /// PUT the response to the request's ResponseURL instead of only printing it
    #[arg(long)]
    pub deliver: bool,
}

#[derive(clap::Args)]
pub struct JobArgs {
    /// Pipeline job event JSON
    #[arg(long)]
    pub job: PathBuf,

    /// World YAML the handler runs against
    #[arg(long)]
    pub world: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Image,
    App,
}

impl From<KindArg> for ArtifactKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Image => ArtifactKind::Image,
            KindArg::App => ArtifactKind::App,
        }
    }
}
