// ABOUTME: Entry point for the fleetroll CLI application.
// ABOUTME: Parses arguments and runs handlers against an in-memory world.

mod cli;

use clap::Parser;
use cli::{Cli, Commands, JobArgs, ResourceArgs};
use fleetroll::cloud::{MemoryCloud, World};
use fleetroll::config::{self, Config};
use fleetroll::deploy::{
    ArtifactKind, LaunchEvent, drain_response_data, prepare_deployment, reap_versions,
    resolve_fleet_size, signal_when_healthy,
};
use fleetroll::error::{Error, Result};
use fleetroll::pipeline::{JobOutcome, PipelineEvent, run_job};
use fleetroll::resource::{
    CallbackTransport, CustomResourceRequest, CustomResourceResponse, HttpCallback,
    RecordingTransport, respond,
};
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = env::current_dir()?;
    let source = ConfigSource {
        path: cli.config,
        cwd,
    };

    match cli.command {
        Commands::Init { fleet, force } => {
            let path = config::init_config(&source.cwd, fleet.as_deref(), force)?;
            println!("Created {}", path.display());
            Ok(())
        }
        Commands::ResolveSize { resource } => resolve_size(&source, resource).await,
        Commands::AwaitDrain { resource } => await_drain(&source, resource).await,
        Commands::SignalInstance { event, world } => signal_instance(&source, &event, &world).await,
        Commands::Prepare { kind, job } => prepare(kind.into(), job).await,
        Commands::Reap { job } => reap(job).await,
    }
}

/// Where the configuration comes from, loaded only once a handler needs it.
struct ConfigSource {
    path: Option<PathBuf>,
    cwd: PathBuf,
}

impl ConfigSource {
    fn load(&self) -> Result<Config> {
        match &self.path {
            Some(path) => Config::load(path),
            None => Config::discover_or_default(&self.cwd),
        }
    }
}

// Resource handlers parse the request first and do everything else inside the
// responder, so a bad config or world file still answers FAILED.

async fn resolve_size(config: &ConfigSource, args: ResourceArgs) -> Result<()> {
    let request = read_request(&args.event)?;

    let computation = async {
        let defaults = config.load()?.fleet_defaults()?;
        let cloud = MemoryCloud::new(World::load(&args.world)?);
        let spec = resolve_fleet_size(&request, &defaults, &cloud, &cloud).await?;
        Ok::<_, Error>(spec.to_response_data())
    };
    let response = respond(request.clone(), callback(&args), computation).await?;
    report_response(&response)
}

async fn await_drain(config: &ConfigSource, args: ResourceArgs) -> Result<()> {
    let request = read_request(&args.event)?;

    let computation = async {
        let config = config.load()?;
        let defaults = config.fleet_defaults()?;
        let cloud = MemoryCloud::new(World::load(&args.world)?);
        let data = drain_response_data(&request, &defaults, &config.drain_policy(), &cloud).await?;
        Ok::<_, Error>(data)
    };
    let response = respond(request.clone(), callback(&args), computation).await?;
    report_response(&response)
}

async fn signal_instance(config: &ConfigSource, event: &Path, world: &Path) -> Result<()> {
    let event = LaunchEvent::from_json(&std::fs::read_to_string(event)?)
        .map_err(|e| Error::InvalidEvent(e.to_string()))?;
    let target = config.load()?.signal_target()?;
    let cloud = MemoryCloud::new(World::load(world)?);

    let signal = signal_when_healthy(event.instance_id(), &target, &cloud, &cloud).await?;
    print_json(&signal)
}

async fn prepare(kind: ArtifactKind, args: JobArgs) -> Result<()> {
    let event = read_job(&args.job)?;
    let (cloud, load_error) = open_world(&args.world);
    let (job, cloud_ref) = (&event.job, &cloud);

    let work = async move {
        if let Some(e) = load_error {
            return Err(e);
        }
        Ok::<_, Error>(prepare_deployment(kind, job, cloud_ref, cloud_ref, cloud_ref).await?)
    };
    let outcome = run_job(&job.id, &cloud, work).await?;
    report_outcome(&outcome)
}

async fn reap(args: JobArgs) -> Result<()> {
    let event = read_job(&args.job)?;
    let (cloud, load_error) = open_world(&args.world);
    let (job, cloud_ref) = (&event.job, &cloud);

    let work = async move {
        if let Some(e) = load_error {
            return Err(e);
        }
        Ok::<_, Error>(reap_versions(job, cloud_ref).await?)
    };
    let outcome = run_job(&job.id, &cloud, work).await?;
    report_outcome(&outcome)
}

fn read_request(path: &Path) -> Result<CustomResourceRequest> {
    CustomResourceRequest::from_json(&std::fs::read_to_string(path)?)
        .map_err(|e| Error::InvalidEvent(e.to_string()))
}

fn read_job(path: &Path) -> Result<PipelineEvent> {
    PipelineEvent::from_json(&std::fs::read_to_string(path)?)
        .map_err(|e| Error::InvalidEvent(e.to_string()))
}

fn callback(args: &ResourceArgs) -> Arc<dyn CallbackTransport> {
    if args.deliver {
        Arc::new(HttpCallback::default())
    } else {
        Arc::new(RecordingTransport::new())
    }
}

/// Open the world a job runs against.
///
/// An unreadable world still yields an empty cloud, so the failed job has a
/// pipeline engine to be reported to.
fn open_world(path: &Path) -> (MemoryCloud, Option<Error>) {
    match World::load(path) {
        Ok(world) => (MemoryCloud::new(world), None),
        Err(e) => (MemoryCloud::new(World::default()), Some(e)),
    }
}

fn report_response(response: &CustomResourceResponse) -> Result<()> {
    print_json(response)?;
    if response.is_success() {
        Ok(())
    } else {
        Err(Error::HandlerFailed(response.reason.clone()))
    }
}

fn report_outcome<T: Serialize>(outcome: &JobOutcome<T>) -> Result<()> {
    print_json(outcome)?;
    match outcome {
        JobOutcome::Succeeded { .. } => Ok(()),
        JobOutcome::Failed { details } => Err(Error::HandlerFailed(details.message.clone())),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
