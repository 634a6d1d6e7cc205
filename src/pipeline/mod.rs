// ABOUTME: Pipeline stage-action contract and job reporting.
// ABOUTME: Parses job events and reports each job's outcome once.

mod job;
mod runner;

pub use job::{
    ActionConfiguration, ActionSettings, ArtifactLocation, DEFAULT_LIVE_VERSION_OUTPUT, JobArtifact,
    JobData, JobError, PipelineEvent, PipelineJob, StoredArtifact, UserParameters,
};
pub use runner::{JobOutcome, MAX_FAILURE_MESSAGE_CHARS, run_job};
