// ABOUTME: In-memory implementation of every cloud capability trait.
// ABOUTME: Backs tests and offline rehearsals with a serializable World snapshot.

use crate::cloud::traits::{
    CredentialBroker, CredentialError, FailureDetails, FleetDescription, FleetError, FleetOps,
    HealthError, HealthOps, ImageCatalog, ImageError, ObjectStore, ParameterError,
    ParameterStore, PipelineError, PipelineOps, ResourceSignal, StackError, StackOps,
    StorageError, TargetAccount, TargetGroup, TargetHealthState,
};
use crate::error::{Error, Result};
use crate::types::{
    ArtifactVersion, ImageId, InstanceId, JobId, ObjectLocation, TargetGroupArn, VersionId,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything the in-memory cloud knows, plus a record of what handlers did to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    #[serde(default)]
    pub fleets: BTreeMap<String, FleetDescription>,
    #[serde(default)]
    pub target_groups: BTreeMap<String, TargetGroupState>,
    #[serde(default)]
    pub buckets: BTreeMap<String, Bucket>,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub stacks: BTreeMap<String, StackState>,
    #[serde(default)]
    pub images: BTreeMap<String, String>,
    #[serde(default)]
    pub denied_roles: Vec<String>,

    #[serde(default)]
    pub signals: Vec<ResourceSignal>,
    #[serde(default)]
    pub job_reports: Vec<JobReport>,
    #[serde(default)]
    pub assumed_roles: Vec<String>,
    #[serde(default)]
    pub deleted_versions: Vec<ArtifactVersion>,

    #[serde(default)]
    next_version: u64,
}

/// A target group and the scripted health of each registered instance.
///
/// Each query consumes the front of an instance's script; the last entry repeats.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetGroupState {
    pub port: u16,
    #[serde(default)]
    pub targets: BTreeMap<String, Vec<TargetHealthState>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    #[serde(default = "default_versioned")]
    pub versioned: bool,
    /// Versions per key, oldest first.
    #[serde(default)]
    pub objects: BTreeMap<String, Vec<StoredVersion>>,
}

impl Default for Bucket {
    fn default() -> Self {
        Self {
            versioned: true,
            objects: BTreeMap::new(),
        }
    }
}

fn default_versioned() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredVersion {
    pub version_id: VersionId,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Inline body, for world files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Body read from a file relative to the world file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_file: Option<PathBuf>,
    #[serde(default = "Utc::now")]
    pub last_modified: DateTime<Utc>,
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl StoredVersion {
    pub fn new(version_id: VersionId, body: impl Into<Vec<u8>>) -> Self {
        Self {
            version_id,
            metadata: BTreeMap::new(),
            text: None,
            content_file: None,
            last_modified: Utc::now(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackState {
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
}

/// A job outcome as the pipeline engine recorded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: JobId,
    #[serde(default)]
    pub failure: Option<FailureDetails>,
}

impl World {
    /// Load a world from YAML, resolving `content_file` bodies relative to the file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut world: World = serde_yaml::from_str(&content)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        world.resolve_bodies(base)?;
        Ok(world)
    }

    fn resolve_bodies(&mut self, base: &Path) -> Result<()> {
        for bucket in self.buckets.values_mut() {
            for version in bucket.objects.values_mut().flatten() {
                if let Some(text) = &version.text {
                    version.body = text.clone().into_bytes();
                } else if let Some(file) = &version.content_file {
                    let path = base.join(file);
                    version.body = std::fs::read(&path).map_err(|e| {
                        Error::InvalidConfig(format!("{}: {}", path.display(), e))
                    })?;
                }
            }
        }
        Ok(())
    }

    pub fn with_fleet(mut self, fleet: FleetDescription) -> Self {
        self.fleets.insert(fleet.name.clone(), fleet);
        self
    }

    pub fn with_target_group(mut self, arn: &str, port: u16) -> Self {
        self.target_groups.entry(arn.to_string()).or_default().port = port;
        self
    }

    pub fn with_target_health(
        mut self,
        arn: &str,
        instance: &str,
        script: Vec<TargetHealthState>,
    ) -> Self {
        self.target_groups
            .entry(arn.to_string())
            .or_default()
            .targets
            .insert(instance.to_string(), script);
        self
    }

    pub fn with_bucket(mut self, name: &str, versioned: bool) -> Self {
        self.buckets.entry(name.to_string()).or_default().versioned = versioned;
        self
    }

    pub fn with_object(
        mut self,
        location: &ObjectLocation,
        version: StoredVersion,
    ) -> Self {
        self.buckets
            .entry(location.bucket.clone())
            .or_default()
            .objects
            .entry(location.key.clone())
            .or_default()
            .push(version);
        self
    }

    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_stack(mut self, name: &str, template: &str, outputs: &[(&str, &str)]) -> Self {
        self.stacks.insert(
            name.to_string(),
            StackState {
                template: template.to_string(),
                outputs: outputs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
        );
        self
    }

    pub fn with_image(mut self, image: &str, name: &str) -> Self {
        self.images.insert(image.to_string(), name.to_string());
        self
    }

    /// Stored version ids of a key, oldest first.
    pub fn versions(&self, location: &ObjectLocation) -> Vec<VersionId> {
        self.buckets
            .get(&location.bucket)
            .and_then(|b| b.objects.get(&location.key))
            .map(|versions| versions.iter().map(|v| v.version_id.clone()).collect())
            .unwrap_or_default()
    }

    /// Body of the latest version of a key.
    pub fn latest_body(&self, location: &ObjectLocation) -> Option<&[u8]> {
        self.buckets
            .get(&location.bucket)
            .and_then(|b| b.objects.get(&location.key))
            .and_then(|versions| versions.last())
            .map(|v| v.body.as_slice())
    }

    fn allocate_version(&mut self) -> VersionId {
        self.next_version += 1;
        VersionId::new(format!("v{:06}", self.next_version))
    }

    fn latest(&self, location: &ObjectLocation) -> std::result::Result<&StoredVersion, StorageError> {
        let bucket = self
            .buckets
            .get(&location.bucket)
            .ok_or_else(|| StorageError::NoSuchBucket(location.bucket.clone()))?;
        bucket
            .objects
            .get(&location.key)
            .and_then(|versions| versions.last())
            .ok_or_else(|| StorageError::NoSuchKey(location.to_string()))
    }

    fn store(
        &mut self,
        location: &ObjectLocation,
        body: Vec<u8>,
        metadata: BTreeMap<String, String>,
    ) -> std::result::Result<Option<VersionId>, StorageError> {
        let versioned = self
            .buckets
            .get(&location.bucket)
            .map(|b| b.versioned)
            .ok_or_else(|| StorageError::NoSuchBucket(location.bucket.clone()))?;

        let version_id = if versioned {
            Some(self.allocate_version())
        } else {
            None
        };

        let mut stored = StoredVersion::new(
            version_id.clone().unwrap_or_else(|| VersionId::new("null")),
            body,
        );
        stored.metadata = metadata;

        let versions = self
            .buckets
            .entry(location.bucket.clone())
            .or_default()
            .objects
            .entry(location.key.clone())
            .or_default();
        if !versioned {
            versions.clear();
        }
        versions.push(stored);

        Ok(version_id)
    }
}

/// Cloud capabilities served from a shared in-memory `World`.
///
/// Clones share state, so one instance can stand in for both the pipeline
/// account and any assumed target account.
#[derive(Clone, Default)]
pub struct MemoryCloud {
    world: Arc<Mutex<World>>,
    faults: Arc<Mutex<HashMap<String, VecDeque<String>>>>,
}

impl std::fmt::Debug for MemoryCloud {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCloud").finish_non_exhaustive()
    }
}

impl MemoryCloud {
    pub fn new(world: World) -> Self {
        Self {
            world: Arc::new(Mutex::new(world)),
            faults: Arc::default(),
        }
    }

    /// A copy of the current world state.
    pub fn snapshot(&self) -> World {
        self.world.lock().clone()
    }

    /// Mutate the world directly, e.g. to move an instance between states mid-test.
    pub fn with_world<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        f(&mut self.world.lock())
    }

    /// Make the next call of `operation` fail with a throttling-style error.
    pub fn fail_next(&self, operation: &str, message: impl Into<String>) {
        self.faults
            .lock()
            .entry(operation.to_string())
            .or_default()
            .push_back(message.into());
    }

    fn injected(&self, operation: &str) -> Option<String> {
        self.faults
            .lock()
            .get_mut(operation)
            .and_then(|queue| queue.pop_front())
    }
}

#[async_trait]
impl FleetOps for MemoryCloud {
    async fn describe_fleet(
        &self,
        name: &str,
    ) -> std::result::Result<Option<FleetDescription>, FleetError> {
        if let Some(message) = self.injected("describe_fleet") {
            return Err(FleetError::Throttled(message));
        }
        Ok(self.world.lock().fleets.get(name).cloned())
    }
}

#[async_trait]
impl HealthOps for MemoryCloud {
    async fn describe_target_groups(
        &self,
        arns: &[TargetGroupArn],
    ) -> std::result::Result<Vec<TargetGroup>, HealthError> {
        if let Some(message) = self.injected("describe_target_groups") {
            return Err(HealthError::Throttled(message));
        }
        let world = self.world.lock();
        arns.iter()
            .map(|arn| {
                world
                    .target_groups
                    .get(arn.as_str())
                    .map(|state| TargetGroup {
                        arn: arn.clone(),
                        port: state.port,
                    })
                    .ok_or_else(|| HealthError::TargetGroupNotFound(arn.to_string()))
            })
            .collect()
    }

    async fn target_health(
        &self,
        target_group: &TargetGroupArn,
        instance: &InstanceId,
        port: u16,
    ) -> std::result::Result<TargetHealthState, HealthError> {
        if let Some(message) = self.injected("target_health") {
            return Err(HealthError::Throttled(message));
        }
        let mut world = self.world.lock();
        let group = world
            .target_groups
            .get_mut(target_group.as_str())
            .ok_or_else(|| HealthError::TargetGroupNotFound(target_group.to_string()))?;

        if group.port != port {
            return Err(HealthError::InvalidTarget(format!("{}:{}", instance, port)));
        }

        let script = group
            .targets
            .get_mut(instance.as_str())
            .filter(|script| !script.is_empty())
            .ok_or_else(|| HealthError::InvalidTarget(instance.to_string()))?;

        let state = script[0];
        if script.len() > 1 {
            script.remove(0);
        }
        Ok(state)
    }
}

#[async_trait]
impl ObjectStore for MemoryCloud {
    async fn get_object(&self, location: &ObjectLocation) -> std::result::Result<Bytes, StorageError> {
        if let Some(message) = self.injected("get_object") {
            return Err(StorageError::Throttled(message));
        }
        let world = self.world.lock();
        world
            .latest(location)
            .map(|v| Bytes::copy_from_slice(&v.body))
    }

    async fn object_metadata(
        &self,
        location: &ObjectLocation,
    ) -> std::result::Result<HashMap<String, String>, StorageError> {
        if let Some(message) = self.injected("object_metadata") {
            return Err(StorageError::Throttled(message));
        }
        let world = self.world.lock();
        world
            .latest(location)
            .map(|v| v.metadata.clone().into_iter().collect())
    }

    async fn put_object(
        &self,
        location: &ObjectLocation,
        body: Bytes,
    ) -> std::result::Result<Option<VersionId>, StorageError> {
        if let Some(message) = self.injected("put_object") {
            return Err(StorageError::Throttled(message));
        }
        self.world
            .lock()
            .store(location, body.to_vec(), BTreeMap::new())
    }

    async fn copy_object(
        &self,
        source: &ObjectLocation,
        destination: &ObjectLocation,
    ) -> std::result::Result<VersionId, StorageError> {
        if let Some(message) = self.injected("copy_object") {
            return Err(StorageError::Throttled(message));
        }
        let mut world = self.world.lock();
        let (body, metadata) = {
            let latest = world.latest(source)?;
            (latest.body.clone(), latest.metadata.clone())
        };
        world
            .store(destination, body, metadata)?
            .ok_or_else(|| StorageError::Unversioned(destination.bucket.clone()))
    }

    async fn list_versions(
        &self,
        location: &ObjectLocation,
    ) -> std::result::Result<Vec<VersionId>, StorageError> {
        if let Some(message) = self.injected("list_versions") {
            return Err(StorageError::Throttled(message));
        }
        let world = self.world.lock();
        if !world.buckets.contains_key(&location.bucket) {
            return Err(StorageError::NoSuchBucket(location.bucket.clone()));
        }
        let mut versions = world.versions(location);
        versions.reverse();
        Ok(versions)
    }

    async fn delete_version(
        &self,
        location: &ObjectLocation,
        version: &VersionId,
    ) -> std::result::Result<(), StorageError> {
        if let Some(message) = self.injected("delete_version") {
            return Err(StorageError::Throttled(message));
        }
        let mut world = self.world.lock();
        let bucket = world
            .buckets
            .get_mut(&location.bucket)
            .ok_or_else(|| StorageError::NoSuchBucket(location.bucket.clone()))?;
        if let Some(versions) = bucket.objects.get_mut(&location.key) {
            versions.retain(|v| &v.version_id != version);
        }
        world
            .deleted_versions
            .push(location.version(version.clone()));
        Ok(())
    }
}

#[async_trait]
impl ParameterStore for MemoryCloud {
    async fn get_parameter(&self, name: &str) -> std::result::Result<String, ParameterError> {
        if let Some(message) = self.injected("get_parameter") {
            return Err(ParameterError::Throttled(message));
        }
        self.world
            .lock()
            .parameters
            .get(name)
            .cloned()
            .ok_or_else(|| ParameterError::NotFound(name.to_string()))
    }

    async fn put_parameter(
        &self,
        name: &str,
        value: &str,
        overwrite: bool,
    ) -> std::result::Result<(), ParameterError> {
        if let Some(message) = self.injected("put_parameter") {
            return Err(ParameterError::Throttled(message));
        }
        let mut world = self.world.lock();
        if !overwrite && world.parameters.contains_key(name) {
            return Err(ParameterError::AlreadyExists(name.to_string()));
        }
        world.parameters.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

#[async_trait]
impl StackOps for MemoryCloud {
    async fn stack_outputs(
        &self,
        stack_name: &str,
    ) -> std::result::Result<HashMap<String, String>, StackError> {
        if let Some(message) = self.injected("stack_outputs") {
            return Err(StackError::Throttled(message));
        }
        self.world
            .lock()
            .stacks
            .get(stack_name)
            .map(|stack| stack.outputs.clone().into_iter().collect())
            .ok_or_else(|| StackError::StackNotFound(stack_name.to_string()))
    }

    async fn template_body(&self, stack_name: &str) -> std::result::Result<String, StackError> {
        if let Some(message) = self.injected("template_body") {
            return Err(StackError::Throttled(message));
        }
        self.world
            .lock()
            .stacks
            .get(stack_name)
            .map(|stack| stack.template.clone())
            .ok_or_else(|| StackError::StackNotFound(stack_name.to_string()))
    }

    async fn signal_resource(&self, signal: &ResourceSignal) -> std::result::Result<(), StackError> {
        if let Some(message) = self.injected("signal_resource") {
            return Err(StackError::Throttled(message));
        }
        let mut world = self.world.lock();
        if !world.stacks.contains_key(&signal.stack_name) {
            return Err(StackError::StackNotFound(signal.stack_name.clone()));
        }
        world.signals.push(signal.clone());
        Ok(())
    }
}

#[async_trait]
impl ImageCatalog for MemoryCloud {
    async fn image_name(&self, image: &ImageId) -> std::result::Result<String, ImageError> {
        if let Some(message) = self.injected("image_name") {
            return Err(ImageError::Throttled(message));
        }
        self.world
            .lock()
            .images
            .get(image.as_str())
            .cloned()
            .ok_or_else(|| ImageError::NotFound(image.to_string()))
    }
}

#[async_trait]
impl PipelineOps for MemoryCloud {
    async fn put_job_success(&self, job: &JobId) -> std::result::Result<(), PipelineError> {
        if let Some(message) = self.injected("put_job_success") {
            return Err(PipelineError::Service(message));
        }
        self.record_job(JobReport {
            job_id: job.clone(),
            failure: None,
        })
    }

    async fn put_job_failure(
        &self,
        job: &JobId,
        details: &FailureDetails,
    ) -> std::result::Result<(), PipelineError> {
        if let Some(message) = self.injected("put_job_failure") {
            return Err(PipelineError::Service(message));
        }
        self.record_job(JobReport {
            job_id: job.clone(),
            failure: Some(details.clone()),
        })
    }
}

impl MemoryCloud {
    fn record_job(&self, report: JobReport) -> std::result::Result<(), PipelineError> {
        let mut world = self.world.lock();
        if world.job_reports.iter().any(|r| r.job_id == report.job_id) {
            return Err(PipelineError::InvalidJobState(report.job_id.to_string()));
        }
        world.job_reports.push(report);
        Ok(())
    }
}

#[async_trait]
impl CredentialBroker for MemoryCloud {
    async fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> std::result::Result<TargetAccount, CredentialError> {
        if let Some(message) = self.injected("assume_role") {
            return Err(CredentialError::Service(message));
        }
        {
            let mut world = self.world.lock();
            if world.denied_roles.iter().any(|r| r == role_arn) {
                return Err(CredentialError::AccessDenied(role_arn.to_string()));
            }
            world.assumed_roles.push(format!("{}#{}", role_arn, session_name));
        }

        Ok(TargetAccount {
            stack: Arc::new(self.clone()),
            parameters: Arc::new(self.clone()),
            storage: Arc::new(self.clone()),
        })
    }
}
