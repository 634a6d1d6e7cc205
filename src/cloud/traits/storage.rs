// ABOUTME: Versioned object storage trait.
// ABOUTME: Get, head, put, copy, list versions, and delete specific versions.

use crate::types::{ObjectLocation, VersionId};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;

/// Versioned object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the latest version of an object.
    async fn get_object(&self, location: &ObjectLocation) -> Result<Bytes, StorageError>;

    /// Read the user metadata of the latest version of an object.
    async fn object_metadata(
        &self,
        location: &ObjectLocation,
    ) -> Result<HashMap<String, String>, StorageError>;

    /// Write an object. Returns the new version id when the bucket is versioned.
    async fn put_object(
        &self,
        location: &ObjectLocation,
        body: Bytes,
    ) -> Result<Option<VersionId>, StorageError>;

    /// Copy the latest version of `source` to `destination`, returning the new version id.
    async fn copy_object(
        &self,
        source: &ObjectLocation,
        destination: &ObjectLocation,
    ) -> Result<VersionId, StorageError>;

    /// List every stored version of exactly this key.
    async fn list_versions(&self, location: &ObjectLocation)
    -> Result<Vec<VersionId>, StorageError>;

    /// Permanently delete one version of an object.
    async fn delete_version(
        &self,
        location: &ObjectLocation,
        version: &VersionId,
    ) -> Result<(), StorageError>;
}

/// Errors from object storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("bucket not found: {0}")]
    NoSuchBucket(String),

    #[error("object not found: {0}")]
    NoSuchKey(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("copy did not produce a version (is versioning enabled on {0}?)")]
    Unversioned(String),

    #[error("storage request throttled: {0}")]
    Throttled(String),

    #[error("storage service error: {0}")]
    Service(String),
}
