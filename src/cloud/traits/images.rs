// ABOUTME: Machine image catalog trait.
// ABOUTME: Looks up the display name of a built image.

use crate::types::ImageId;
use async_trait::async_trait;

/// Read access to the machine image catalog.
#[async_trait]
pub trait ImageCatalog: Send + Sync {
    /// Display name of an image.
    async fn image_name(&self, image: &ImageId) -> Result<String, ImageError>;
}

/// Errors from image lookups.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("image request throttled: {0}")]
    Throttled(String),

    #[error("image service error: {0}")]
    Service(String),
}
