// ABOUTME: Explicit variants for sentinel values carried in stack properties.
// ABOUTME: "-" means no published artifact; a negative in-service count means derive it.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Property value a pipeline writes before it has produced its first artifact.
pub const UNPUBLISHED: &str = "-";

/// An artifact reference as declared on a fleet: either published or not yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactRef {
    Unpublished,
    Published(String),
}

impl ArtifactRef {
    pub fn parse(raw: &str) -> Self {
        if raw == UNPUBLISHED {
            ArtifactRef::Unpublished
        } else {
            ArtifactRef::Published(raw.to_string())
        }
    }

    pub fn is_unpublished(&self) -> bool {
        matches!(self, ArtifactRef::Unpublished)
    }

    pub fn published(&self) -> Option<&str> {
        match self {
            ArtifactRef::Published(value) => Some(value),
            ArtifactRef::Unpublished => None,
        }
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactRef::Unpublished => f.write_str(UNPUBLISHED),
            ArtifactRef::Published(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid in-service count '{0}': expected an integer")]
pub struct ParseInServiceError(String);

/// Requested `MinInstancesInService` for a rolling update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InServiceTarget {
    /// Keep exactly this many instances in service.
    Fixed(u32),
    /// Use the fleet's current desired capacity.
    FromDesiredCapacity,
}

impl FromStr for InServiceTarget {
    type Err = ParseInServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| ParseInServiceError(s.to_string()))?;

        if value < 0 {
            return Ok(InServiceTarget::FromDesiredCapacity);
        }

        u32::try_from(value)
            .map(InServiceTarget::Fixed)
            .map_err(|_| ParseInServiceError(s.to_string()))
    }
}
