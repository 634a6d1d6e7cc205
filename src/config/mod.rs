// ABOUTME: Configuration types and parsing for fleetroll.yml.
// ABOUTME: Handles YAML parsing, env var interpolation, and per-component defaults.

mod deserialize;
mod env_value;
mod init;
mod polling;

pub use env_value::{EnvValue, resolve_optional};
pub use init::init_config;
pub use polling::PollingConfig;

use crate::deploy::{FleetDefaults, PollPolicy, SignalTarget};
use crate::error::{Error, Result};
use crate::types::TargetGroupArn;
use deserialize::deserialize_target_groups;
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILENAME: &str = "fleetroll.yml";
pub const CONFIG_FILENAME_ALT: &str = "fleetroll.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".fleetroll/config.yml";

/// Every section is optional; a component reports what it is missing when it runs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fleet: FleetConfig,

    #[serde(default)]
    pub signal: Option<SignalConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub name: Option<EnvValue>,

    #[serde(default)]
    pub default_image_parameter: Option<EnvValue>,

    #[serde(default)]
    pub drain: PollingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalConfig {
    pub stack_name: EnvValue,

    pub logical_resource_id: EnvValue,

    #[serde(deserialize_with = "deserialize_target_groups")]
    pub target_groups: NonEmpty<TargetGroupArn>,

    #[serde(default)]
    pub health: PollingConfig,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document is null to serde_yaml.
        let config = serde_yaml::from_str::<Option<Config>>(yaml)?.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Like `discover`, but a missing file means all defaults.
    pub fn discover_or_default(dir: &Path) -> Result<Self> {
        match Self::discover(dir) {
            Err(Error::ConfigNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.fleet.drain.max_attempts == Some(0) {
            return Err(Error::InvalidConfig(
                "fleet.drain.max_attempts must be at least 1".to_string(),
            ));
        }
        let health_attempts = self.signal.as_ref().and_then(|s| s.health.max_attempts);
        if health_attempts == Some(0) {
            return Err(Error::InvalidConfig(
                "signal.health.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Fleet name and default-image parameter with env references resolved.
    pub fn fleet_defaults(&self) -> Result<FleetDefaults> {
        Ok(FleetDefaults {
            name: resolve_optional(self.fleet.name.as_ref())?,
            default_image_parameter: resolve_optional(self.fleet.default_image_parameter.as_ref())?,
        })
    }

    pub fn drain_policy(&self) -> PollPolicy {
        self.fleet.drain.policy(PollPolicy::DRAIN)
    }

    /// Signal target for `signal-instance`. Requires the `signal` section.
    pub fn signal_target(&self) -> Result<SignalTarget> {
        let signal = self.signal.as_ref().ok_or_else(|| {
            Error::InvalidConfig("a signal section is required to signal instances".to_string())
        })?;

        Ok(SignalTarget {
            stack_name: signal.stack_name.resolve()?,
            logical_resource_id: signal.logical_resource_id.resolve()?,
            target_groups: signal.target_groups.clone(),
            health: signal.health.policy(PollPolicy::HEALTH),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_template_parses() {
        let yaml = init::generate_template_yaml(Some("web-fleet"));
        let config = Config::from_yaml(&yaml).unwrap();

        assert_eq!(
            config.fleet.name,
            Some(EnvValue::Literal("web-fleet".to_string()))
        );
        assert_eq!(config.drain_policy(), PollPolicy::DRAIN);
        assert!(config.signal.is_none());
    }

    #[test]
    fn template_without_fleet_reads_env() {
        let yaml = init::generate_template_yaml(None);
        let config = Config::from_yaml(&yaml).unwrap();

        assert!(matches!(
            config.fleet.name,
            Some(EnvValue::FromEnv { ref var, .. }) if var == "AUTO_SCALING_GROUP_NAME"
        ));
    }
}
