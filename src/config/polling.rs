// ABOUTME: Poll interval and attempt budget as written in config.
// ABOUTME: Unset fields fall back to the component's default policy.

use serde::Deserialize;
use std::time::Duration;

use crate::deploy::PollPolicy;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PollingConfig {
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,

    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl PollingConfig {
    pub fn policy(&self, defaults: PollPolicy) -> PollPolicy {
        PollPolicy::new(
            self.interval.unwrap_or(defaults.interval),
            self.max_attempts.unwrap_or(defaults.max_attempts),
        )
    }
}
